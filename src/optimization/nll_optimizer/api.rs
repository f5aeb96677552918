//! High-level entry points for minimizing an [`NllFunction`].
//!
//! [`minimize`] selects an L-BFGS solver with either Hager–Zhang or
//! More–Thuente line search, wraps the likelihood in an [`NllAdapter`] and
//! delegates each run to `run_lbfgs`. A run that ends without converging is
//! restarted from its best point with the remaining iteration budget; a run
//! that diverges is restarted from the last point with a finite NLL.
//! [`fit`] attaches parameter names to the outcome.
use crate::{
    likelihood::{errors::LikelihoodError, traits::NllFunction},
    optimization::{
        errors::{OptError, OptResult},
        nll_optimizer::{
            OptimOutcome, Theta,
            adapter::{NllAdapter, RunGuard},
            builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
            run::run_lbfgs,
            traits::{FitOptions, FitResult, LineSearcher},
        },
    },
};

/// Two consecutive runs whose minima differ by less than this are final.
pub const NLL_STALL_TOL: f64 = 1e-3;

/// Minimize `NLL(θ)` with L-BFGS, restarting on stalls and divergence.
///
/// # Behavior
/// - Checks `theta0` against `f.n_params()`.
/// - Runs L-BFGS with the line search in `opts.line_searcher`.
/// - Stops when a run converges, when two consecutive minima differ by
///   less than [`NLL_STALL_TOL`], when `opts.max_restarts` restarts have
///   been spent or when the iteration budget `opts.tols.max_iter` is used
///   up. Otherwise restarts from the run's best point.
/// - On [`OptError::FitDiverged`] with restarts left, logs a warning and
///   restarts from the last point that produced a finite NLL.
/// - Re-evaluates `f` at `θ̂` before returning, so the model holds the
///   best-fit parameters.
///
/// # Errors
/// - [`OptError::Likelihood`] wrapping `ParamLengthMismatch` for a wrong
///   `theta0` length, or any error raised by `f`.
/// - [`OptError::FitDiverged`] once the restarts are exhausted.
/// - [`OptError::NonFiniteCost`] when any trial point, including one inside
///   a line search, gives a NaN or infinite NLL.
/// - Builder and `argmin` runtime errors (e.g., line-search failures).
pub fn minimize<F: NllFunction + ?Sized>(
    f: &mut F, theta0: Theta, opts: &FitOptions,
) -> OptResult<OptimOutcome> {
    let expected = f.n_params();
    if theta0.len() != expected {
        let err = LikelihoodError::ParamLengthMismatch { expected, found: theta0.len() };
        return Err(err.into());
    }
    let mut budget = opts.tols.max_iter;
    let mut start = theta0;
    let mut previous: Option<OptimOutcome> = None;
    let mut restarts = 0;
    loop {
        let mut outcome = match run_once(f, start.clone(), opts, budget) {
            Ok(outcome) => outcome,
            Err(OptError::FitDiverged { norm, last_good }) if restarts < opts.max_restarts => {
                log::warn!("fit diverged (|theta|_1 = {norm:.3e}); restarting from last good");
                restarts += 1;
                start = last_good;
                continue;
            }
            Err(err) => return Err(err),
        };
        let run_iterations = outcome.iterations;
        budget = budget.map(|b| b.saturating_sub(run_iterations));
        let stalled =
            previous.as_ref().is_some_and(|p| (p.value - outcome.value).abs() < NLL_STALL_TOL);
        if let Some(prev) = &previous {
            outcome.absorb(prev);
        }
        outcome.restarts = restarts;

        if outcome.converged || stalled || restarts >= opts.max_restarts || budget == Some(0) {
            f.evaluate(&outcome.theta_hat)?;
            return Ok(outcome);
        }
        log::warn!(
            "fit not converged ({}) at nll {:.6}; restarting from best point",
            outcome.status,
            outcome.value
        );
        restarts += 1;
        start = outcome.theta_hat.clone();
        previous = Some(outcome);
    }
}

/// Minimize `f` and label the result with `names`.
///
/// # Errors
/// - [`OptError::Likelihood`] wrapping `ParamLengthMismatch` if `names` does
///   not match `f.n_params()`.
/// - Anything returned by [`minimize`].
pub fn fit<F: NllFunction + ?Sized>(
    f: &mut F, names: &[String], theta0: Theta, opts: &FitOptions,
) -> OptResult<FitResult> {
    let expected = f.n_params();
    if names.len() != expected {
        let err = LikelihoodError::ParamLengthMismatch { expected, found: names.len() };
        return Err(err.into());
    }
    let outcome = minimize(f, theta0, opts)?;
    log::info!(
        "fit finished: nll {:.6}, {} iterations, {} restarts, {}",
        outcome.value,
        outcome.iterations,
        outcome.restarts,
        outcome.status
    );
    Ok(FitResult::new(names, outcome))
}

// ---- Helper Methods ----

/// One L-BFGS run from `theta0`.
///
/// A fault recorded by the adapter wins over whatever `argmin` returned,
/// since a line search reports callback errors as a plain solver exit.
fn run_once<F: NllFunction + ?Sized>(
    f: &mut F, theta0: Theta, opts: &FitOptions, max_iter: Option<usize>,
) -> OptResult<OptimOutcome> {
    let guard = RunGuard::new();
    let problem = NllAdapter::new(f, opts.divergence_threshold, &guard);
    let result = match opts.line_searcher {
        LineSearcher::MoreThuente => build_optimizer_more_thuente(opts)
            .and_then(|solver| run_lbfgs(theta0, opts, max_iter, problem, solver)),
        LineSearcher::HagerZhang => build_optimizer_hager_zhang(opts)
            .and_then(|solver| run_lbfgs(theta0, opts, max_iter, problem, solver)),
    };
    match guard.take_fault() {
        Some(fault) => Err(fault),
        None => result,
    }
}
