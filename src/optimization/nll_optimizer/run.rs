//! Execution helper that runs an `argmin` solver on an NLL problem and
//! returns a crate-friendly [`OptimOutcome`].
use crate::{
    likelihood::traits::NllFunction,
    optimization::{
        errors::OptResult,
        nll_optimizer::{FitOptions, Grad, OptimOutcome, Theta, adapter::NllAdapter},
    },
};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an `argmin` optimization for an NLL problem.
///
/// This is the shared runner used by both line-search variants. It wires up:
/// - the likelihood via [`NllAdapter`],
/// - the chosen `Solver` (L-BFGS with Hager–Zhang/More–Thuente),
/// - the starting point `theta0`,
/// - optional observers (behind the `obs_slog` feature),
/// - the iteration budget `max_iter` for this run,
///   then executes the solver and converts the result into [`OptimOutcome`].
///
/// # Type Parameters
/// - `F`: Any [`NllFunction`].
/// - `S`: Any `argmin` solver whose `Problem` is `NllAdapter<'a, F>` and whose
///   `IterState` matches the aliases `Theta` (parameters), `Grad` (gradient),
///   and `f64` as the float type.
///
/// # Feature flags
/// If the `obs_slog` feature is enabled and `opts.verbose == true`, a terminal
/// slog observer is attached with `ObserverMode::Always` and a one-time
/// pre-iteration line logs NLL(θ₀) and ||grad||.
///
/// # Errors
/// - Propagates any `argmin` runtime error through `From<argmin::core::Error>`.
///   Adapter faults swallowed by a line search are not visible here; the
///   caller reads them from the adapter's `RunGuard`.
/// - Propagates validation errors encountered when constructing
///   [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta,
    #[cfg_attr(not(feature = "obs_slog"), allow(unused_variables))] opts: &FitOptions,
    max_iter: Option<usize>, problem: NllAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: NllFunction + ?Sized,
    S: argmin::core::Solver<
            NllAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &NllAdapter<'_, F>) -> OptResult<()>
where
    F: NllFunction + ?Sized,
{
    let (nll0, g0) = problem.evaluate(theta0)?;
    eprintln!("init: nll(theta0) = {:.6}, ||grad|| = {:.6}", nll0, g0.l2_norm());
    Ok(())
}
