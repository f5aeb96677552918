//! Public configuration and result types for NLL minimization.
//!
//! - [`FitOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by [`minimize`](super::minimize).
//! - [`FitResult`]: named parameters, errors and the minimum NLL of a fit.
//!
//! Convention: the objective is the negative log-likelihood itself; costs,
//! gradients and reported values are all in NLL space with no sign flips.
use crate::optimization::{
    errors::{OptError, OptResult},
    nll_optimizer::{
        types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta},
        validation::{check_count, check_positive, validate_estimate},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::{collections::BTreeMap, str::FromStr};

/// Default L1 norm of `θ` beyond which a fit is declared diverged.
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 1e7;

/// Default number of restarts after a non-converged run or a divergence.
pub const DEFAULT_MAX_RESTARTS: usize = 3;

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::UnknownLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::UnknownLineSearch { name: s.to_string() }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances`: numerical tolerances and the total iteration budget
///   shared by all restarts.
/// - `line_searcher: LineSearcher`: line-search algorithm used by L-BFGS.
/// - `verbose: bool`: if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints the starting point.
/// - `lbfgs_mem: Option<usize>`: L-BFGS history length (default 7).
/// - `divergence_threshold: f64`: L1 norm of `θ` treated as divergence.
/// - `max_restarts: usize`: restarts allowed after a non-converged run or a
///   divergence.
///
/// Default:
/// - `tols`: `tol_grad = 1e-4`, `tol_cost = None`, `max_iter = 2000`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
/// - `divergence_threshold`: `1e7`
/// - `max_restarts`: `3`
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub divergence_threshold: f64,
    pub max_restarts: usize,
}

impl FitOptions {
    /// Create a validated set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidOption`] for `lbfgs_mem == Some(0)` or a
    ///   divergence threshold that is not finite and positive.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
        divergence_threshold: f64, max_restarts: usize,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            check_count("lbfgs_mem", m)?;
        }
        check_positive("divergence_threshold", divergence_threshold)?;
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem, divergence_threshold, max_restarts })
    }

    pub(crate) fn lbfgs_mem(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-4), tol_cost: None, max_iter: Some(2000) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
            divergence_threshold: DEFAULT_DIVERGENCE_THRESHOLD,
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoStoppingRule`] if all three are `None`.
    /// - [`OptError::InvalidOption`] naming the field for a non-finite or
    ///   non-positive tolerance, or for `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoStoppingRule);
        }
        if let Some(tol) = tol_grad {
            check_positive("tol_grad", tol)?;
        }
        if let Some(tol) = tol_cost {
            check_positive("tol_cost", tol)?;
        }
        if let Some(max_iter) = max_iter {
            check_count("max_iter", max_iter)?;
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: NLL at `theta_hat`.
/// - `converged`: `true` if the last run stopped on a convergence criterion
///   (not on the iteration cap).
/// - `status`: human-readable termination status string.
/// - `iterations`: optimizer iterations summed over all runs.
/// - `restarts`: number of restarts performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`, summed
///   over all runs. Keys follow argmin's counters, e.g. cost_count,
///   gradient_count.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: Cost,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub restarts: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` and `value` checks via `validate_estimate` (present and
    ///   all finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: Cost, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_estimate(theta_hat_opt, value)?;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{termination:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations,
            restarts: 0,
            fn_evals,
            grad_norm,
        })
    }

    /// Fold an earlier run's counters into this outcome.
    pub(crate) fn absorb(&mut self, earlier: &OptimOutcome) {
        self.iterations += earlier.iterations;
        for (key, count) in &earlier.fn_evals {
            *self.fn_evals.entry(key.clone()).or_insert(0) += count;
        }
    }
}

/// Named result of a fit.
///
/// - `params`: best-fit values keyed by parameter name.
/// - `errors`: one-sigma errors keyed by name; empty until filled by
///   [`FitResult::with_errors`].
/// - `min_nll`: NLL at the minimum.
/// - `ndf`: number of floating parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub params: BTreeMap<String, f64>,
    pub errors: BTreeMap<String, f64>,
    pub min_nll: f64,
    pub ndf: usize,
    pub outcome: OptimOutcome,
}

impl FitResult {
    pub fn new(names: &[String], outcome: OptimOutcome) -> Self {
        let params = names.iter().cloned().zip(outcome.theta_hat.iter().copied()).collect();
        Self {
            params,
            errors: BTreeMap::new(),
            min_nll: outcome.value,
            ndf: outcome.theta_hat.len(),
            outcome,
        }
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, f64>) -> Self {
        self.errors = errors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing of line-search names.
    // - Validation of tolerances and fit options.
    // - Termination-status mapping and counter merging in OptimOutcome.
    // - Named parameters in FitResult.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Line-search names parse case-insensitively; unknown names fail.
    //
    // Given
    // -----
    // - "hagerzhang", "MORETHUENTE", "Backtracking".
    //
    // Expect
    // ------
    // - HagerZhang, MoreThuente, UnknownLineSearch.
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("hagerzhang".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert_eq!("MORETHUENTE".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert!(matches!(
            "Backtracking".parse::<LineSearcher>(),
            Err(OptError::UnknownLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Reject inconsistent configuration.
    //
    // Given
    // -----
    // - No tolerances; max_iter = 0; lbfgs_mem = 0; threshold = NaN.
    //
    // Expect
    // ------
    // - NoStoppingRule, then InvalidOption naming max_iter, lbfgs_mem and
    //   divergence_threshold.
    fn invalid_options_are_rejected() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoStoppingRule));
        assert!(matches!(
            Tolerances::new(Some(1e-6), None, Some(0)),
            Err(OptError::InvalidOption { name: "max_iter", .. })
        ));
        let tols = Tolerances::new(Some(1e-6), None, Some(100)).unwrap();
        assert!(matches!(
            FitOptions::new(tols, LineSearcher::MoreThuente, false, Some(0), 1e7, 3),
            Err(OptError::InvalidOption { name: "lbfgs_mem", .. })
        ));
        assert!(matches!(
            FitOptions::new(tols, LineSearcher::MoreThuente, false, None, f64::NAN, 3),
            Err(OptError::InvalidOption { name: "divergence_threshold", .. })
        ));
        assert_eq!(FitOptions::default().lbfgs_mem(), DEFAULT_LBFGS_MEM);
    }

    #[test]
    // Purpose
    // -------
    // Only convergence criteria count as converged; counters add up.
    //
    // Given
    // -----
    // - One run stopped by SolverConverged, one by MaxItersReached, with
    //   cost_count 10 and 4.
    //
    // Expect
    // ------
    // - converged true / false; after absorb, iterations and cost_count sum.
    fn termination_mapping_and_absorb() {
        // Arrange
        let counts = |n: u64| FnEvalMap::from([("cost_count".to_string(), n)]);
        let done = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let capped = TerminationStatus::Terminated(TerminationReason::MaxItersReached);

        // Act
        let mut last =
            OptimOutcome::new(Some(array![1.0]), 2.0, done, 5, counts(10), None).unwrap();
        let first = OptimOutcome::new(Some(array![0.5]), 3.0, capped, 7, counts(4), None).unwrap();
        last.absorb(&first);

        // Assert
        assert!(last.converged);
        assert!(!first.converged);
        assert_eq!(last.iterations, 12);
        assert_eq!(last.fn_evals["cost_count"], 14);
    }

    #[test]
    // Purpose
    // -------
    // FitResult names parameters in order and starts without errors.
    //
    // Given
    // -----
    // - Outcome θ̂ = (0.5, -0.3), NLL 12.5, names ["a", "b"].
    //
    // Expect
    // ------
    // - params {a: 0.5, b: -0.3}, ndf 2, min_nll 12.5, empty errors.
    fn fit_result_names_parameters() {
        let done = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let outcome =
            OptimOutcome::new(Some(array![0.5, -0.3]), 12.5, done, 3, FnEvalMap::new(), None)
                .unwrap();
        let names = vec!["a".to_string(), "b".to_string()];

        let result = FitResult::new(&names, outcome);

        assert_eq!(result.params["a"], 0.5);
        assert_eq!(result.params["b"], -0.3);
        assert_eq!((result.ndf, result.min_nll), (2, 12.5));
        assert!(result.errors.is_empty());
    }
}
