//! nll_optimizer — argmin-powered minimizer for negative log-likelihoods.
//!
//! Purpose
//! -------
//! Drive any [`NllFunction`](crate::likelihood::NllFunction) to its minimum
//! with L-BFGS, handling restarts and divergence, and report the result in
//! a crate-friendly form.
//!
//! Key behaviors
//! -------------
//! - [`adapter::NllAdapter`] exposes the likelihood to argmin, serving cost
//!   and gradient from one fused evaluation per point and guarding against
//!   runaway parameters.
//! - [`minimize`] builds the solver via [`builders`], runs it via
//!   [`run::run_lbfgs`] and restarts non-converged or diverged runs within
//!   the shared iteration budget.
//! - [`fit`] labels the outcome with parameter names as a [`FitResult`].
//! - [`finite_diff::compute_hessian`] supplies numerical Hessians from
//!   analytic gradients.
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration types ([`Tolerances`], [`FitOptions`]) are validated on
//!   construction.
//! - Costs, gradients and reported values are NLL quantities; there is no
//!   sign convention to track.
//!
//! Conventions
//! -----------
//! - Parameters are an unconstrained [`Theta`] in the amplitude's order.
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult);
//!   likelihood errors are wrapped in `OptError::Likelihood`.
//!
//! Downstream usage
//! ----------------
//! - Build an `Fcn` or `CombineFcn`, then call [`fit`] or [`minimize`];
//!   `inference::calc_param_errors` turns the Hessian at `θ̂` into errors.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the adapter cache and divergence guard, solver
//!   construction, restart policy and finite-difference Hessians.
//! - `tests/` fits a toy amplitude end to end.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{NLL_STALL_TOL, fit, minimize};
pub use self::traits::{FitOptions, FitResult, LineSearcher, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_pwa::optimization::nll_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{fit, minimize};
    pub use super::traits::{FitOptions, FitResult, LineSearcher, OptimOutcome, Tolerances};
    pub use super::types::{Grad, Hessian, Theta};
}
