//! inference — parameter errors and derived results after a fit.
//!
//! Purpose
//! -------
//! Convert the NLL Hessian at the minimum into a covariance matrix, one-sigma
//! parameter errors and errors of derived quantities, staying usable when
//! the Hessian is singular or indefinite. Derive resonance fit fractions and
//! the significance of nested-model comparisons.
//!
//! Key behaviors
//! -------------
//! - [`ErrorMatrix::from_hessian`] pseudo-inverts a Hessian and reports its
//!   rank, condition number and negative eigenvalues.
//! - [`calc_param_errors`] evaluates `∇²NLL(θ̂)` of any
//!   [`NllFunction`](crate::likelihood::NllFunction) and names the errors.
//! - [`ErrorMatrix::propagate`] gives `sqrt(gᵀ C g)` for a derived quantity
//!   with gradient `g`.
//! - [`fit_fractions`] integrates resonance subsets over an `Fcn`'s
//!   normalization sample and propagates errors through the covariance.
//! - [`significance`] turns an NLL gap and a parameter-count difference
//!   into a Gaussian significance.
//!
//! Invariants & assumptions
//! ------------------------
//! - All matrices live in the optimizer parameter space `θ`, in the
//!   amplitude's parameter order.
//! - Failures are reported through [`InferenceError`]; nothing panics on a
//!   bad Hessian.
//!
//! Downstream usage
//! ----------------
//! - After `optimization::nll_optimizer::fit`, call [`calc_param_errors`]
//!   on the same function and store the map with `FitResult::with_errors`.
//! - Pass the resulting [`ErrorMatrix`] to [`fit_fractions`]; compare two
//!   fits' `min_nll` with [`significance`].

pub mod errors;
pub mod fit_fractions;
pub mod hessian;
pub mod significance;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::fit_fractions::{FitFraction, FitFractions, fit_fractions};
pub use self::hessian::{EIGEN_REL_CUTOFF, ErrorMatrix, ParamErrors, calc_param_errors};
pub use self::significance::significance;

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use rust_pwa::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::fit_fractions::fit_fractions;
    pub use super::hessian::{ErrorMatrix, calc_param_errors};
    pub use super::significance::significance;
}
