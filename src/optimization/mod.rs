//! optimization — NLL minimizer and unified error surface.
//!
//! Purpose
//! -------
//! Minimize the negative log-likelihood produced by the likelihood engine
//! with an Argmin-backed L-BFGS, and normalize configuration problems,
//! divergence and backend failures into a single error enum.
//!
//! Key behaviors
//! -------------
//! - `nll_optimizer` exposes `minimize` / `fit` over any `NllFunction`,
//!   with a restart policy for stalled runs and a divergence guard.
//! - `errors::OptError` with the alias `OptResult<T>` collects option
//!   validation errors, non-finite NLL values, `FitDiverged`, wrapped
//!   likelihood errors and tagged argmin failures.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//! - The cost is the NLL; nothing is maximized.
//!
//! Conventions
//! -----------
//! - Parameters, gradients and Hessians use the `ndarray` aliases in
//!   `nll_optimizer::types` (`Theta`, `Grad`, `Hessian`), shared with the
//!   likelihood engine.
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - Restarts and divergence are reported through the `log` facade.
//!
//! Downstream usage
//! ----------------
//! - Front-ends import the curated surface via `optimization::prelude::*`.

pub mod errors;
pub mod nll_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_pwa::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::nll_optimizer::prelude::*;
}
