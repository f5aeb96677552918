//! nll_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Canonical numeric types and L-BFGS aliases for the NLL minimizer and the
//! likelihood engine, so neither spells out `ndarray` or Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` have one entry per floating parameter, in the
//!   amplitude's parameter order.
//! - `Hessian` is dense and `theta.len() × theta.len()`.
//! - `Cost` is the NLL itself; no sign flips happen anywhere.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ`.
///
/// Alias for `ndarray::Array1<f64>`, used as the canonical parameter type
/// throughout the optimizer.
pub type Theta = Array1<f64>;

/// Gradient vector `∇NLL(θ)`.
///
/// Alias for `ndarray::Array1<f64>`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Dense Hessian matrix for second-order information.
///
/// Alias for `ndarray::Array2<f64>`; `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the negative log-likelihood.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
