//! likelihood — weighted extended likelihood for amplitude fits.
//!
//! Purpose
//! -------
//! Turn an [`Amplitude`] plus data, background and normalization samples
//! into `(NLL, ∇NLL, ∇²NLL)` for an optimizer, with exact summation over
//! fixed-size chunks.
//!
//! Key behaviors
//! -------------
//! - [`weights`] merges data and background (`−w_bkg`) and applies the
//!   `Σw / Σw²` rescaling.
//! - [`batch`] performs the ordered chunk reductions, sequentially or on
//!   the rayon pool.
//! - [`Model`] assembles NLL, gradient and Hessian from the reductions and
//!   adds optional Gaussian constraints.
//! - [`Fcn`] binds a model to its samples; [`CombineFcn`] sums several
//!   [`Fcn`]s for simultaneous fits. Both implement [`NllFunction`].
//! - [`check_gradient`] compares analytic and numerical gradients.
//!
//! Invariants & assumptions
//! ------------------------
//! - Evaluation is single-threaded at the call level: every call sets the
//!   amplitude parameters before reading them and is not reentrant.
//! - Only amplitude outputs of the wrong shape raise errors during
//!   evaluation; NaN from degenerate parameters is passed through.
//!
//! Conventions
//! -----------
//! - Parameter vectors follow [`Amplitude::param_names`] order.
//! - The normalization integral is the weighted MC sum; [`Fcn`] uses weights
//!   `1/n`, making it the MC mean.
//!
//! Downstream usage
//! ----------------
//! - `optimization::nll_optimizer::minimize` drives any [`NllFunction`];
//!   `inference::calc_param_errors` uses its Hessian after the fit.
//!
//! Testing notes
//! -------------
//! - Unit tests share a two-parameter toy amplitude with exact derivatives;
//!   `tests/` runs a full fit with it.

pub mod batch;
pub mod check;
pub mod combine;
pub mod errors;
pub mod fcn;
pub mod model;
pub mod traits;
pub mod weights;

#[cfg(test)]
pub(crate) mod test_amplitude;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::batch::{BatchPlan, Order, Partial, Transform};
pub use self::check::{GradientCheck, GradientCheckOptions, ParamCheck, check_gradient};
pub use self::combine::{BoxedNll, CombineFcn};
pub use self::errors::{LikelihoodError, LikelihoodResult};
pub use self::fcn::{DEFAULT_BATCH, Fcn, FcnOptions};
pub use self::model::{GaussianConstraint, Model};
pub use self::traits::{Amplitude, NllFunction};
pub use self::weights::{WeightedData, alpha_factor, weighted_data};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::check::{GradientCheckOptions, check_gradient};
    pub use super::combine::CombineFcn;
    pub use super::fcn::{Fcn, FcnOptions};
    pub use super::model::Model;
    pub use super::traits::{Amplitude, NllFunction};
}
