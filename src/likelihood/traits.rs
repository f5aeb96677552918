//! Capabilities the likelihood engine consumes and exposes.
//!
//! - [`Amplitude`]: the physics model, implemented outside this crate. It maps
//!   a batch of events to non-negative per-event intensities and supplies
//!   exact per-event derivatives with respect to its trainable parameters.
//! - [`NllFunction`]: what the engine hands to an optimizer. Implemented by
//!   [`Fcn`](crate::likelihood::Fcn) and
//!   [`CombineFcn`](crate::likelihood::CombineFcn).
//!
//! Evaluation methods on [`Amplitude`] take `&self` so that one parameter
//! snapshot can be shared by parallel batch workers; only
//! [`Amplitude::set_params`] mutates.
use crate::{
    likelihood::errors::{LikelihoodError, LikelihoodResult},
    optimization::nll_optimizer::types::{Grad, Hessian, Theta},
};
use ndarray::{Array1, Array2, Array3};
use std::collections::BTreeMap;

/// Per-event intensity model with named trainable parameters.
///
/// Required:
/// - `param_names()`: ordered names of the trainable parameters; the order
///   defines the layout of every parameter vector.
/// - `params()` / `set_params(&Theta)`: read and write all trainable values.
/// - `value(events)`: per-event intensities `f(x_i; θ)`, length `n`.
/// - `value_grad(events)`: `f` plus `∂f/∂θ` with shape `n × p`.
///
/// Optional:
/// - `value_grad_hessian(events)`: adds `∂²f/∂θ∂θ` with shape `n × p × p`.
///   When missing, the engine falls back to finite differences of the exact
///   gradient.
/// - `resonances()` / `value_partial(events, active)`: names of the
///   resonance components and the intensity with only the components at
///   `active` switched on. Needed for fit fractions only.
pub trait Amplitude: Send + Sync {
    type Event: Send + Sync;

    // Required methods
    fn param_names(&self) -> Vec<String>;
    fn params(&self) -> Theta;
    fn set_params(&mut self, theta: &Theta) -> LikelihoodResult<()>;
    fn value(&self, events: &[Self::Event]) -> LikelihoodResult<Array1<f64>>;
    fn value_grad(&self, events: &[Self::Event]) -> LikelihoodResult<(Array1<f64>, Array2<f64>)>;

    // Optional methods
    fn value_grad_hessian(
        &self, _events: &[Self::Event],
    ) -> LikelihoodResult<(Array1<f64>, Array2<f64>, Array3<f64>)> {
        Err(LikelihoodError::HessianNotImplemented)
    }

    fn resonances(&self) -> Vec<String> {
        Vec::new()
    }

    /// Per-event intensities of the coherent sum over the resonances at
    /// `active` (indices into [`resonances`](Self::resonances)).
    fn value_partial(
        &self, _events: &[Self::Event], _active: &[usize],
    ) -> LikelihoodResult<Array1<f64>> {
        Err(LikelihoodError::PartialNotImplemented)
    }

    fn n_params(&self) -> usize {
        self.param_names().len()
    }

    /// Current values keyed by parameter name.
    fn params_map(&self) -> BTreeMap<String, f64> {
        self.param_names().into_iter().zip(self.params().iter().copied()).collect()
    }

    /// Overwrite the named parameters, leaving the others untouched.
    ///
    /// # Errors
    /// [`LikelihoodError::UnknownParameter`] for a name that is not
    /// trainable; no parameter is changed in that case.
    fn set_params_map(&mut self, values: &BTreeMap<String, f64>) -> LikelihoodResult<()> {
        let names = self.param_names();
        let mut theta = self.params();
        for (name, &value) in values {
            let Some(i) = names.iter().position(|n| n == name) else {
                return Err(LikelihoodError::UnknownParameter { name: name.clone() });
            };
            theta[i] = value;
        }
        self.set_params(&theta)
    }
}

/// Objective surface consumed by the optimizer and diagnostics.
///
/// Every evaluation sets the underlying parameters to `theta` first and is
/// therefore not reentrant.
pub trait NllFunction {
    fn n_params(&self) -> usize;
    fn evaluate(&mut self, theta: &Theta) -> LikelihoodResult<f64>;
    fn nll_grad(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad)>;
    fn nll_grad_hessian(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad, Hessian)>;

    /// NLL of the most recent evaluation, if any.
    fn cached_nll(&self) -> Option<f64>;

    fn grad(&mut self, theta: &Theta) -> LikelihoodResult<Grad> {
        Ok(self.nll_grad(theta)?.1)
    }
}
