//! Checks shared by the fit options, the argmin adapter and the Hessian
//! fallback.
//!
//! Option checks run once at construction. The value checks run on every
//! point the adapter hands to `argmin` and on the solver's final state, so
//! a NaN produced by an amplitude is reported where it first appears rather
//! than deep inside a line search.
use crate::optimization::{
    errors::{OptError, OptResult},
    nll_optimizer::{Cost, Grad, Theta, types::Hessian},
};

/// `value` must be finite and strictly positive.
pub fn check_positive(name: &'static str, value: f64) -> OptResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OptError::InvalidOption { name, value })
    }
}

/// Counts (iterations, L-BFGS history) must be at least one.
pub fn check_count(name: &'static str, count: usize) -> OptResult<()> {
    if count == 0 {
        return Err(OptError::InvalidOption { name, value: 0.0 });
    }
    Ok(())
}

/// `∇NLL` must have one finite entry per parameter.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientLength { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|g| !g.is_finite()) {
        Some(index) => Err(OptError::NonFiniteGradient { index, value: grad[index] }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best point and check it together with its NLL.
///
/// # Errors
/// - [`OptError::NoEstimate`] when the point is missing or has a non-finite
///   entry.
/// - [`OptError::NonFiniteCost`] when the NLL at the point is not finite.
pub fn validate_estimate(theta_hat: Option<Theta>, nll: Cost) -> OptResult<Theta> {
    let theta_hat = theta_hat.ok_or(OptError::NoEstimate { index: None, value: f64::NAN })?;
    if let Some(index) = theta_hat.iter().position(|x| !x.is_finite()) {
        return Err(OptError::NoEstimate { index: Some(index), value: theta_hat[index] });
    }
    if !nll.is_finite() {
        return Err(OptError::NonFiniteCost { value: nll });
    }
    Ok(theta_hat)
}

/// `∇²NLL` must be `dim × dim` with finite entries.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    let found = hessian.dim();
    if found != (dim, dim) {
        return Err(OptError::HessianShape { expected: dim, found });
    }
    match hessian.indexed_iter().find(|(_, h)| !h.is_finite()) {
        Some(((row, col), &value)) => Err(OptError::NonFiniteHessian { row, col, value }),
        None => Ok(()),
    }
}
