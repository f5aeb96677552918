//! likelihood::check — finite-difference gradient check.
//!
//! Purpose
//! -------
//! Diagnostic pass, run once before a fit, comparing the analytic gradient
//! of an [`NllFunction`] with a central difference of its NLL for every
//! parameter.
//!
//! Key behaviors
//! -------------
//! - The numeric gradient is `finitediff`'s central difference of the NLL,
//!   perturbing one parameter at a time; evaluation errors raised inside the
//!   difference closure are captured and returned after it.
//! - A parameter passes when its absolute error is within `abs_tol` or its
//!   relative error is within `rel_tol`.
//! - Each parameter's comparison is logged at `info` level; failures at
//!   `warn`.
//! - The function is re-evaluated at `θ` on exit, so the amplitude ends in
//!   the state it was checked at.
use std::cell::RefCell;

use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        traits::NllFunction,
    },
    optimization::nll_optimizer::types::Theta,
};
use finitediff::FiniteDiff;

/// Tolerances for [`check_gradient`]; the difference step is chosen by
/// `finitediff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheckOptions {
    pub rel_tol: f64,
    pub abs_tol: f64,
}

impl GradientCheckOptions {
    /// # Errors
    /// [`LikelihoodError::InvalidCheckOption`] unless both values are finite
    /// and positive.
    pub fn new(rel_tol: f64, abs_tol: f64) -> LikelihoodResult<Self> {
        for (name, value) in [("rel_tol", rel_tol), ("abs_tol", abs_tol)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LikelihoodError::InvalidCheckOption { name, value });
            }
        }
        Ok(GradientCheckOptions { rel_tol, abs_tol })
    }
}

impl Default for GradientCheckOptions {
    fn default() -> Self {
        GradientCheckOptions { rel_tol: 1e-3, abs_tol: 1e-6 }
    }
}

/// Comparison for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCheck {
    pub name: String,
    pub analytic: f64,
    pub numeric: f64,
    pub abs_err: f64,
    pub rel_err: f64,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheck {
    pub params: Vec<ParamCheck>,
    pub passed: bool,
}

impl GradientCheck {
    /// Parameters that failed the check.
    pub fn failures(&self) -> impl Iterator<Item = &ParamCheck> {
        self.params.iter().filter(|p| !p.ok)
    }
}

/// Compare analytic and central-difference gradients of `f` at `theta`.
///
/// `names` labels the parameters in the report; missing names fall back to
/// `p{k}`.
///
/// # Errors
/// [`LikelihoodError::ParamLengthMismatch`] if `theta` does not match
/// `f.n_params()`; any evaluation error of `f`.
pub fn check_gradient<F: NllFunction + ?Sized>(
    f: &mut F, theta: &Theta, names: &[String], opts: &GradientCheckOptions,
) -> LikelihoodResult<GradientCheck> {
    let expected = f.n_params();
    if theta.len() != expected {
        return Err(LikelihoodError::ParamLengthMismatch { expected, found: theta.len() });
    }
    let (_, analytic) = f.nll_grad(theta)?;
    let numeric = numeric_gradient(f, theta)?;
    let mut params = Vec::with_capacity(theta.len());
    for k in 0..theta.len() {
        let numeric = numeric[k];
        let abs_err = (analytic[k] - numeric).abs();
        let scale = analytic[k].abs().max(numeric.abs());
        let rel_err = if scale > 0.0 { abs_err / scale } else { 0.0 };
        let ok = abs_err <= opts.abs_tol || rel_err <= opts.rel_tol;
        let name = names.get(k).cloned().unwrap_or_else(|| format!("p{k}"));
        let a_k = analytic[k];
        if ok {
            log::info!("gradient check {name}: analytic {a_k:.6e}, numeric {numeric:.6e}");
        } else {
            log::warn!(
                "gradient check {name} failed: analytic {a_k:.6e}, numeric {numeric:.6e}, \
                 rel {rel_err:.3e}"
            );
        }
        params.push(ParamCheck { name, analytic: a_k, numeric, abs_err, rel_err, ok });
    }
    f.evaluate(theta)?;
    let passed = params.iter().all(|p| p.ok);
    Ok(GradientCheck { params, passed })
}

// ---- Helper methods ----

fn numeric_gradient<F: NllFunction + ?Sized>(
    f: &mut F, theta: &Theta,
) -> LikelihoodResult<Theta> {
    let closure_err: RefCell<Option<LikelihoodError>> = RefCell::new(None);
    let f = RefCell::new(f);
    let nll = |x: &Theta| -> f64 {
        match f.borrow_mut().evaluate(x) {
            Ok(v) => v,
            Err(e) => {
                closure_err.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        }
    };
    let numeric = theta.central_diff(&nll);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    Ok(numeric)
}
