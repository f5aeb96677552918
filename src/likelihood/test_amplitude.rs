//! Toy amplitude shared by the likelihood unit tests.
//!
//! `f(x) = (1 + a x)² + (b x)²` with parameters `[a, b]`: strictly positive
//! for `b ≠ 0` or `|a x| < 1`, with exact first and second derivatives.
//!
//! As a coherent sum `|1 + a x + i b x|²` it has three resonances, `one`,
//! `a` and `b`, for resonance-subset evaluations.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        traits::Amplitude,
    },
    optimization::nll_optimizer::types::Theta,
};
use ndarray::{Array1, Array2, Array3, array};

#[derive(Debug, Clone)]
pub(crate) struct ToyAmplitude {
    pub theta: Theta,
    pub hessian: bool,
    pub truncate: bool,
    pub partial: bool,
}

impl ToyAmplitude {
    pub(crate) fn new(a: f64, b: f64) -> Self {
        ToyAmplitude { theta: array![a, b], hessian: true, truncate: false, partial: true }
    }

    pub(crate) fn without_hessian(mut self) -> Self {
        self.hessian = false;
        self
    }

    pub(crate) fn without_partial(mut self) -> Self {
        self.partial = false;
        self
    }

    /// Returns one value fewer than events, to exercise shape checks.
    pub(crate) fn truncating_values(mut self) -> Self {
        self.truncate = true;
        self
    }
}

impl Amplitude for ToyAmplitude {
    type Event = f64;

    fn param_names(&self) -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn params(&self) -> Theta {
        self.theta.clone()
    }

    fn set_params(&mut self, theta: &Theta) -> LikelihoodResult<()> {
        if theta.len() != 2 {
            return Err(LikelihoodError::ParamLengthMismatch { expected: 2, found: theta.len() });
        }
        self.theta.assign(theta);
        Ok(())
    }

    fn value(&self, events: &[f64]) -> LikelihoodResult<Array1<f64>> {
        let (a, b) = (self.theta[0], self.theta[1]);
        let n = if self.truncate { events.len().saturating_sub(1) } else { events.len() };
        Ok(events[..n].iter().map(|&x| (1.0 + a * x).powi(2) + (b * x).powi(2)).collect())
    }

    fn value_grad(&self, events: &[f64]) -> LikelihoodResult<(Array1<f64>, Array2<f64>)> {
        let (a, b) = (self.theta[0], self.theta[1]);
        let f = self.value(events)?;
        let df = Array2::from_shape_fn((events.len(), 2), |(i, k)| {
            let x = events[i];
            if k == 0 { 2.0 * x * (1.0 + a * x) } else { 2.0 * b * x * x }
        });
        Ok((f, df))
    }

    fn value_grad_hessian(
        &self, events: &[f64],
    ) -> LikelihoodResult<(Array1<f64>, Array2<f64>, Array3<f64>)> {
        if !self.hessian {
            return Err(LikelihoodError::HessianNotImplemented);
        }
        let (f, df) = self.value_grad(events)?;
        let d2f = Array3::from_shape_fn((events.len(), 2, 2), |(i, k, l)| {
            if k == l { 2.0 * events[i] * events[i] } else { 0.0 }
        });
        Ok((f, df, d2f))
    }

    fn resonances(&self) -> Vec<String> {
        vec!["one".to_string(), "a".to_string(), "b".to_string()]
    }

    fn value_partial(&self, events: &[f64], active: &[usize]) -> LikelihoodResult<Array1<f64>> {
        if !self.partial || active.iter().any(|&r| r > 2) {
            return Err(LikelihoodError::PartialNotImplemented);
        }
        let on = |r: usize| if active.contains(&r) { 1.0 } else { 0.0 };
        let (a, b) = (on(1) * self.theta[0], on(2) * self.theta[1]);
        Ok(events.iter().map(|&x| (on(0) + a * x).powi(2) + (b * x).powi(2)).collect())
    }
}

/// `n` evenly spaced points on `[-1, 1]`.
pub(crate) fn grid(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n).map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64).collect()
}
