//! Adapter that exposes an [`NllFunction`] as an `argmin` problem.
//!
//! The cost is the NLL itself and the gradient is always analytic. `argmin`
//! asks for the cost and the gradient at the same point through two separate
//! calls; the adapter answers both from one fused `nll_grad` evaluation and
//! caches the last point.
//!
//! Before anything is evaluated, the L1 norm of `θ` is compared with the
//! divergence threshold. Beyond it the adapter returns
//! [`OptError::FitDiverged`] carrying the last point that evaluated to a
//! finite NLL.
//!
//! `argmin`'s line searches turn a callback error into a quiet solver exit,
//! and the problem itself may be dropped with the failed line search. Faults
//! are therefore also written to a [`RunGuard`] owned by the caller, which
//! reads it back once the run returns.
use std::cell::RefCell;

use crate::{
    likelihood::traits::NllFunction,
    optimization::{
        errors::{OptError, OptResult},
        nll_optimizer::{
            types::{Cost, Grad, Theta},
            validation::validate_grad,
        },
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Per-run record of the last finite point and the first fault.
#[derive(Debug, Default)]
pub struct RunGuard {
    last_good: RefCell<Option<Theta>>,
    fault: RefCell<Option<OptError>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last point at which the NLL was finite.
    pub fn last_good(&self) -> Option<Theta> {
        self.last_good.borrow().clone()
    }

    /// First divergence or non-finite NLL seen during the run, if any.
    pub fn take_fault(&self) -> Option<OptError> {
        self.fault.borrow_mut().take()
    }

    fn record_fault(&self, err: &OptError) {
        let mut fault = self.fault.borrow_mut();
        if fault.is_none() {
            *fault = Some(err.clone());
        }
    }
}

/// Bridges an [`NllFunction`] to `argmin`'s `CostFunction` and `Gradient`.
pub struct NllAdapter<'a, F: NllFunction + ?Sized> {
    f: RefCell<&'a mut F>,
    cache: RefCell<Option<(Theta, Cost, Grad)>>,
    guard: &'a RunGuard,
    divergence_threshold: f64,
}

impl<'a, F: NllFunction + ?Sized> NllAdapter<'a, F> {
    pub fn new(f: &'a mut F, divergence_threshold: f64, guard: &'a RunGuard) -> Self {
        Self { f: RefCell::new(f), cache: RefCell::new(None), guard, divergence_threshold }
    }

    /// Evaluate `(NLL, ∇NLL)` at `theta`, reusing the cached result when
    /// `theta` matches the last evaluated point exactly.
    ///
    /// # Errors
    /// - [`OptError::FitDiverged`] if `‖θ‖₁` exceeds the threshold.
    /// - [`OptError::NonFiniteCost`] for a NaN or infinite NLL.
    /// - Gradient validation errors and any likelihood error.
    ///
    /// The first two are also recorded in the [`RunGuard`].
    pub fn evaluate(&self, theta: &Theta) -> OptResult<(Cost, Grad)> {
        if let Some((cached_theta, nll, grad)) = self.cache.borrow().as_ref() {
            if cached_theta == theta {
                return Ok((*nll, grad.clone()));
            }
        }
        let norm = theta.iter().map(|x| x.abs()).sum::<f64>();
        if !(norm <= self.divergence_threshold) {
            let last_good = self.guard.last_good().unwrap_or_else(|| theta.clone());
            let err = OptError::FitDiverged { norm, last_good };
            self.guard.record_fault(&err);
            return Err(err);
        }
        let (nll, grad) = self.f.borrow_mut().nll_grad(theta)?;
        if !nll.is_finite() {
            let err = OptError::NonFiniteCost { value: nll };
            self.guard.record_fault(&err);
            return Err(err);
        }
        validate_grad(&grad, theta.len())?;
        self.guard.last_good.replace(Some(theta.clone()));
        self.cache.replace(Some((theta.clone(), nll, grad.clone())));
        Ok((nll, grad))
    }
}

impl<F: NllFunction + ?Sized> CostFunction for NllAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(theta)?.0)
    }
}

impl<F: NllFunction + ?Sized> Gradient for NllAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.evaluate(theta)?.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        likelihood::errors::LikelihoodResult,
        optimization::nll_optimizer::types::Hessian,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cost and gradient share one fused evaluation per point.
    // - The divergence guard, its last-good point and the recorded fault.
    // - Non-finite NLL values.
    // - OptError survives the round trip through argmin's error type.
    // -------------------------------------------------------------------------

    /// NLL = ½ θ·θ with a call counter; NaN once θ₀ > 5.
    struct Quadratic {
        calls: usize,
    }

    impl NllFunction for Quadratic {
        fn n_params(&self) -> usize {
            2
        }
        fn evaluate(&mut self, theta: &Theta) -> LikelihoodResult<f64> {
            Ok(self.nll_grad(theta)?.0)
        }
        fn nll_grad(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad)> {
            self.calls += 1;
            let v = if theta[0] > 5.0 { f64::NAN } else { 0.5 * theta.dot(theta) };
            Ok((v, theta.clone()))
        }
        fn nll_grad_hessian(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad, Hessian)> {
            let (v, g) = self.nll_grad(theta)?;
            Ok((v, g, Hessian::eye(2)))
        }
        fn cached_nll(&self) -> Option<f64> {
            None
        }
    }

    #[test]
    // Purpose
    // -------
    // Cost then gradient at one point costs a single NLL evaluation.
    //
    // Given
    // -----
    // - θ = (1, 2), then θ = (0, 1).
    //
    // Expect
    // ------
    // - cost 2.5 and gradient (1, 2) after one call; two calls after the
    //   second point.
    fn cost_and_gradient_share_evaluation() {
        // Arrange
        let mut f = Quadratic { calls: 0 };
        let guard = RunGuard::new();
        let theta = array![1.0, 2.0];

        // Act
        let adapter = NllAdapter::new(&mut f, 1e7, &guard);
        let cost = adapter.cost(&theta).unwrap();
        let grad = adapter.gradient(&theta).unwrap();
        adapter.cost(&array![0.0, 1.0]).unwrap();
        drop(adapter);

        // Assert
        assert_eq!(cost, 2.5);
        assert_eq!(grad, theta);
        assert_eq!(f.calls, 2);
    }

    #[test]
    // Purpose
    // -------
    // Points beyond the L1 threshold are rejected with the last good point.
    //
    // Given
    // -----
    // - Threshold 10; evaluate (1, 1), then (8, -4) with ‖θ‖₁ = 12.
    //
    // Expect
    // ------
    // - FitDiverged { norm: 12, last_good: (1, 1) }, also after converting
    //   through argmin's error type.
    // - The guard holds the same fault once, and is empty after taking it.
    fn divergence_reports_last_good_point() {
        // Arrange
        let mut f = Quadratic { calls: 0 };
        let guard = RunGuard::new();
        let adapter = NllAdapter::new(&mut f, 10.0, &guard);
        adapter.cost(&array![1.0, 1.0]).unwrap();

        // Act
        let direct = adapter.evaluate(&array![8.0, -4.0]);
        let through_argmin: OptError = adapter.cost(&array![8.0, -4.0]).unwrap_err().into();
        drop(adapter);

        // Assert
        let expected = OptError::FitDiverged { norm: 12.0, last_good: array![1.0, 1.0] };
        assert_eq!(direct, Err(expected.clone()));
        assert_eq!(through_argmin, expected);
        assert_eq!(guard.take_fault(), Some(expected));
        assert_eq!(guard.take_fault(), None);
    }

    #[test]
    // Purpose
    // -------
    // A NaN NLL is an error and does not move the last good point.
    //
    // Given
    // -----
    // - Evaluate (0, 1), then (6, 0) where the NLL is NaN.
    //
    // Expect
    // ------
    // - NonFiniteCost, also recorded in the guard; last_good stays (0, 1).
    fn non_finite_cost_is_rejected() {
        let mut f = Quadratic { calls: 0 };
        let guard = RunGuard::new();
        let adapter = NllAdapter::new(&mut f, 1e7, &guard);
        adapter.cost(&array![0.0, 1.0]).unwrap();

        let r = adapter.evaluate(&array![6.0, 0.0]);

        assert!(matches!(r, Err(OptError::NonFiniteCost { .. })));
        assert!(matches!(guard.take_fault(), Some(OptError::NonFiniteCost { .. })));
        assert_eq!(guard.last_good(), Some(array![0.0, 1.0]));
    }
}
