//! likelihood::model — weighted extended NLL of an amplitude.
//!
//! Purpose
//! -------
//! Assemble the negative log-likelihood
//!
//! ```text
//! NLL(θ) = −Σ_i w_i ln f(x_i; θ) + sw · ln( Σ_j v_j f(y_j; θ) ),   sw = Σ_i w_i
//! ```
//!
//! and its first and second derivatives from the chunked reductions in
//! [`crate::likelihood::batch`]. `x` is the merged data/background sample
//! with weights `w`; `y` is the normalization (MC) sample with weights `v`
//! (uniform `1/n` in [`Fcn`](crate::likelihood::Fcn), so the sum is the MC
//! mean).
//!
//! Key behaviors
//! -------------
//! - Gradient: `−Σ w ∂ln f + sw · g`, with `g = ∂int / int`.
//! - Hessian: `−Σ w ∂²ln f − sw · g gᵀ + (sw / int) ∂²int`.
//! - Optional Gaussian constraints add `(θ−μ)² / 2σ²` per constrained
//!   parameter, `(θ−μ)/σ²` to the gradient and `1/σ²` to the Hessian
//!   diagonal.
//!
//! Invariants & assumptions
//! ------------------------
//! - Evaluation uses the amplitude's current parameters; [`Model`] never
//!   sets them implicitly. Callers set `θ` first (see `Fcn`).
//! - Constraint names are resolved to parameter indices at construction.
//! - The normalization sample must be non-empty.
//!
//! Downstream usage
//! ----------------
//! - [`Fcn`](crate::likelihood::Fcn) owns a `Model` together with the
//!   prepared samples and exposes the optimizer-facing surface.
use crate::{
    likelihood::{
        batch::{reduce, BatchPlan, Order, Partial, Transform},
        errors::{LikelihoodError, LikelihoodResult},
        traits::Amplitude,
        weights::{weighted_data, WeightedData},
    },
    optimization::nll_optimizer::types::{Grad, Hessian, Theta},
};
use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;

/// Gaussian prior `N(mean, sigma²)` on one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianConstraint {
    pub mean: f64,
    pub sigma: f64,
}

/// Amplitude plus background weight and parameter constraints.
#[derive(Debug, Clone)]
pub struct Model<A: Amplitude> {
    amp: A,
    w_bkg: f64,
    /// Keyed by parameter index.
    constraints: BTreeMap<usize, GaussianConstraint>,
}

impl<A: Amplitude> Model<A> {
    /// Wrap `amp` with background weight `w_bkg`.
    ///
    /// # Errors
    /// [`LikelihoodError::InvalidBackgroundWeight`] for a non-finite
    /// `w_bkg`.
    pub fn new(amp: A, w_bkg: f64) -> LikelihoodResult<Self> {
        if !w_bkg.is_finite() {
            return Err(LikelihoodError::InvalidBackgroundWeight { value: w_bkg });
        }
        Ok(Model { amp, w_bkg, constraints: BTreeMap::new() })
    }

    /// Add a Gaussian constraint on parameter `name`, replacing any previous
    /// constraint on it.
    ///
    /// # Errors
    /// - [`LikelihoodError::UnknownParameter`] if `name` is not trainable.
    /// - [`LikelihoodError::InvalidConstraint`] unless `sigma` is finite and
    ///   positive and `mean` is finite.
    pub fn with_constraint(mut self, name: &str, mean: f64, sigma: f64) -> LikelihoodResult<Self> {
        if !(sigma.is_finite() && sigma > 0.0 && mean.is_finite()) {
            return Err(LikelihoodError::InvalidConstraint { name: name.to_string(), sigma });
        }
        let Some(index) = self.amp.param_names().iter().position(|n| n == name) else {
            return Err(LikelihoodError::UnknownParameter { name: name.to_string() });
        };
        self.constraints.insert(index, GaussianConstraint { mean, sigma });
        Ok(self)
    }

    pub fn amplitude(&self) -> &A {
        &self.amp
    }

    pub fn amplitude_mut(&mut self) -> &mut A {
        &mut self.amp
    }

    pub fn into_amplitude(self) -> A {
        self.amp
    }

    pub fn w_bkg(&self) -> f64 {
        self.w_bkg
    }

    /// Constraints keyed by parameter name.
    pub fn constraints(&self) -> BTreeMap<String, GaussianConstraint> {
        let names = self.amp.param_names();
        self.constraints
            .iter()
            .filter_map(|(&i, c)| names.get(i).map(|n| (n.clone(), *c)))
            .collect()
    }

    pub fn n_params(&self) -> usize {
        self.amp.n_params()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.amp.param_names()
    }

    pub fn params(&self) -> Theta {
        self.amp.params()
    }

    /// # Errors
    /// [`LikelihoodError::ParamLengthMismatch`] if `theta` does not have one
    /// entry per trainable parameter, plus any amplitude error.
    pub fn set_params(&mut self, theta: &Theta) -> LikelihoodResult<()> {
        let expected = self.amp.n_params();
        if theta.len() != expected {
            return Err(LikelihoodError::ParamLengthMismatch { expected, found: theta.len() });
        }
        self.amp.set_params(theta)
    }

    /// Merge data and background with this model's `w_bkg`; see
    /// [`weighted_data`].
    pub fn weighted_data(
        &self, data: Vec<A::Event>, weights: Option<Array1<f64>>, bg: Option<Vec<A::Event>>,
        rescale: bool,
    ) -> LikelihoodResult<WeightedData<A::Event>> {
        weighted_data(data, weights, bg, self.w_bkg, rescale)
    }

    /// NLL at the current parameters.
    pub fn nll(
        &self, data: &[A::Event], weights: ArrayView1<'_, f64>, mc: &[A::Event],
        mc_weights: ArrayView1<'_, f64>, plan: BatchPlan,
    ) -> LikelihoodResult<f64> {
        Ok(self.assemble(data, weights, mc, mc_weights, Order::Value, plan)?.value)
    }

    /// NLL and gradient at the current parameters.
    pub fn nll_grad(
        &self, data: &[A::Event], weights: ArrayView1<'_, f64>, mc: &[A::Event],
        mc_weights: ArrayView1<'_, f64>, plan: BatchPlan,
    ) -> LikelihoodResult<(f64, Grad)> {
        let out = self.assemble(data, weights, mc, mc_weights, Order::Gradient, plan)?;
        let grad = out.grad.unwrap_or_else(|| Array1::zeros(self.n_params()));
        Ok((out.value, grad))
    }

    /// NLL, gradient and Hessian at the current parameters.
    ///
    /// # Errors
    /// [`LikelihoodError::HessianNotImplemented`] if the amplitude has no
    /// second derivatives.
    pub fn nll_grad_hessian(
        &self, data: &[A::Event], weights: ArrayView1<'_, f64>, mc: &[A::Event],
        mc_weights: ArrayView1<'_, f64>, plan: BatchPlan,
    ) -> LikelihoodResult<(f64, Grad, Hessian)> {
        let p = self.n_params();
        let out = self.assemble(data, weights, mc, mc_weights, Order::Hessian, plan)?;
        let grad = out.grad.unwrap_or_else(|| Array1::zeros(p));
        let hess = out.hess.unwrap_or_else(|| Hessian::zeros((p, p)));
        Ok((out.value, grad, hess))
    }

    // ---- Helper methods ----

    fn assemble(
        &self, data: &[A::Event], weights: ArrayView1<'_, f64>, mc: &[A::Event],
        mc_weights: ArrayView1<'_, f64>, order: Order, plan: BatchPlan,
    ) -> LikelihoodResult<Partial> {
        if mc.is_empty() {
            return Err(LikelihoodError::EmptyMcSample);
        }
        let sw = weights.sum();
        let ln = reduce(&self.amp, data, weights, Transform::Ln, order, plan)?;
        let int = reduce(&self.amp, mc, mc_weights, Transform::Identity, order, plan)?;

        let mut value = -ln.value + sw * int.value.ln();
        let mut grad = None;
        let mut hess = None;
        if let (Some(g_ln), Some(g_int)) = (ln.grad, int.grad) {
            let g_norm = &g_int / int.value;
            if let (Some(h_ln), Some(h_int)) = (ln.hess, int.hess) {
                let gg = outer(&g_norm);
                hess = Some(-&h_ln - &(gg * sw) + &(h_int * (sw / int.value)));
            }
            grad = Some(-&g_ln + &(&g_norm * sw));
        }

        let theta = self.amp.params();
        for (&i, c) in &self.constraints {
            let d = theta[i] - c.mean;
            let inv_var = 1.0 / (c.sigma * c.sigma);
            value += 0.5 * d * d * inv_var;
            if let Some(g) = grad.as_mut() {
                g[i] += d * inv_var;
            }
            if let Some(h) = hess.as_mut() {
                h[[i, i]] += inv_var;
            }
        }
        Ok(Partial { value, grad, hess })
    }
}

fn outer(v: &Array1<f64>) -> Hessian {
    let col = v.view().insert_axis(ndarray::Axis(1));
    let row = v.view().insert_axis(ndarray::Axis(0));
    col.dot(&row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::test_amplitude::{ToyAmplitude, grid};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - NLL assembly against a direct evaluation of the defining formula.
    // - Gradient and Hessian against central differences of the NLL.
    // - Gaussian constraint terms and constraint validation.
    // - Empty normalization sample and parameter-length checks.
    // -------------------------------------------------------------------------

    const PLAN: BatchPlan = BatchPlan { batch: 64, parallel: false };

    fn samples() -> (Vec<f64>, Array1<f64>, Vec<f64>, Array1<f64>) {
        let data = vec![-0.8, -0.3, 0.1, 0.4, 0.9];
        let w = array![1.0, 1.5, 0.5, 1.0, -0.25];
        let mc = grid(101);
        let v = Array1::from_elem(mc.len(), 1.0 / mc.len() as f64);
        (data, w, mc, v)
    }

    fn direct_nll(a: f64, b: f64, data: &[f64], w: &Array1<f64>, mc: &[f64]) -> f64 {
        let f = |x: f64| (1.0 + a * x).powi(2) + (b * x).powi(2);
        let ln: f64 = data.iter().zip(w.iter()).map(|(&x, &wi)| wi * f(x).ln()).sum();
        let int = mc.iter().map(|&y| f(y)).sum::<f64>() / mc.len() as f64;
        -ln + w.sum() * int.ln()
    }

    #[test]
    // Purpose
    // -------
    // The assembled NLL equals the defining formula.
    //
    // Given
    // -----
    // - Toy amplitude at (0.5, 0.3), five weighted events (one negative),
    //   101 MC events with weight 1/101.
    //
    // Expect
    // ------
    // - nll matches −Σ w ln f + Σw · ln(mean f_mc) to 1e-12.
    fn nll_matches_defining_formula() {
        // Arrange
        let model = Model::new(ToyAmplitude::new(0.5, 0.3), 1.0).unwrap();
        let (data, w, mc, v) = samples();

        // Act
        let nll = model.nll(&data, w.view(), &mc, v.view(), PLAN).unwrap();

        // Assert
        assert_relative_eq!(nll, direct_nll(0.5, 0.3, &data, &w, &mc), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Analytic gradient and Hessian agree with central differences,
    // including the −sw·g gᵀ normalization term.
    //
    // Given
    // -----
    // - The sample of `nll_matches_defining_formula`, step h = 1e-5.
    //
    // Expect
    // ------
    // - Gradient within 1e-6 of differences of the direct NLL.
    // - Hessian within 1e-5 of differences of the analytic gradient.
    fn derivatives_match_central_differences() {
        // Arrange
        let mut model = Model::new(ToyAmplitude::new(0.5, 0.3), 1.0).unwrap();
        let (data, w, mc, v) = samples();
        let theta = array![0.5, 0.3];
        let h = 1e-5;

        // Act
        let (_, grad, hess) =
            model.nll_grad_hessian(&data, w.view(), &mc, v.view(), PLAN).unwrap();

        // Assert
        for k in 0..2 {
            let mut up = theta.clone();
            let mut dn = theta.clone();
            up[k] += h;
            dn[k] -= h;
            let fd = (direct_nll(up[0], up[1], &data, &w, &mc)
                - direct_nll(dn[0], dn[1], &data, &w, &mc))
                / (2.0 * h);
            assert_relative_eq!(grad[k], fd, epsilon = 1e-6);

            model.set_params(&up).unwrap();
            let (_, g_up) = model.nll_grad(&data, w.view(), &mc, v.view(), PLAN).unwrap();
            model.set_params(&dn).unwrap();
            let (_, g_dn) = model.nll_grad(&data, w.view(), &mc, v.view(), PLAN).unwrap();
            model.set_params(&theta).unwrap();
            for l in 0..2 {
                let fd2 = (g_up[l] - g_dn[l]) / (2.0 * h);
                assert_relative_eq!(hess[[l, k]], fd2, epsilon = 1e-5);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A Gaussian constraint adds its quadratic term and derivatives.
    //
    // Given
    // -----
    // - Constraint b ~ N(0.1, 0.2²) at b = 0.3.
    //
    // Expect
    // ------
    // - ΔNLL = 0.5, Δgrad_b = 5, ΔH_bb = 25, other entries unchanged.
    fn constraint_adds_quadratic_penalty() {
        // Arrange
        let plain = Model::new(ToyAmplitude::new(0.5, 0.3), 1.0).unwrap();
        let constrained = plain.clone().with_constraint("b", 0.1, 0.2).unwrap();
        let (data, w, mc, v) = samples();

        // Act
        let (n0, g0, h0) = plain.nll_grad_hessian(&data, w.view(), &mc, v.view(), PLAN).unwrap();
        let (n1, g1, h1) =
            constrained.nll_grad_hessian(&data, w.view(), &mc, v.view(), PLAN).unwrap();

        // Assert
        assert_relative_eq!(n1 - n0, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g1[0], g0[0], epsilon = 1e-12);
        assert_relative_eq!(g1[1] - g0[1], 5.0, epsilon = 1e-9);
        assert_relative_eq!(h1[[1, 1]] - h0[[1, 1]], 25.0, epsilon = 1e-9);
        assert_relative_eq!(h1[[0, 1]], h0[[0, 1]], epsilon = 1e-12);
        assert_eq!(constrained.constraints()["b"], GaussianConstraint { mean: 0.1, sigma: 0.2 });
    }

    #[test]
    // Purpose
    // -------
    // Invalid constraints, empty MC and wrong parameter lengths are errors.
    //
    // Given
    // -----
    // - Constraint on unknown "c"; sigma = 0; empty MC sample; θ of length 3.
    //
    // Expect
    // ------
    // - UnknownParameter, InvalidConstraint, EmptyMcSample,
    //   ParamLengthMismatch.
    fn invalid_configuration_is_rejected() {
        let model = Model::new(ToyAmplitude::new(0.5, 0.3), 1.0).unwrap();
        let (data, w, _, _) = samples();

        let unknown = model.clone().with_constraint("c", 0.0, 1.0);
        assert!(matches!(unknown, Err(LikelihoodError::UnknownParameter { .. })));

        let zero = model.clone().with_constraint("a", 0.0, 0.0);
        assert!(matches!(zero, Err(LikelihoodError::InvalidConstraint { .. })));

        let empty: Vec<f64> = Vec::new();
        let r = model.nll(&data, w.view(), &empty, Array1::zeros(0).view(), PLAN);
        assert_eq!(r, Err(LikelihoodError::EmptyMcSample));

        let mut model = model;
        let r = model.set_params(&array![1.0, 2.0, 3.0]);
        assert_eq!(r, Err(LikelihoodError::ParamLengthMismatch { expected: 2, found: 3 }));

        assert!(matches!(
            Model::new(ToyAmplitude::new(0.0, 0.0), f64::NAN),
            Err(LikelihoodError::InvalidBackgroundWeight { .. })
        ));
    }
}
