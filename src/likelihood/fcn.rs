//! likelihood::fcn — optimizer-facing NLL over prepared samples.
//!
//! Purpose
//! -------
//! Bind a [`Model`] to a concrete data set, background and normalization
//! sample, and expose `θ → NLL`, `θ → (NLL, ∇)` and `θ → (NLL, ∇, H)` with
//! the amplitude parameters set as a side effect.
//!
//! Key behaviors
//! -------------
//! - Data and background are merged (and alpha-rescaled when requested)
//!   exactly once, at construction.
//! - The normalization sample carries uniform weights `1/n`.
//! - Every evaluation updates `cached_nll` and the call counters.
//! - When the amplitude has no second derivatives, `nll_grad_hessian`
//!   differentiates the exact gradient numerically and restores `θ`
//!   afterwards.
//!
//! Invariants & assumptions
//! ------------------------
//! - Evaluations are not reentrant: each one writes the amplitude's
//!   parameters before reading them.
use crate::{
    likelihood::{
        batch::{BatchPlan, reduce_partial},
        errors::{LikelihoodError, LikelihoodResult},
        model::Model,
        traits::{Amplitude, NllFunction},
    },
    optimization::nll_optimizer::{
        finite_diff::compute_hessian,
        types::{Grad, Hessian, Theta},
    },
};
use ndarray::Array1;
use std::cell::RefCell;

/// Default number of events per chunk.
pub const DEFAULT_BATCH: usize = 65_000;

/// Evaluation settings for [`Fcn`].
///
/// - `batch`: events per chunk for value and gradient passes.
/// - `hessian_batch`: events per chunk for Hessian passes; `None` reuses
///   `batch`.
/// - `alpha_rescale`: multiply merged weights by `Σw / Σw²`.
/// - `parallel`: evaluate chunks on the rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcnOptions {
    pub batch: usize,
    pub hessian_batch: Option<usize>,
    pub alpha_rescale: bool,
    pub parallel: bool,
}

impl FcnOptions {
    /// # Errors
    /// [`LikelihoodError::InvalidBatchSize`] if `batch` or `hessian_batch`
    /// is zero.
    pub fn new(
        batch: usize, hessian_batch: Option<usize>, alpha_rescale: bool, parallel: bool,
    ) -> LikelihoodResult<Self> {
        let opts = FcnOptions { batch, hessian_batch, alpha_rescale, parallel };
        opts.validate()?;
        Ok(opts)
    }

    fn validate(&self) -> LikelihoodResult<()> {
        for b in std::iter::once(self.batch).chain(self.hessian_batch) {
            if b == 0 {
                return Err(LikelihoodError::InvalidBatchSize { batch: b });
            }
        }
        Ok(())
    }

    fn plan(&self) -> BatchPlan {
        BatchPlan { batch: self.batch, parallel: self.parallel }
    }

    fn hessian_plan(&self) -> BatchPlan {
        BatchPlan { batch: self.hessian_batch.unwrap_or(self.batch), parallel: self.parallel }
    }
}

impl Default for FcnOptions {
    fn default() -> Self {
        FcnOptions {
            batch: DEFAULT_BATCH,
            hessian_batch: None,
            alpha_rescale: true,
            parallel: false,
        }
    }
}

/// NLL of one sample, callable by an optimizer.
pub struct Fcn<A: Amplitude> {
    model: Model<A>,
    data: Vec<A::Event>,
    weights: Array1<f64>,
    mc: Vec<A::Event>,
    mc_weights: Array1<f64>,
    alpha: f64,
    opts: FcnOptions,
    n_call: usize,
    n_grad: usize,
    cached_nll: Option<f64>,
}

impl<A: Amplitude> Fcn<A> {
    /// Prepare `data` (optionally weighted), `bg` and `mc` for evaluation.
    ///
    /// # Errors
    /// - [`LikelihoodError::EmptyMcSample`] for an empty `mc`.
    /// - [`LikelihoodError::InvalidBatchSize`] for a zero batch in `opts`.
    /// - Any error of [`Model::weighted_data`].
    pub fn new(
        model: Model<A>, data: Vec<A::Event>, weights: Option<Array1<f64>>, mc: Vec<A::Event>,
        bg: Option<Vec<A::Event>>, opts: FcnOptions,
    ) -> LikelihoodResult<Self> {
        if mc.is_empty() {
            return Err(LikelihoodError::EmptyMcSample);
        }
        opts.validate()?;
        let merged = model.weighted_data(data, weights, bg, opts.alpha_rescale)?;
        let mc_weights = Array1::from_elem(mc.len(), 1.0 / mc.len() as f64);
        Ok(Fcn {
            model,
            data: merged.events,
            weights: merged.weights,
            mc,
            mc_weights,
            alpha: merged.alpha,
            opts,
            n_call: 0,
            n_grad: 0,
            cached_nll: None,
        })
    }

    pub fn model(&self) -> &Model<A> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model<A> {
        &mut self.model
    }

    /// Merged data and background events.
    pub fn data(&self) -> &[A::Event] {
        &self.data
    }

    /// Final per-event weights, after background merge and rescaling.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn mc(&self) -> &[A::Event] {
        &self.mc
    }

    pub fn options(&self) -> &FcnOptions {
        &self.opts
    }

    /// `Σw / Σw²` of the merged weights before rescaling.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of NLL evaluations of any order.
    pub fn n_call(&self) -> usize {
        self.n_call
    }

    /// Number of evaluations that produced a gradient.
    pub fn n_grad(&self) -> usize {
        self.n_grad
    }

    pub fn cached_nll(&self) -> Option<f64> {
        self.cached_nll
    }

    pub fn param_names(&self) -> Vec<String> {
        self.model.param_names()
    }

    /// Normalization integral of the intensity restricted to the resonances
    /// at `active`, at the amplitude's current parameters and with the
    /// value-pass batching.
    ///
    /// # Errors
    /// [`LikelihoodError::PartialNotImplemented`] for an amplitude without
    /// resonance subsets; value-length errors from the amplitude.
    pub fn mc_partial_integral(&self, active: &[usize]) -> LikelihoodResult<f64> {
        let amp = self.model.amplitude();
        reduce_partial(amp, &self.mc, self.mc_weights.view(), active, self.opts.plan())
    }

    pub fn n_params(&self) -> usize {
        self.model.n_params()
    }

    /// NLL at `theta`.
    pub fn evaluate(&mut self, theta: &Theta) -> LikelihoodResult<f64> {
        self.model.set_params(theta)?;
        let nll = self.model.nll(
            &self.data,
            self.weights.view(),
            &self.mc,
            self.mc_weights.view(),
            self.opts.plan(),
        )?;
        self.record(nll, false);
        Ok(nll)
    }

    /// NLL and gradient at `theta`.
    pub fn nll_grad(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad)> {
        self.model.set_params(theta)?;
        let (nll, grad) = self.model.nll_grad(
            &self.data,
            self.weights.view(),
            &self.mc,
            self.mc_weights.view(),
            self.opts.plan(),
        )?;
        self.record(nll, true);
        Ok((nll, grad))
    }

    pub fn grad(&mut self, theta: &Theta) -> LikelihoodResult<Grad> {
        Ok(self.nll_grad(theta)?.1)
    }

    /// NLL, gradient and symmetric Hessian at `theta`.
    ///
    /// Uses the amplitude's second derivatives when available and otherwise
    /// a central-difference Hessian of the exact gradient (forward
    /// differences if the central one is not finite).
    ///
    /// # Errors
    /// [`LikelihoodError::FiniteDiff`] if the numerical Hessian is not
    /// finite; any evaluation error raised at a perturbed point.
    pub fn nll_grad_hessian(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad, Hessian)> {
        self.model.set_params(theta)?;
        let plan = self.opts.hessian_plan();
        let analytic = self.model.nll_grad_hessian(
            &self.data,
            self.weights.view(),
            &self.mc,
            self.mc_weights.view(),
            plan,
        );
        let (nll, grad, hess) = match analytic {
            Err(LikelihoodError::HessianNotImplemented) => self.numerical_hessian(theta, plan)?,
            other => other?,
        };
        self.record(nll, true);
        Ok((nll, grad, hess))
    }

    // ---- Helper methods ----

    fn record(&mut self, nll: f64, with_grad: bool) {
        self.cached_nll = Some(nll);
        self.n_call += 1;
        if with_grad {
            self.n_grad += 1;
        }
    }

    fn numerical_hessian(
        &mut self, theta: &Theta, plan: BatchPlan,
    ) -> LikelihoodResult<(f64, Grad, Hessian)> {
        let (data, weights, mc, mc_weights) =
            (&self.data, self.weights.view(), &self.mc, self.mc_weights.view());
        let (nll, grad) = self.model.nll_grad(data, weights, mc, mc_weights, plan)?;

        let closure_err: RefCell<Option<LikelihoodError>> = RefCell::new(None);
        let model = RefCell::new(&mut self.model);
        let grad_fn = |x: &Theta| -> Grad {
            let mut m = model.borrow_mut();
            let eval = m
                .set_params(x)
                .and_then(|_| m.nll_grad(data, weights, mc, mc_weights, plan));
            match eval {
                Ok((_, g)) => g,
                Err(e) => {
                    closure_err.replace(Some(e));
                    Array1::from_elem(x.len(), f64::NAN)
                }
            }
        };
        let hess = compute_hessian(&grad_fn, theta);
        model.into_inner().set_params(theta)?;

        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        let hess = hess.map_err(|e| LikelihoodError::FiniteDiff { text: e.to_string() })?;
        Ok((nll, grad, hess))
    }
}

impl<A: Amplitude> NllFunction for Fcn<A> {
    fn n_params(&self) -> usize {
        Fcn::n_params(self)
    }

    fn evaluate(&mut self, theta: &Theta) -> LikelihoodResult<f64> {
        Fcn::evaluate(self, theta)
    }

    fn nll_grad(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad)> {
        Fcn::nll_grad(self, theta)
    }

    fn nll_grad_hessian(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad, Hessian)> {
        Fcn::nll_grad_hessian(self, theta)
    }

    fn cached_nll(&self) -> Option<f64> {
        self.cached_nll
    }
}
