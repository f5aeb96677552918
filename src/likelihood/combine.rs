//! likelihood::combine — simultaneous NLL over several independent samples.
//!
//! [`CombineFcn`] holds boxed [`NllFunction`]s that share one global
//! parameter vector and returns the plain sum of their NLLs, gradients and
//! Hessians. Each member is evaluated exactly once per call. With
//! `parallel` set, members run on the rayon pool; results are still summed
//! in member order.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        traits::NllFunction,
    },
    optimization::nll_optimizer::types::{Grad, Hessian, Theta},
};
use rayon::prelude::*;

/// Boxed member of a [`CombineFcn`].
pub type BoxedNll = Box<dyn NllFunction + Send>;

pub struct CombineFcn {
    fcns: Vec<BoxedNll>,
    parallel: bool,
    cached_nll: Option<f64>,
}

impl CombineFcn {
    /// # Errors
    /// - [`LikelihoodError::EmptyCombination`] for no members.
    /// - [`LikelihoodError::ParamCountMismatch`] if members disagree on the
    ///   number of parameters.
    pub fn new(fcns: Vec<BoxedNll>, parallel: bool) -> LikelihoodResult<Self> {
        let Some(first) = fcns.first() else {
            return Err(LikelihoodError::EmptyCombination);
        };
        let expected = first.n_params();
        if let Some(bad) = fcns.iter().find(|f| f.n_params() != expected) {
            return Err(LikelihoodError::ParamCountMismatch { expected, found: bad.n_params() });
        }
        Ok(CombineFcn { fcns, parallel, cached_nll: None })
    }

    pub fn len(&self) -> usize {
        self.fcns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fcns.is_empty()
    }

    pub fn members(&self) -> &[BoxedNll] {
        &self.fcns
    }

    pub fn members_mut(&mut self) -> &mut [BoxedNll] {
        &mut self.fcns
    }

    // ---- Helper methods ----

    /// Evaluate `op` on every member, in member order.
    fn map_members<T, F>(&mut self, op: F) -> LikelihoodResult<Vec<T>>
    where
        T: Send,
        F: Fn(&mut BoxedNll) -> LikelihoodResult<T> + Sync + Send,
    {
        if self.parallel {
            self.fcns.par_iter_mut().map(op).collect()
        } else {
            self.fcns.iter_mut().map(op).collect()
        }
    }
}

impl NllFunction for CombineFcn {
    fn n_params(&self) -> usize {
        self.fcns.first().map_or(0, |f| f.n_params())
    }

    fn evaluate(&mut self, theta: &Theta) -> LikelihoodResult<f64> {
        let parts = self.map_members(|f| f.evaluate(theta))?;
        let nll = parts.into_iter().sum();
        self.cached_nll = Some(nll);
        Ok(nll)
    }

    fn nll_grad(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad)> {
        let parts = self.map_members(|f| f.nll_grad(theta))?;
        let mut nll = 0.0;
        let mut grad = Grad::zeros(theta.len());
        for (n, g) in parts {
            nll += n;
            grad += &g;
        }
        self.cached_nll = Some(nll);
        Ok((nll, grad))
    }

    fn nll_grad_hessian(&mut self, theta: &Theta) -> LikelihoodResult<(f64, Grad, Hessian)> {
        let parts = self.map_members(|f| f.nll_grad_hessian(theta))?;
        let p = theta.len();
        let mut nll = 0.0;
        let mut grad = Grad::zeros(p);
        let mut hess = Hessian::zeros((p, p));
        for (n, g, h) in parts {
            nll += n;
            grad += &g;
            hess += &h;
        }
        self.cached_nll = Some(nll);
        Ok((nll, grad, hess))
    }

    fn cached_nll(&self) -> Option<f64> {
        self.cached_nll
    }
}
