//! likelihood::batch — chunked weighted reductions over event samples.
//!
//! Purpose
//! -------
//! Evaluate the two sums the NLL is built from, `Σ w·ln f` over the data
//! and `Σ w·f` over the normalization sample, together with their
//! parameter derivatives, by splitting the sample into fixed-size chunks.
//!
//! Key behaviors
//! -------------
//! - [`reduce`] evaluates every chunk independently (sequentially or on the
//!   rayon pool) and folds the per-chunk [`Partial`]s in chunk order.
//! - Derivatives of `ln f` are formed from the amplitude's per-event
//!   derivatives: `∂ln f = f'/f` and `∂²ln f = f''/f − f' f'ᵀ / f²`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Partials are always collected in chunk order and summed left to right,
//!   so the parallel and sequential paths produce identical bits for a
//!   given batch size.
//! - Amplitude outputs are shape-checked per chunk; a violation aborts the
//!   whole reduction.
//! - `f ≤ 0` under [`Transform::Ln`] yields `-inf`/NaN, which is passed
//!   through unchanged.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against direct full-sample sums, check batch-size
//!   and parallel invariance, and reject malformed amplitude outputs.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        traits::Amplitude,
        weights::chunk_ranges,
    },
    optimization::nll_optimizer::types::{Grad, Hessian},
};
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, s};
use rayon::prelude::*;

/// Per-event transform applied before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// `Σ w·f`
    Identity,
    /// `Σ w·ln f`
    Ln,
}

/// Highest derivative order requested from a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Order {
    Value,
    Gradient,
    Hessian,
}

/// How a sample is split and scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch: usize,
    pub parallel: bool,
}

/// Weighted sum and, depending on [`Order`], its gradient and Hessian.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub value: f64,
    pub grad: Option<Grad>,
    pub hess: Option<Hessian>,
}

impl Partial {
    fn zero(order: Order, n_params: usize) -> Self {
        Partial {
            value: 0.0,
            grad: (order >= Order::Gradient).then(|| Array1::zeros(n_params)),
            hess: (order >= Order::Hessian).then(|| Array2::zeros((n_params, n_params))),
        }
    }

    fn accumulate(mut self, other: Partial) -> Self {
        self.value += other.value;
        if let (Some(g), Some(o)) = (self.grad.as_mut(), other.grad.as_ref()) {
            *g += o;
        }
        if let (Some(h), Some(o)) = (self.hess.as_mut(), other.hess.as_ref()) {
            *h += o;
        }
        self
    }
}

/// Weighted reduction of `transform(f)` over `events`.
///
/// `weights` must have one entry per event. The returned gradient has
/// length `amp.n_params()` and the Hessian is `n_params × n_params`.
///
/// # Errors
/// - [`LikelihoodError::InvalidBatchSize`] for `plan.batch == 0`.
/// - [`LikelihoodError::WeightLengthMismatch`] if `weights` and `events`
///   differ in length.
/// - Shape errors from a misbehaving [`Amplitude`], and
///   [`LikelihoodError::HessianNotImplemented`] when `order` is
///   [`Order::Hessian`] and the amplitude has no second derivatives.
pub fn reduce<A: Amplitude>(
    amp: &A, events: &[A::Event], weights: ArrayView1<'_, f64>, transform: Transform, order: Order,
    plan: BatchPlan,
) -> LikelihoodResult<Partial> {
    check_inputs(events.len(), weights.len(), plan)?;
    let n_params = amp.n_params();
    let ranges = chunk_ranges(events.len(), plan.batch);
    let eval = |&(start, end): &(usize, usize)| {
        chunk_partial(amp, &events[start..end], weights.slice(s![start..end]), transform, order)
    };
    let partials: Vec<Partial> = if plan.parallel {
        ranges.par_iter().map(eval).collect::<LikelihoodResult<Vec<_>>>()?
    } else {
        ranges.iter().map(eval).collect::<LikelihoodResult<Vec<_>>>()?
    };
    Ok(partials.into_iter().fold(Partial::zero(order, n_params), Partial::accumulate))
}

/// Weighted sum `Σ w·f_S` of the intensity restricted to the resonances at
/// `active`, split and folded in chunk order like [`reduce`].
///
/// # Errors
/// The input and value-length errors of [`reduce`], and
/// [`LikelihoodError::PartialNotImplemented`] from an amplitude without
/// resonance subsets.
pub fn reduce_partial<A: Amplitude>(
    amp: &A, events: &[A::Event], weights: ArrayView1<'_, f64>, active: &[usize], plan: BatchPlan,
) -> LikelihoodResult<f64> {
    check_inputs(events.len(), weights.len(), plan)?;
    let ranges = chunk_ranges(events.len(), plan.batch);
    let eval = |&(start, end): &(usize, usize)| -> LikelihoodResult<f64> {
        let f = amp.value_partial(&events[start..end], active)?;
        check_value(&f, end - start)?;
        Ok(weights.slice(s![start..end]).dot(&f))
    };
    let sums: Vec<f64> = if plan.parallel {
        ranges.par_iter().map(eval).collect::<LikelihoodResult<Vec<_>>>()?
    } else {
        ranges.iter().map(eval).collect::<LikelihoodResult<Vec<_>>>()?
    };
    Ok(sums.into_iter().sum())
}

// ---- Helper methods ----

fn check_inputs(n_events: usize, n_weights: usize, plan: BatchPlan) -> LikelihoodResult<()> {
    if plan.batch == 0 {
        return Err(LikelihoodError::InvalidBatchSize { batch: 0 });
    }
    if n_weights != n_events {
        return Err(LikelihoodError::WeightLengthMismatch { events: n_events, weights: n_weights });
    }
    Ok(())
}

fn chunk_partial<A: Amplitude>(
    amp: &A, events: &[A::Event], w: ArrayView1<'_, f64>, transform: Transform, order: Order,
) -> LikelihoodResult<Partial> {
    let n = events.len();
    let p = amp.n_params();
    match order {
        Order::Value => {
            let f = amp.value(events)?;
            check_value(&f, n)?;
            Ok(Partial { value: weighted_value(&f, w, transform), grad: None, hess: None })
        }
        Order::Gradient => {
            let (f, df) = amp.value_grad(events)?;
            check_value(&f, n)?;
            check_grad(&df, n, p)?;
            let coef = first_order_coef(&f, w, transform);
            Ok(Partial {
                value: weighted_value(&f, w, transform),
                grad: Some(df.t().dot(&coef)),
                hess: None,
            })
        }
        Order::Hessian => {
            let (f, df, d2f) = amp.value_grad_hessian(events)?;
            check_value(&f, n)?;
            check_grad(&df, n, p)?;
            check_hessian(&d2f, n, p)?;
            let coef = first_order_coef(&f, w, transform);
            let mut hess: Hessian = Array2::zeros((p, p));
            for (i, block) in d2f.axis_iter(Axis(0)).enumerate() {
                hess.scaled_add(coef[i], &block);
            }
            if transform == Transform::Ln {
                // − Σ (w/f²) f' f'ᵀ
                let scale = &coef / &f;
                let scaled = &df * &scale.insert_axis(Axis(1));
                hess -= &df.t().dot(&scaled);
            }
            Ok(Partial {
                value: weighted_value(&f, w, transform),
                grad: Some(df.t().dot(&coef)),
                hess: Some(hess),
            })
        }
    }
}

fn weighted_value(f: &Array1<f64>, w: ArrayView1<'_, f64>, transform: Transform) -> f64 {
    match transform {
        Transform::Identity => w.dot(f),
        Transform::Ln => w.iter().zip(f.iter()).map(|(wi, fi)| wi * fi.ln()).sum(),
    }
}

/// Per-event coefficient of `f'` in the first derivative: `w` or `w / f`.
fn first_order_coef(f: &Array1<f64>, w: ArrayView1<'_, f64>, transform: Transform) -> Array1<f64> {
    match transform {
        Transform::Identity => w.to_owned(),
        Transform::Ln => &w / f,
    }
}

fn check_value(f: &Array1<f64>, n: usize) -> LikelihoodResult<()> {
    if f.len() != n {
        return Err(LikelihoodError::ValueLengthMismatch { expected: n, found: f.len() });
    }
    Ok(())
}

fn check_grad(df: &Array2<f64>, n: usize, p: usize) -> LikelihoodResult<()> {
    if df.dim() != (n, p) {
        return Err(LikelihoodError::GradientShapeMismatch { expected: (n, p), found: df.dim() });
    }
    Ok(())
}

fn check_hessian(d2f: &Array3<f64>, n: usize, p: usize) -> LikelihoodResult<()> {
    if d2f.dim() != (n, p, p) {
        return Err(LikelihoodError::HessianShapeMismatch {
            expected: (n, p, p),
            found: d2f.dim(),
        });
    }
    Ok(())
}
