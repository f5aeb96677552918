//! inference::significance — Wilks significance of a nested-model NLL gap.
//!
//! Purpose
//! -------
//! Express how strongly the data prefer a model over a nested one with
//! `ndf` fewer free parameters, as a two-sided Gaussian significance.
//!
//! Key behaviors
//! -------------
//! - `2|ΔNLL|` is taken as χ²(ndf) distributed; its upper-tail probability
//!   `p` is converted to `σ = Φ⁻¹(1 − p/2)`.
//! - The tail is evaluated as `−Φ⁻¹(p/2)` so that very small `p` keep their
//!   precision; `p` underflowing to zero gives `σ = +inf`.
//!
//! Conventions
//! -----------
//! - The sign of `ΔNLL` is ignored: callers may pass either ordering of the
//!   two minima.
use crate::inference::errors::{InferenceError, InferenceResult};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Gaussian significance of an NLL difference `delta_nll` between two
/// nested fits that differ by `ndf` free parameters.
///
/// # Errors
/// [`InferenceError::InvalidSignificance`] for a non-finite `delta_nll` or
/// `ndf == 0`.
pub fn significance(delta_nll: f64, ndf: usize) -> InferenceResult<f64> {
    if !delta_nll.is_finite() || ndf == 0 {
        return Err(InferenceError::InvalidSignificance { delta_nll, ndf });
    }
    let chi2 = ChiSquared::new(ndf as f64).map_err(|e| InferenceError::Anyhow(e.to_string()))?;
    let p = chi2.sf(2.0 * delta_nll.abs());
    let sigma = -Normal::standard().inverse_cdf(0.5 * p);
    log::debug!("significance: delta_nll {delta_nll}, ndf {ndf}, p {p:.3e}, sigma {sigma:.3}");
    Ok(sigma.max(0.0))
}
