//! likelihood::weights — merging data and background into one weighted set.
//!
//! Purpose
//! -------
//! Build the per-event weight vector used by the NLL: data events carry
//! their own weights (default 1), background events are appended with the
//! fixed weight `−w_bkg` so that they are subtracted, and the merged vector
//! is optionally rescaled by `α = Σw / Σw²`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Background events ignore any weights of their own; only `w_bkg` counts.
//! - The merged event order is data first, then background, and weights
//!   follow the same order.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use ndarray::{Array1, ArrayView1, s};

/// Events and weights after merging and optional rescaling.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedData<E> {
    pub events: Vec<E>,
    pub weights: Array1<f64>,
    /// `Σw / Σw²` of the merged weights before any rescaling.
    pub alpha: f64,
}

/// Merge `data` and `bg` into one weighted sample.
///
/// - `weights`: per-event data weights; `None` means all ones.
/// - `bg`: background events, each weighted `−w_bkg`.
/// - `rescale`: multiply all weights by `α = Σw / Σw²`.
///
/// # Errors
/// - [`LikelihoodError::WeightLengthMismatch`] if `weights` and `data`
///   differ in length.
/// - [`LikelihoodError::InvalidBackgroundWeight`] for a non-finite `w_bkg`.
/// - [`LikelihoodError::DegenerateWeights`] if `Σw² = 0` (empty sample or
///   all-zero weights).
pub fn weighted_data<E>(
    mut data: Vec<E>, weights: Option<Array1<f64>>, bg: Option<Vec<E>>, w_bkg: f64, rescale: bool,
) -> LikelihoodResult<WeightedData<E>> {
    if !w_bkg.is_finite() {
        return Err(LikelihoodError::InvalidBackgroundWeight { value: w_bkg });
    }
    let n_data = data.len();
    let mut weights = match weights {
        Some(w) if w.len() != n_data => {
            return Err(LikelihoodError::WeightLengthMismatch { events: n_data, weights: w.len() });
        }
        Some(w) => w,
        None => Array1::ones(n_data),
    };
    if let Some(bg) = bg {
        let bg_weights = std::iter::repeat(-w_bkg).take(bg.len());
        weights = weights.iter().copied().chain(bg_weights).collect();
        data.extend(bg);
    }
    let alpha = alpha_factor(&weights)?;
    if rescale {
        weights *= alpha;
    }
    Ok(WeightedData { events: data, weights, alpha })
}

/// Effective-sample-size factor `Σw / Σw²`.
///
/// # Errors
/// [`LikelihoodError::DegenerateWeights`] if `Σw² = 0`.
pub fn alpha_factor(weights: &Array1<f64>) -> LikelihoodResult<f64> {
    let sum_sq = weights.dot(weights);
    if sum_sq == 0.0 {
        return Err(LikelihoodError::DegenerateWeights { sum_sq });
    }
    Ok(weights.sum() / sum_sq)
}

/// Index ranges `[start, end)` covering `n` items in chunks of `batch`.
pub(crate) fn chunk_ranges(n: usize, batch: usize) -> Vec<(usize, usize)> {
    (0..n).step_by(batch.max(1)).map(|start| (start, (start + batch).min(n))).collect()
}

/// Weights of one chunk.
pub(crate) fn chunk_weights(weights: &Array1<f64>, range: (usize, usize)) -> ArrayView1<'_, f64> {
    weights.slice(s![range.0..range.1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Background subtraction via negative weights.
    // - Alpha rescaling and its effect on Σw / Σw².
    // - Length validation and degenerate weights.
    // - Chunk ranges used by batch reductions.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check merge order and background weights without rescaling.
    //
    // Given
    // -----
    // - Three data events with unit weights, two background events,
    //   w_bkg = 0.5.
    //
    // Expect
    // ------
    // - Events [d0, d1, d2, b0, b1]; weights [1, 1, 1, -0.5, -0.5];
    //   alpha = 2 / 3.5.
    fn background_is_appended_with_negative_weight() {
        // Arrange
        let data = vec![0, 1, 2];
        let bg = vec![10, 11];

        // Act
        let merged = weighted_data(data, None, Some(bg), 0.5, false).unwrap();

        // Assert
        assert_eq!(merged.events, vec![0, 1, 2, 10, 11]);
        assert_eq!(merged.weights, array![1.0, 1.0, 1.0, -0.5, -0.5]);
        assert_relative_eq!(merged.alpha, 2.0 / 3.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Rescaling by alpha makes the weights self-normalized.
    //
    // Given
    // -----
    // - Data weights [2, 1, 0.5] and no background, rescale on.
    //
    // Expect
    // ------
    // - Rescaled weights satisfy Σw = Σw².
    fn alpha_rescaling_equalizes_sum_and_sum_of_squares() {
        // Arrange
        let weights = array![2.0, 1.0, 0.5];

        // Act
        let merged = weighted_data(vec!['a', 'b', 'c'], Some(weights), None, 1.0, true).unwrap();

        // Assert
        let w = &merged.weights;
        assert_relative_eq!(w.sum(), w.dot(w), epsilon = 1e-12);
        assert_relative_eq!(merged.alpha, 3.5 / 5.25, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Reject inconsistent or degenerate inputs.
    //
    // Given
    // -----
    // - Two events with three weights; an empty sample with rescaling.
    //
    // Expect
    // ------
    // - WeightLengthMismatch, then DegenerateWeights.
    fn mismatched_and_degenerate_weights_are_rejected() {
        let mismatch = weighted_data(vec![1, 2], Some(array![1.0, 1.0, 1.0]), None, 1.0, true);
        assert!(matches!(
            mismatch,
            Err(LikelihoodError::WeightLengthMismatch { events: 2, weights: 3 })
        ));

        let empty = weighted_data(Vec::<u8>::new(), None, None, 1.0, true);
        assert!(matches!(empty, Err(LikelihoodError::DegenerateWeights { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Chunk ranges tile the index space in order.
    //
    // Given
    // -----
    // - n = 10, batch = 4; n = 3, batch = 5.
    //
    // Expect
    // ------
    // - [(0,4), (4,8), (8,10)] and [(0,3)].
    fn chunk_ranges_tile_in_order() {
        assert_eq!(chunk_ranges(10, 4), vec![(0, 4), (4, 8), (8, 10)]);
        assert_eq!(chunk_ranges(3, 5), vec![(0, 3)]);
        assert!(chunk_ranges(0, 5).is_empty());
    }
}
