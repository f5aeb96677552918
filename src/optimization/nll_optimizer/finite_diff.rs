//! nll_optimizer::finite_diff — finite-difference Hessian of an analytic
//! gradient.
//!
//! Purpose
//! -------
//! Approximate `∇²NLL` from `∇NLL` for amplitudes that provide first but not
//! second derivatives. `Fcn` falls back to [`compute_hessian`] when an
//! amplitude reports `HessianNotImplemented`.
//!
//! Key behaviors
//! -------------
//! - Central differences of the gradient first; forward differences when the
//!   central result fails validation.
//! - The result is symmetrized by averaging each off-diagonal pair.
//!
//! Invariants & assumptions
//! ------------------------
//! - The returned matrix is `dim × dim` with finite entries
//!   ([`validate_hessian`]).
//! - The gradient closure cannot return errors; callers capture them on the
//!   side and return NaN, which then fails validation.
use crate::optimization::{
    errors::OptResult,
    nll_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::validate_hessian,
    },
};
use finitediff::FiniteDiff;

/// Finite-difference Hessian of the gradient `f` at `theta`.
///
/// # Errors
/// - `OptError::HessianShape` / `OptError::NonFiniteHessian` when the
///   forward-difference fallback also fails validation.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hessians of a correlated quadratic recovered from its gradient.
    // - Validation failure for non-finite gradients.
    // - In-place symmetrization.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The Hessian of NLL = ½ θᵀAθ is A, whatever the point.
    //
    // Given
    // -----
    // - A = [[2, 0.5], [0.5, 1]], gradient Aθ, θ = (1, -3).
    //
    // Expect
    // ------
    // - compute_hessian ≈ A, exactly symmetric.
    fn correlated_quadratic_recovers_matrix() {
        // Arrange
        let a: Array2<f64> = array![[2.0, 0.5], [0.5, 1.0]];
        let grad_fn = |theta: &Theta| a.dot(theta);

        // Act
        let hess = compute_hessian(&grad_fn, &array![1.0, -3.0]).unwrap();

        // Assert
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(hess[[i, j]], a[[i, j]], epsilon = 1e-6);
            }
        }
        assert_eq!(hess[[0, 1]], hess[[1, 0]]);
    }

    #[test]
    // Purpose
    // -------
    // A NaN gradient fails on both paths.
    //
    // Given
    // -----
    // - Gradient function that always returns [NaN].
    //
    // Expect
    // ------
    // - Err(OptError::NonFiniteHessian { .. }).
    fn non_finite_gradient_is_rejected() {
        let grad_fn = |_: &Theta| array![f64::NAN];

        let result = compute_hessian(&grad_fn, &array![0.0]);

        assert!(matches!(result, Err(OptError::NonFiniteHessian { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Symmetrization averages off-diagonal pairs and keeps the diagonal.
    //
    // Given
    // -----
    // - [[1, 2], [0, 3]].
    //
    // Expect
    // ------
    // - [[1, 1], [1, 3]].
    fn symmetrize_averages_pairs() {
        let mut h: Hessian = array![[1.0, 2.0], [0.0, 3.0]];

        symmetrize_hess(&mut h);

        assert_eq!(h, array![[1.0, 1.0], [1.0, 3.0]]);
    }
}
