//! inference::hessian — parameter errors from the NLL Hessian at the minimum.
//!
//! Purpose
//! -------
//! Turn `∇²NLL(θ̂)` into a covariance matrix and one-sigma parameter errors
//! without failing on singular or indefinite Hessians, and report enough
//! diagnostics for callers to notice when the errors are unreliable.
//!
//! Key behaviors
//! -------------
//! - Copy the `ndarray` Hessian into a `nalgebra::DMatrix`, averaging
//!   off-diagonal pairs, and take its symmetric eigendecomposition.
//! - Build the Moore–Penrose pseudo-inverse `C = Σ_k q_k q_kᵀ / λ_k` over
//!   eigenvalues with `|λ_k| > EIGEN_REL_CUTOFF · max|λ|`.
//! - Report the effective rank, the condition number `max|λ| / min|λ|` and
//!   the number of negative eigenvalues.
//! - Errors are `sqrt(|C_ii|)`; a derived quantity with gradient `g` has
//!   error `sqrt(|gᵀ C g|)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The Hessian is of the NLL (not of `−NLL`), so a well-determined minimum
//!   has only positive eigenvalues and `C` is the usual inverse.
//! - Negative eigenvalues are kept in the pseudo-inverse; the absolute
//!   value is taken only when forming errors.
//!
//! Conventions
//! -----------
//! - A matrix is degenerate when its rank is below its dimension or it has a
//!   negative eigenvalue; [`calc_param_errors`] logs a warning in that case.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against analytic inverses for diagonal and
//!   correlated matrices, check the pseudo-inverse of a rank-one matrix and
//!   run the full path on the toy likelihood.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    likelihood::traits::NllFunction,
    optimization::nll_optimizer::types::{Grad, Hessian, Theta},
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Eigenvalues below this fraction of the largest magnitude count as zero.
pub const EIGEN_REL_CUTOFF: f64 = 1e-12;

/// Covariance of the fitted parameters and diagnostics of the Hessian it was
/// built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMatrix {
    covariance: Array2<f64>,
    eigenvalues: Array1<f64>,
    rank: usize,
    n_negative: usize,
    condition_number: f64,
}

impl ErrorMatrix {
    /// Pseudo-invert the NLL Hessian `h`.
    ///
    /// # Errors
    /// - [`InferenceError::NonSquareHessian`] if `h` is not square.
    /// - [`InferenceError::NonFiniteHessian`] for the first NaN or infinite
    ///   entry.
    pub fn from_hessian(h: &Hessian) -> InferenceResult<Self> {
        let (rows, cols) = h.dim();
        if rows != cols {
            return Err(InferenceError::NonSquareHessian { rows, cols });
        }
        if let Some(((row, col), &value)) = h.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(InferenceError::NonFiniteHessian { row, col, value });
        }
        let n = rows;
        let mut h_nalg = DMatrix::<f64>::zeros(n, n);
        fill_dmatrix(h, &mut h_nalg);
        let eigen = h_nalg.symmetric_eigen();
        let q = eigen.eigenvectors;
        let eigenvalues = Array1::from_iter(eigen.eigenvalues.iter().copied());

        let max_abs = eigenvalues.iter().fold(0.0_f64, |m, l| m.max(l.abs()));
        let min_abs = eigenvalues.iter().fold(f64::INFINITY, |m, l| m.min(l.abs()));
        let cutoff = EIGEN_REL_CUTOFF * max_abs;
        let mut covariance = Array2::<f64>::zeros((n, n));
        let mut rank = 0;
        let mut n_negative = 0;
        for (k, &lambda) in eigenvalues.iter().enumerate() {
            if lambda.abs() <= cutoff {
                continue;
            }
            rank += 1;
            if lambda < 0.0 {
                n_negative += 1;
            }
            for i in 0..n {
                let coeff = q[(i, k)] / lambda;
                for j in 0..n {
                    covariance[[i, j]] += coeff * q[(j, k)];
                }
            }
        }
        let condition_number = if rank < n || n == 0 { f64::INFINITY } else { max_abs / min_abs };
        Ok(ErrorMatrix { covariance, eigenvalues, rank, n_negative, condition_number })
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Eigenvalues of the Hessian in the order returned by the solver.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    pub fn dim(&self) -> usize {
        self.covariance.nrows()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn n_negative(&self) -> usize {
        self.n_negative
    }

    /// `max|λ| / min|λ|`; infinite when the Hessian is singular.
    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    pub fn is_degenerate(&self) -> bool {
        self.rank < self.dim() || self.n_negative > 0
    }

    /// One-sigma errors `sqrt(|C_ii|)`.
    pub fn param_errors(&self) -> Array1<f64> {
        self.covariance.diag().mapv(|v| v.abs().sqrt())
    }

    /// Error `sqrt(|gᵀ C g|)` of a quantity with gradient `grad` at `θ̂`.
    ///
    /// # Errors
    /// [`InferenceError::GradientLengthMismatch`] if `grad` does not have one
    /// entry per parameter.
    pub fn propagate(&self, grad: &Grad) -> InferenceResult<f64> {
        if grad.len() != self.dim() {
            return Err(InferenceError::GradientLengthMismatch {
                expected: self.dim(),
                found: grad.len(),
            });
        }
        Ok(grad.dot(&self.covariance.dot(grad)).abs().sqrt())
    }
}

/// Named parameter errors together with the matrix they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamErrors {
    pub errors: BTreeMap<String, f64>,
    pub matrix: ErrorMatrix,
}

/// Evaluate the Hessian of `f` at `theta_hat` and derive named errors.
///
/// Leaves `f` evaluated at `theta_hat`.
///
/// # Errors
/// - [`InferenceError::NameCountMismatch`] if `names` does not match
///   `f.n_params()`.
/// - [`InferenceError::Likelihood`] for any evaluation error.
/// - Errors of [`ErrorMatrix::from_hessian`].
pub fn calc_param_errors<F: NllFunction + ?Sized>(
    f: &mut F, theta_hat: &Theta, names: &[String],
) -> InferenceResult<ParamErrors> {
    let expected = f.n_params();
    if names.len() != expected {
        return Err(InferenceError::NameCountMismatch { expected, found: names.len() });
    }
    let (_, _, hess) = f.nll_grad_hessian(theta_hat)?;
    let matrix = ErrorMatrix::from_hessian(&hess)?;
    if matrix.is_degenerate() {
        log::warn!(
            "degenerate error matrix: rank {}/{}, {} negative eigenvalues",
            matrix.rank(),
            matrix.dim(),
            matrix.n_negative()
        );
    }
    let errors = names.iter().cloned().zip(matrix.param_errors()).collect();
    Ok(ParamErrors { errors, matrix })
}

// ---- Helper methods ----

/// Copy `h` into `h_nalg`, averaging each off-diagonal pair.
fn fill_dmatrix(h: &Hessian, h_nalg: &mut DMatrix<f64>) {
    let n = h.ncols();
    for j in 0..n {
        h_nalg[(j, j)] = h[[j, j]];
        for i in (j + 1)..n {
            let avg = 0.5 * (h[[i, j]] + h[[j, i]]);
            h_nalg[(i, j)] = avg;
            h_nalg[(j, i)] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::{
        fcn::{Fcn, FcnOptions},
        model::Model,
        test_amplitude::{ToyAmplitude, grid},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Inverses of well-conditioned diagonal and correlated Hessians.
    // - Pseudo-inverse and diagnostics for singular and indefinite Hessians.
    // - Error propagation for a derived quantity.
    // - Input validation and the full path from an Fcn.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A positive-definite correlated Hessian is inverted exactly.
    //
    // Given
    // -----
    // - H = [[2, 1], [1, 2]], so C = [[2, -1], [-1, 2]] / 3.
    // - g = (1, 1) for propagation: gᵀCg = 2/3.
    //
    // Expect
    // ------
    // - C matches, rank 2, condition 3, not degenerate, errors sqrt(2/3),
    //   propagated error sqrt(2/3).
    fn correlated_hessian_is_inverted() {
        // Arrange
        let h = array![[2.0, 1.0], [1.0, 2.0]];

        // Act
        let m = ErrorMatrix::from_hessian(&h).unwrap();

        // Assert
        let expected = array![[2.0, -1.0], [-1.0, 2.0]] / 3.0;
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(m.covariance()[[i, j]], expected[[i, j]], epsilon = 1e-12);
            }
        }
        assert_eq!(m.rank(), 2);
        assert!(!m.is_degenerate());
        assert_relative_eq!(m.condition_number(), 3.0, epsilon = 1e-12);
        let sigma = (2.0_f64 / 3.0).sqrt();
        assert_relative_eq!(m.param_errors()[0], sigma, epsilon = 1e-12);
        assert_relative_eq!(m.propagate(&array![1.0, 1.0]).unwrap(), sigma, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Singular and indefinite Hessians give a pseudo-inverse and are flagged.
    //
    // Given
    // -----
    // - Rank-one H = [[1, 1], [1, 1]] (pinv = H / 4).
    // - Indefinite H = diag(2, -1).
    //
    // Expect
    // ------
    // - Rank one: covariance 0.25 everywhere, rank 1, infinite condition,
    //   degenerate.
    // - Indefinite: n_negative 1, degenerate, errors (1/√2, 1).
    fn singular_and_indefinite_hessians_are_flagged() {
        // Arrange
        let rank_one = array![[1.0, 1.0], [1.0, 1.0]];
        let indefinite = array![[2.0, 0.0], [0.0, -1.0]];

        // Act
        let a = ErrorMatrix::from_hessian(&rank_one).unwrap();
        let b = ErrorMatrix::from_hessian(&indefinite).unwrap();

        // Assert
        for v in a.covariance().iter() {
            assert_relative_eq!(*v, 0.25, epsilon = 1e-12);
        }
        assert_eq!(a.rank(), 1);
        assert!(a.condition_number().is_infinite());
        assert!(a.is_degenerate());

        assert_eq!((b.rank(), b.n_negative()), (2, 1));
        assert!(b.is_degenerate());
        let errors = b.param_errors();
        assert_relative_eq!(errors[0], 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(errors[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Malformed input is rejected.
    //
    // Given
    // -----
    // - A 2x3 matrix, a matrix with NaN at (1, 0), a length-3 gradient for a
    //   2x2 matrix.
    //
    // Expect
    // ------
    // - NonSquareHessian, NonFiniteHessian { row: 1, col: 0 },
    //   GradientLengthMismatch.
    fn malformed_input_is_rejected() {
        let non_square = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            ErrorMatrix::from_hessian(&non_square),
            Err(InferenceError::NonSquareHessian { rows: 2, cols: 3 })
        );
        let nan = array![[1.0, 0.0], [f64::NAN, 1.0]];
        assert!(matches!(
            ErrorMatrix::from_hessian(&nan),
            Err(InferenceError::NonFiniteHessian { row: 1, col: 0, .. })
        ));
        let m = ErrorMatrix::from_hessian(&Hessian::eye(2)).unwrap();
        assert_eq!(
            m.propagate(&array![1.0, 0.0, 0.0]),
            Err(InferenceError::GradientLengthMismatch { expected: 2, found: 3 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Named errors from an Fcn agree with inverting its Hessian directly.
    //
    // Given
    // -----
    // - Toy Fcn at θ = (0.5, 0.3); names from the amplitude; a one-name
    //   list.
    //
    // Expect
    // ------
    // - errors["a"], errors["b"] equal sqrt of the inverse Hessian diagonal.
    // - NameCountMismatch for the short name list.
    fn errors_from_fcn_match_direct_inverse() {
        // Arrange
        let model = Model::new(ToyAmplitude::new(0.5, 0.3), 1.0).unwrap();
        let data = vec![-0.8, -0.3, 0.1, 0.4, 0.6, 0.9, 0.95];
        let mut fcn = Fcn::new(model, data, None, grid(401), None, FcnOptions::default()).unwrap();
        let theta = array![0.5, 0.3];
        let names = fcn.param_names();
        let (_, _, h) = fcn.nll_grad_hessian(&theta).unwrap();
        let det = h[[0, 0]] * h[[1, 1]] - h[[0, 1]] * h[[1, 0]];

        // Act
        let out = calc_param_errors(&mut fcn, &theta, &names).unwrap();

        // Assert
        assert_relative_eq!(out.errors["a"], (h[[1, 1]] / det).abs().sqrt(), max_relative = 1e-9);
        assert_relative_eq!(out.errors["b"], (h[[0, 0]] / det).abs().sqrt(), max_relative = 1e-9);
        assert_eq!(
            calc_param_errors(&mut fcn, &theta, &names[..1]),
            Err(InferenceError::NameCountMismatch { expected: 2, found: 1 })
        );
    }
}
