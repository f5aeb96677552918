//! inference::fit_fractions — resonance fit fractions and their errors.
//!
//! Purpose
//! -------
//! Split the fitted intensity into the share carried by each resonance and
//! by each pairwise interference, over the normalization sample of an
//! [`Fcn`], with errors propagated from the fit covariance.
//!
//! Key behaviors
//! -------------
//! - With `I_S` the normalization integral of the coherent sum over the
//!   resonance set `S`:
//!   - `FF_i = I_{i} / I_all`;
//!   - `FF_ixj = I_{i,j} / I_all − FF_i − FF_j` for `i > j`.
//! - Terms are listed resonance by resonance: `FF_i` first, then
//!   `FF_ixj` for `j = i−1, …, 0`. Interference terms are named
//!   `"{R_i}x{R_j}"`.
//! - For a coherent sum the terms add up to one.
//! - With an [`ErrorMatrix`], each term gets `sqrt(gᵀ C g)` where `g` is
//!   its gradient in `θ`, taken from `finitediff`'s central Jacobian of all
//!   terms at once.
//!
//! Invariants & assumptions
//! ------------------------
//! - Integrals reuse the `Fcn`'s normalization sample, its uniform weights
//!   and its value-pass batching.
//! - The amplitude is left at `theta_hat` on return, also on error.
use crate::{
    inference::{
        errors::{InferenceError, InferenceResult},
        hessian::ErrorMatrix,
    },
    likelihood::{fcn::Fcn, traits::Amplitude},
    optimization::nll_optimizer::types::Theta,
};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2};
use std::cell::RefCell;

/// One diagonal or interference term.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFraction {
    pub name: String,
    pub value: f64,
    /// `None` when no error matrix was supplied.
    pub error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitFractions {
    pub fractions: Vec<FitFraction>,
}

impl FitFractions {
    pub fn get(&self, name: &str) -> Option<&FitFraction> {
        self.fractions.iter().find(|f| f.name == name)
    }

    /// Sum over all terms; one for a coherent sum of the listed resonances.
    pub fn total(&self) -> f64 {
        self.fractions.iter().map(|f| f.value).sum()
    }
}

/// Fit fractions of the amplitude behind `fcn` at `theta_hat`.
///
/// # Errors
/// - [`InferenceError::NoResonances`] when the amplitude lists none.
/// - [`InferenceError::NonPositiveIntegral`] when the full intensity does
///   not integrate to a finite positive number.
/// - [`InferenceError::GradientLengthMismatch`] when `matrix` does not
///   match the number of parameters.
/// - [`InferenceError::Likelihood`] for parameter-length and amplitude
///   errors, including `PartialNotImplemented`.
pub fn fit_fractions<A: Amplitude>(
    fcn: &mut Fcn<A>, theta_hat: &Theta, matrix: Option<&ErrorMatrix>,
) -> InferenceResult<FitFractions> {
    let resonances = fcn.model().amplitude().resonances();
    if resonances.is_empty() {
        return Err(InferenceError::NoResonances);
    }
    let n_res = resonances.len();
    fcn.model_mut().set_params(theta_hat)?;
    let values = fraction_values(fcn, n_res)?;
    let jacobian = match matrix {
        Some(_) => {
            let jac = fraction_jacobian(fcn, theta_hat, n_res);
            fcn.model_mut().set_params(theta_hat)?;
            Some(jac?)
        }
        None => None,
    };

    let mut fractions = Vec::with_capacity(values.len());
    for (k, name) in fraction_names(&resonances).into_iter().enumerate() {
        let value = values[k];
        let error = match (matrix, &jacobian) {
            (Some(m), Some(jac)) => Some(m.propagate(&jac.column(k).to_owned())?),
            _ => None,
        };
        fractions.push(FitFraction { name, value, error });
    }
    log::info!("fit fractions: {} terms over {n_res} resonances", fractions.len());
    Ok(FitFractions { fractions })
}

// ---- Helper methods ----

fn fraction_names(resonances: &[String]) -> Vec<String> {
    let mut names = Vec::with_capacity(resonances.len() * (resonances.len() + 1) / 2);
    for (i, r_i) in resonances.iter().enumerate() {
        names.push(r_i.clone());
        for r_j in resonances[..i].iter().rev() {
            names.push(format!("{r_i}x{r_j}"));
        }
    }
    names
}

/// Terms in [`fraction_names`] order at the amplitude's current parameters.
fn fraction_values<A: Amplitude>(fcn: &Fcn<A>, n_res: usize) -> InferenceResult<Array1<f64>> {
    let all: Vec<usize> = (0..n_res).collect();
    let total = fcn.mc_partial_integral(&all)?;
    if !(total.is_finite() && total > 0.0) {
        return Err(InferenceError::NonPositiveIntegral { value: total });
    }
    let diag = (0..n_res)
        .map(|i| Ok(fcn.mc_partial_integral(&[i])? / total))
        .collect::<InferenceResult<Vec<f64>>>()?;
    let mut values = Vec::with_capacity(n_res * (n_res + 1) / 2);
    for i in 0..n_res {
        values.push(diag[i]);
        for j in (0..i).rev() {
            let pair = fcn.mc_partial_integral(&[i, j])? / total;
            values.push(pair - diag[i] - diag[j]);
        }
    }
    Ok(Array1::from(values))
}

/// `∂FF_k/∂θ_p` as a `n_params × n_terms` matrix.
fn fraction_jacobian<A: Amplitude>(
    fcn: &mut Fcn<A>, theta_hat: &Theta, n_res: usize,
) -> InferenceResult<Array2<f64>> {
    let n_terms = n_res * (n_res + 1) / 2;
    let closure_err: RefCell<Option<InferenceError>> = RefCell::new(None);
    let fcn = RefCell::new(fcn);
    let terms = |x: &Theta| -> Array1<f64> {
        let mut f = fcn.borrow_mut();
        let eval = f
            .model_mut()
            .set_params(x)
            .map_err(InferenceError::from)
            .and_then(|_| fraction_values(&**f, n_res));
        match eval {
            Ok(v) => v,
            Err(e) => {
                closure_err.borrow_mut().get_or_insert(e);
                Array1::from_elem(n_terms, f64::NAN)
            }
        }
    };
    let jac = theta_hat.central_jacobian(&terms);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::{
        errors::LikelihoodError,
        fcn::FcnOptions,
        model::Model,
        test_amplitude::{ToyAmplitude, grid},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Diagonal and interference terms against closed forms of the toy
    //   amplitude |1 + a x + i b x|².
    // - Errors propagated from a known covariance.
    // - Batch invariance of the terms and rejection of unfit amplitudes.
    // -------------------------------------------------------------------------

    const A: f64 = 0.5;
    const B: f64 = 0.3;

    /// Data on [-1, 1]; normalization sample on [0, 1] so that the `a`
    /// term interferes with the constant.
    fn toy_fcn(amp: ToyAmplitude, batch: usize) -> Fcn<ToyAmplitude> {
        let mc: Vec<f64> = grid(2001).into_iter().map(|x| 0.5 * (x + 1.0)).collect();
        let model = Model::new(amp, 0.0).unwrap();
        let opts = FcnOptions::new(batch, None, false, false).unwrap();
        Fcn::new(model, grid(101), None, mc, None, opts).unwrap()
    }

    /// Sample mean of `x^k` over the normalization sample.
    fn moment(fcn: &Fcn<ToyAmplitude>, k: i32) -> f64 {
        fcn.mc().iter().map(|x| x.powi(k)).sum::<f64>() / fcn.mc().len() as f64
    }

    #[test]
    // Purpose
    // -------
    // Terms match closed forms, are ordered resonance by resonance and add
    // up to one; without a matrix there are no errors.
    //
    // Given
    // -----
    // - a = 0.5, b = 0.3; m1, m2 the MC moments of x and x²;
    //   T = 1 + 2a m1 + (a² + b²) m2.
    //
    // Expect
    // ------
    // - Names [one, a, axone, b, bxa, bxone].
    // - one = 1/T, a = a² m2/T, b = b² m2/T, axone = 2a m1/T and zero for
    //   the terms with b (orthogonal phase).
    // - total() = 1; every error is None.
    fn fractions_match_closed_forms() {
        // Arrange
        let mut fcn = toy_fcn(ToyAmplitude::new(0.0, 0.0), 64);
        let (m1, m2) = (moment(&fcn, 1), moment(&fcn, 2));
        let t = 1.0 + 2.0 * A * m1 + (A * A + B * B) * m2;

        // Act
        let ff = fit_fractions(&mut fcn, &array![A, B], None).unwrap();

        // Assert
        let names: Vec<&str> = ff.fractions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["one", "a", "axone", "b", "bxa", "bxone"]);
        let value = |name: &str| ff.get(name).unwrap().value;
        assert_relative_eq!(value("one"), 1.0 / t, max_relative = 1e-12);
        assert_relative_eq!(value("a"), A * A * m2 / t, max_relative = 1e-12);
        assert_relative_eq!(value("b"), B * B * m2 / t, max_relative = 1e-12);
        assert_relative_eq!(value("axone"), 2.0 * A * m1 / t, max_relative = 1e-12);
        assert!(value("bxa").abs() < 1e-12 && value("bxone").abs() < 1e-12);
        assert_relative_eq!(ff.total(), 1.0, epsilon = 1e-12);
        assert!(ff.fractions.iter().all(|f| f.error.is_none()));
        assert_eq!(fcn.model().params(), array![A, B]);
    }

    #[test]
    // Purpose
    // -------
    // Errors are the covariance propagated through the analytic gradient of
    // each term, and the batch size does not change the terms.
    //
    // Given
    // -----
    // - Covariance C = H⁻¹ for H = [[400, 100], [100, 200]].
    // - FF_b = b² m2 / T with ∂/∂a = −b² m2 (2 m1 + 2a m2) / T² and
    //   ∂/∂b = 2b m2 (T − b² m2) / T².
    // - Batches 64 and 5000.
    //
    // Expect
    // ------
    // - error(b) = sqrt(gᵀ C g) to 1e-6 relative.
    // - Values agree across batches to 1e-12 relative.
    fn errors_follow_the_covariance() {
        // Arrange
        let h = array![[400.0, 100.0], [100.0, 200.0]];
        let matrix = ErrorMatrix::from_hessian(&h).unwrap();
        let mut small = toy_fcn(ToyAmplitude::new(0.0, 0.0), 64);
        let mut large = toy_fcn(ToyAmplitude::new(0.0, 0.0), 5000);
        let (m1, m2) = (moment(&small, 1), moment(&small, 2));
        let t = 1.0 + 2.0 * A * m1 + (A * A + B * B) * m2;
        let ff_b = B * B * m2;
        let g = array![
            -ff_b * (2.0 * m1 + 2.0 * A * m2) / (t * t),
            2.0 * B * m2 * (t - ff_b) / (t * t)
        ];

        // Act
        let with_errors = fit_fractions(&mut small, &array![A, B], Some(&matrix)).unwrap();
        let other_batch = fit_fractions(&mut large, &array![A, B], None).unwrap();

        // Assert
        let expected = matrix.propagate(&g).unwrap();
        let error_b = with_errors.get("b").unwrap().error.unwrap();
        assert_relative_eq!(error_b, expected, max_relative = 1e-6);
        assert!(with_errors.fractions.iter().all(|f| f.error.is_some_and(f64::is_finite)));
        for (x, y) in with_errors.fractions.iter().zip(&other_batch.fractions) {
            assert_relative_eq!(x.value, y.value, max_relative = 1e-12, epsilon = 1e-15);
        }
        assert_eq!(small.model().params(), array![A, B]);
    }

    #[test]
    // Purpose
    // -------
    // Amplitudes that cannot be split, and mismatched matrices, are
    // rejected.
    //
    // Given
    // -----
    // - The toy amplitude without subset support.
    // - A 3x3 error matrix for two parameters.
    //
    // Expect
    // ------
    // - Likelihood(PartialNotImplemented); GradientLengthMismatch.
    fn unfit_inputs_are_rejected() {
        // Arrange
        let mut no_partial = toy_fcn(ToyAmplitude::new(0.0, 0.0).without_partial(), 64);
        let mut fcn = toy_fcn(ToyAmplitude::new(0.0, 0.0), 64);
        let matrix = ErrorMatrix::from_hessian(&Array2::eye(3)).unwrap();

        // Act
        let missing = fit_fractions(&mut no_partial, &array![A, B], None);
        let mismatched = fit_fractions(&mut fcn, &array![A, B], Some(&matrix));

        // Assert
        assert_eq!(
            missing,
            Err(InferenceError::Likelihood(LikelihoodError::PartialNotImplemented))
        );
        assert!(matches!(
            mismatched,
            Err(InferenceError::GradientLengthMismatch { expected: 3, found: 2 })
        ));
    }
}
