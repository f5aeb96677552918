//! Unified error handling for post-fit inference.
//!
//! `InferenceError` covers malformed Hessians handed to the error-matrix
//! builder, length mismatches between parameters, names and gradients,
//! amplitudes unfit for fit fractions, bad significance inputs, and
//! failures of the likelihood while the Hessian is evaluated. An alias
//! `InferenceResult<T>` standardizes the return type across inference code.
use crate::likelihood::errors::LikelihoodError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Hessian ----
    /// Hessian is not square.
    NonSquareHessian {
        rows: usize,
        cols: usize,
    },

    /// Hessian has a NaN or infinite entry.
    NonFiniteHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Dimensions ----
    /// Gradient passed to error propagation has the wrong length.
    GradientLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Number of parameter names differs from the number of parameters.
    NameCountMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Fit fractions ----
    /// Amplitude names no resonances.
    NoResonances,

    /// Normalization integral of the full intensity is not finite and
    /// positive.
    NonPositiveIntegral {
        value: f64,
    },

    // ---- Significance ----
    /// NLL difference is not finite or the degrees of freedom are zero.
    InvalidSignificance {
        delta_nll: f64,
        ndf: usize,
    },

    // ---- Likelihood ----
    Likelihood(LikelihoodError),

    // ---- Anyhow catchall ----
    Anyhow(String),

    // ---- Fallback ----
    UnknownError,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<anyhow::Error> for InferenceError {
    fn from(err: anyhow::Error) -> Self {
        InferenceError::Anyhow(err.to_string())
    }
}

impl From<LikelihoodError> for InferenceError {
    fn from(err: LikelihoodError) -> Self {
        InferenceError::Likelihood(err)
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Hessian ----
            InferenceError::NonSquareHessian { rows, cols } => {
                write!(f, "Inference Error: Hessian must be square, got {rows}x{cols}")
            }
            InferenceError::NonFiniteHessian { row, col, value } => write!(
                f,
                "Inference Error: Hessian entry ({row}, {col}) is not finite ({value})"
            ),

            // ---- Dimensions ----
            InferenceError::GradientLengthMismatch { expected, found } => write!(
                f,
                "Inference Error: Gradient length {found} does not match {expected} parameters"
            ),
            InferenceError::NameCountMismatch { expected, found } => write!(
                f,
                "Inference Error: {found} parameter names given for {expected} parameters"
            ),

            // ---- Fit fractions ----
            InferenceError::NoResonances => {
                write!(f, "Inference Error: amplitude has no resonances for fit fractions")
            }
            InferenceError::NonPositiveIntegral { value } => write!(
                f,
                "Inference Error: normalization integral {value} must be finite and positive"
            ),

            // ---- Significance ----
            InferenceError::InvalidSignificance { delta_nll, ndf } => write!(
                f,
                "Inference Error: significance needs a finite NLL difference and ndf > 0, \
                 got {delta_nll} and {ndf}"
            ),

            // ---- Likelihood ----
            InferenceError::Likelihood(err) => write!(f, "Inference Error: {err}"),

            // ---- Anyhow catchall ----
            InferenceError::Anyhow(msg) => write!(f, "Inference Error: {}", msg),

            // ---- Fallback ----
            InferenceError::UnknownError => write!(f, "Inference Error: Unknown error occurred"),
        }
    }
}
