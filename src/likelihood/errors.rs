//! Error surface for the likelihood engine.
//!
//! Variants fall into three groups: shape contracts broken by an
//! [`Amplitude`](crate::likelihood::Amplitude) implementation, inconsistent
//! datasets or options handed to [`Fcn`](crate::likelihood::Fcn) /
//! [`CombineFcn`](crate::likelihood::CombineFcn), and derivative orders the
//! amplitude does not provide. Numerical problems inside a well-formed
//! evaluation (NaN from degenerate parameters) are not masked and do not
//! produce errors here.

/// Result alias for likelihood evaluation.
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Amplitude contract ----
    /// Per-event values do not match the number of events passed in.
    ValueLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Per-event gradient block is not `n_events × n_params`.
    GradientShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Per-event Hessian block is not `n_events × n_params × n_params`.
    HessianShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    /// Parameter vector length differs from the number of trainable
    /// parameters.
    ParamLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Name does not refer to a trainable parameter.
    UnknownParameter {
        name: String,
    },

    /// Amplitude provides no per-event gradient.
    GradientNotImplemented,

    /// Amplitude provides no per-event Hessian.
    HessianNotImplemented,

    /// Amplitude cannot evaluate a subset of its resonances.
    PartialNotImplemented,

    // ---- Data ----
    /// Weight vector length differs from the number of events.
    WeightLengthMismatch {
        events: usize,
        weights: usize,
    },

    /// The normalization sample must hold at least one event.
    EmptyMcSample,

    /// Alpha rescaling needs a non-zero sum of squared weights.
    DegenerateWeights {
        sum_sq: f64,
    },

    // ---- Options ----
    /// Batch size must be at least one.
    InvalidBatchSize {
        batch: usize,
    },

    /// Background weight must be finite.
    InvalidBackgroundWeight {
        value: f64,
    },

    /// Gaussian constraint width must be finite and positive.
    InvalidConstraint {
        name: String,
        sigma: f64,
    },

    /// Gradient-check settings must be finite and positive.
    InvalidCheckOption {
        name: &'static str,
        value: f64,
    },

    // ---- Combination ----
    /// A combined likelihood needs at least one member.
    EmptyCombination,

    /// Combined members must agree on the parameter count.
    ParamCountMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Finite differences ----
    /// Finite-difference Hessian fallback failed.
    FiniteDiff {
        text: String,
    },
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Amplitude contract ----
            LikelihoodError::ValueLengthMismatch { expected, found } => {
                write!(f, "Amplitude value length mismatch: expected {expected}, found {found}")
            }
            LikelihoodError::GradientShapeMismatch { expected, found } => {
                write!(f, "Amplitude gradient shape mismatch: expected {expected:?}, got {found:?}")
            }
            LikelihoodError::HessianShapeMismatch { expected, found } => {
                write!(f, "Amplitude Hessian shape mismatch: expected {expected:?}, got {found:?}")
            }
            LikelihoodError::ParamLengthMismatch { expected, found } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, found {found}")
            }
            LikelihoodError::UnknownParameter { name } => {
                write!(f, "Unknown parameter '{name}'")
            }
            LikelihoodError::GradientNotImplemented => {
                write!(f, "Amplitude gradient not implemented")
            }
            LikelihoodError::HessianNotImplemented => {
                write!(f, "Amplitude Hessian not implemented")
            }
            LikelihoodError::PartialNotImplemented => {
                write!(f, "Amplitude does not evaluate resonance subsets")
            }

            // ---- Data ----
            LikelihoodError::WeightLengthMismatch { events, weights } => {
                write!(f, "Weight length mismatch: {events} events, {weights} weights")
            }
            LikelihoodError::EmptyMcSample => write!(f, "Normalization sample is empty"),
            LikelihoodError::DegenerateWeights { sum_sq } => {
                write!(f, "Cannot rescale weights: sum of squared weights is {sum_sq}")
            }

            // ---- Options ----
            LikelihoodError::InvalidBatchSize { batch } => {
                write!(f, "Invalid batch size {batch}: must be at least 1")
            }
            LikelihoodError::InvalidBackgroundWeight { value } => {
                write!(f, "Invalid background weight {value}: must be finite")
            }
            LikelihoodError::InvalidConstraint { name, sigma } => {
                write!(f, "Invalid constraint on '{name}': sigma {sigma} must be finite and > 0")
            }
            LikelihoodError::InvalidCheckOption { name, value } => {
                write!(f, "Invalid gradient check option {name} = {value}: must be finite and > 0")
            }

            // ---- Combination ----
            LikelihoodError::EmptyCombination => {
                write!(f, "Combined likelihood has no members")
            }
            LikelihoodError::ParamCountMismatch { expected, found } => {
                write!(f, "Parameter count mismatch: expected {expected}, found {found}")
            }

            // ---- Finite differences ----
            LikelihoodError::FiniteDiff { text } => {
                write!(f, "Finite-difference Hessian failed: {text}")
            }
        }
    }
}
