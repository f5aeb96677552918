//! optimization::errors — failures of an NLL minimization.
//!
//! Four groups:
//! - option validation (`InvalidOption`, `NoStoppingRule`,
//!   `UnknownLineSearch`);
//! - bad values met while evaluating the likelihood (`NonFiniteCost`,
//!   gradient and Hessian shape or finiteness);
//! - fit-level conditions (`FitDiverged`, `NoEstimate`, wrapped
//!   [`LikelihoodError`]s);
//! - `argmin` failures, folded into one [`OptError::Solver`] tagged with the
//!   kind of [`ArgminError`].
//!
//! An `OptError` raised inside an `argmin` callback is boxed into
//! `argmin::core::Error`; the `From` conversion below unboxes it unchanged.
use argmin::core::{ArgminError, Error};

use crate::{likelihood::errors::LikelihoodError, optimization::nll_optimizer::types::Theta};

pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Options ----
    /// A numeric option is non-finite or not strictly positive.
    InvalidOption {
        name: &'static str,
        value: f64,
    },
    /// No gradient tolerance, cost tolerance or iteration cap was given.
    NoStoppingRule,
    UnknownLineSearch {
        name: String,
    },

    // ---- Evaluation ----
    NonFiniteCost {
        value: f64,
    },
    GradientLength {
        expected: usize,
        found: usize,
    },
    NonFiniteGradient {
        index: usize,
        value: f64,
    },
    HessianShape {
        expected: usize,
        found: (usize, usize),
    },
    NonFiniteHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Fit ----
    /// `‖θ‖₁` left the allowed region; `last_good` is the last point with a
    /// finite NLL and is where a restart begins.
    FitDiverged {
        norm: f64,
        last_good: Theta,
    },
    /// The solver finished without a usable best point.
    NoEstimate {
        index: Option<usize>,
        value: f64,
    },
    Likelihood(LikelihoodError),

    // ---- Solver ----
    /// `argmin` failure; `kind` names the `ArgminError` variant, or
    /// `"backend"` for errors of other origin.
    Solver {
        kind: &'static str,
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::InvalidOption { name, value } => {
                write!(f, "Fit option `{name}` = {value} must be finite and positive")
            }
            OptError::NoStoppingRule => {
                write!(f, "Fit needs at least one of tol_grad, tol_cost or max_iter")
            }
            OptError::UnknownLineSearch { name } => {
                write!(f, "Unknown line search '{name}' (use 'MoreThuente' or 'HagerZhang')")
            }
            OptError::NonFiniteCost { value } => write!(f, "NLL is not finite: {value}"),
            OptError::GradientLength { expected, found } => {
                write!(f, "NLL gradient has {found} entries for {expected} parameters")
            }
            OptError::NonFiniteGradient { index, value } => {
                write!(f, "NLL gradient entry {index} is not finite: {value}")
            }
            OptError::HessianShape { expected, found } => {
                write!(f, "NLL Hessian is {found:?}, expected {expected}x{expected}")
            }
            OptError::NonFiniteHessian { row, col, value } => {
                write!(f, "NLL Hessian entry ({row}, {col}) is not finite: {value}")
            }
            OptError::FitDiverged { norm, .. } => {
                write!(f, "Fit diverged: parameter L1 norm {norm} exceeds the threshold")
            }
            OptError::NoEstimate { index: None, .. } => {
                write!(f, "Solver returned no best-fit parameters")
            }
            OptError::NoEstimate { index: Some(index), value } => {
                write!(f, "Best-fit parameter {index} is not finite: {value}")
            }
            OptError::Likelihood(err) => write!(f, "Likelihood error: {err}"),
            OptError::Solver { kind, text } => write!(f, "Solver error ({kind}): {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        let argmin_err = match err.downcast::<ArgminError>() {
            Ok(argmin_err) => argmin_err,
            Err(err) => return OptError::Solver { kind: "backend", text: err.to_string() },
        };
        let (kind, text) = match argmin_err {
            ArgminError::InvalidParameter { text } => ("invalid parameter", text),
            ArgminError::NotImplemented { text } => ("not implemented", text),
            ArgminError::NotInitialized { text } => ("not initialized", text),
            ArgminError::ConditionViolated { text } => ("condition violated", text),
            ArgminError::CheckpointNotFound { text } => ("checkpoint not found", text),
            ArgminError::PotentialBug { text } => ("potential bug", text),
            ArgminError::ImpossibleError { text } => ("impossible error", text),
            other => ("argmin", other.to_string()),
        };
        OptError::Solver { kind, text }
    }
}

impl From<LikelihoodError> for OptError {
    fn from(err: LikelihoodError) -> Self {
        OptError::Likelihood(err)
    }
}
