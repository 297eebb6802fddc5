//! Error Types for Insights

use riskit_core::{GenerationError, UseCase};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InsightError>;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider output could not be turned into the expected result
    #[error("SYNTHESIS_FAILED: could not synthesize {use_case} result: {reason}")]
    Synthesis { use_case: UseCase, reason: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl InsightError {
    pub fn synthesis(use_case: UseCase, reason: impl ToString) -> Self {
        Self::Synthesis {
            use_case,
            reason: reason.to_string(),
        }
    }

    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_retryable(),
            Self::Synthesis { .. } => true,
            Self::InvalidInput(_) => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Synthesis { use_case, .. } => {
                format!("The {use_case} result could not be synthesized. Please retry.")
            }
            Self::Generation(e) => e.user_message(),
        }
    }
}
