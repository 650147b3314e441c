//! Failure kinds of the model lifecycle.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Shape mismatch, too few samples or non-finite values.
    #[error("{0}")]
    InvalidInput(String),

    /// Fitting is mathematically undefined for the given samples.
    #[error("{0}")]
    DegenerateInput(String),

    #[error("Model not trained yet. Please train the model first.")]
    NotTrained,

    #[error("failed to store the model record")]
    StorageError(#[source] io::Error),

    #[error("the stored model record is corrupt: {0}")]
    CorruptRecord(String),

    #[error("no stored model record")]
    NotFound,
}

impl ModelError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateInput(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptRecord(message.into())
    }

    /// Stable identifier of the failure kind.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::DegenerateInput(_) => "degenerate_input",
            Self::NotTrained => "not_trained",
            Self::StorageError(_) => "storage_error",
            Self::CorruptRecord(_) => "corrupt_record",
            Self::NotFound => "not_found",
        }
    }
}
