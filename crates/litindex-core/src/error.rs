use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Date format error in '{field}': '{value}' is neither YYYY nor YYYY-MM-DD")]
    DateFormat { field: String, value: String },

    #[error("Value for '{field}' does not fit its {treatment} treatment")]
    ValueMismatch { field: String, treatment: &'static str },

    #[error("Store unavailable at {}: {reason}", .store.display())]
    StoreUnavailable { store: PathBuf, reason: String },

    #[error("Schema mismatch at {}: {reason}", .store.display())]
    SchemaMismatch { store: PathBuf, reason: String },

    #[error("Dataset error in {}: {reason}", .path.display())]
    Dataset { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Row-level errors skip one record; everything else aborts the batch.
    pub fn is_row_level(&self) -> bool {
        matches!(self, Error::UnknownField(_) | Error::DateFormat { .. } | Error::ValueMismatch { .. })
    }

    pub fn store_unavailable(store: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::StoreUnavailable { store: store.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
