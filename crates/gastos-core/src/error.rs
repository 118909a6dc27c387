//! Error types for Gastos

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error means a referenced record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error was caused by invalid input rather than the store
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
