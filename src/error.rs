//! Error types for the lending kiosk

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure while reading an ID card.
///
/// `NoEmployeeId` and `Device` are reported and the user is asked for
/// another tap. `Closed` means the reader is gone and ends the session.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no employee id on card: {0:?}")]
    NoEmployeeId(String),

    #[error("card reader failure: {0}")]
    Device(String),

    #[error("card reader stream closed")]
    Closed,
}

/// Failure resolving a scanned identity against the directory.
///
/// Every variant collapses to a user resolution failure outcome.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no such employee id: {0}")]
    NotFound(String),

    #[error("blank user code for employee {0}")]
    Blank(String),

    #[error("directory service error: {0}")]
    Service(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
