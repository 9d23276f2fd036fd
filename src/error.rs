//! Error types for css-scan operations.

use thiserror::Error;

/// Errors that can occur while inspecting, extracting or applying styles.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operator-supplied rule text has no `{ ... }` body.
    #[error("Invalid CSS: {0}")]
    Parse(String),

    /// Resolved style or geometry is unavailable for the target.
    #[error("Style resolution failed: {0}")]
    Resolution(String),

    /// A style change could not be written to the document.
    #[error("Could not apply style: {0}")]
    Mutation(String),

    /// A style source cannot be read (cross-origin or not loaded).
    #[error("Style source not accessible: {0}")]
    SourceAccess(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

pub type Result<T> = std::result::Result<T, Error>;
