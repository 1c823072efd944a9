//! Error types for the callscout library

use thiserror::Error;

/// Result type alias for callscout operations
pub type Result<T> = std::result::Result<T, CallscoutError>;

/// Errors that can occur while harvesting call-site examples
#[derive(Debug, Error)]
pub enum CallscoutError {
    /// Exactly one of class or function must be given as the target symbol
    #[error("Exactly one of class or function must be specified as the search target")]
    InvalidTarget,
    /// No file extensions are registered for the requested language
    #[error("Unknown language '{0}': no file extensions registered")]
    UnknownLanguage(String),
    /// The repository search index was unreachable or returned malformed data
    #[error("Discovery error: {0}")]
    Discovery(String),
    /// Failed to download an archive or query the search index
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    /// Failed to extract a repository archive
    #[error("Extraction error: {0}")]
    Extraction(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Other error
    #[error("Error: {0}")]
    Other(String),
}
