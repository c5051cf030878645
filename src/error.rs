//! Error module for the Rusty Neuro library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq, Clone)]
pub enum NeuroError {
    /// Error for out-of-range scalar parameters, e.g., a negative firing rate or a non-positive duration.
    InvalidParameter(String),
    /// Error for malformed arrays, e.g., an empty matrix, non-finite entries or mismatched dimensions.
    InvalidInput(String),
    /// Error for data that cannot be analyzed, e.g., a zero-variance column under normalization.
    DegenerateInput(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for NeuroError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NeuroError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            NeuroError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            NeuroError::DegenerateInput(e) => write!(f, "Degenerate input: {}", e),
            NeuroError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for NeuroError {}

impl From<std::io::Error> for NeuroError {
    fn from(e: std::io::Error) -> Self {
        NeuroError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for NeuroError {
    fn from(e: serde_json::Error) -> Self {
        NeuroError::IOError(e.to_string())
    }
}
