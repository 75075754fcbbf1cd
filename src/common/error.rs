//! Error types for the functional test runner
//!
//! Error messages are meant to be read by whoever is staring at a failed
//! CI job, so they name the case or file involved and hint at a fix.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    // === Case Errors ===
    #[error("Test case '{id}' not found. Searched: {searched}")]
    CaseNotFound { id: String, searched: String },

    #[error("Invalid test case '{id}': {reason}")]
    InvalidCase { id: String, reason: String },

    #[error("{reason}")]
    CaseAborted { id: String, reason: String },

    #[error("Test case '{name}' failed: {reason}")]
    CaseFailed { name: String, reason: String },

    // === Scheduler Errors ===
    #[error("Test case '{name}' timed out after {ticks} ticks")]
    Timeout { name: String, ticks: u64 },

    #[error("Tick clock stopped before the run reached a terminal state")]
    ClockStopped,

    // === Remote Service Errors ===
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path}: expected status {expected}, got {actual}")]
    UnexpectedStatus {
        method: String,
        path: String,
        expected: u16,
        actual: u16,
    },

    #[error("Event stream closed while waiting for {0}")]
    EventStreamClosed(String),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    #[error("Step {step} ({action}) failed: {reason}")]
    StepFailed {
        step: usize,
        action: String,
        reason: String,
    },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a case not found error with the locations that were searched
    pub fn case_not_found<S: AsRef<str>>(id: &str, searched: &[S]) -> Self {
        Self::CaseNotFound {
            id: id.to_string(),
            searched: searched
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create an invalid case error
    pub fn invalid_case(id: &str, reason: impl ToString) -> Self {
        Self::InvalidCase {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid endpoint error
    pub fn invalid_endpoint(endpoint: &str, reason: impl ToString) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means a configured case could not be resolved
    pub fn is_case_not_found(&self) -> bool {
        matches!(self, Self::CaseNotFound { .. })
    }
}
