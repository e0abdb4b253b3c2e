//! Custom error types for the simulated speed test pipeline.
//!
//! This module provides user-friendly error types that wrap underlying
//! errors with clear, actionable messages.

use std::error::Error;
use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpeedTestError>;

/// Exit codes for the application.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// History persistence failed (read/write/quota).
    pub const STORAGE_ERROR: i32 = 1;
    /// Configuration error (invalid arguments, bad paths).
    pub const CONFIG_ERROR: i32 = 2;
    /// A delete was requested for a position outside the history bounds.
    pub const INVALID_INDEX: i32 = 3;
    /// A simulated run failed or was interrupted before completion.
    pub const RUN_FAILURE: i32 = 4;
    /// Unknown/unexpected error.
    pub const UNKNOWN_ERROR: i32 = 99;
}

/// Categories of errors that can occur in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The history blob could not be read or written.
    Storage,
    /// A history position outside the current bounds was requested.
    InvalidIndex,
    /// A run was started while another run is active.
    RunActive,
    /// An in-progress run hit an unexpected fault.
    RunFailed,
    /// Invalid configuration or arguments.
    Config,
    /// Unknown or unexpected errors.
    Unknown,
}

impl ErrorKind {
    /// Get the exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Storage => exit_codes::STORAGE_ERROR,
            ErrorKind::InvalidIndex => exit_codes::INVALID_INDEX,
            ErrorKind::RunActive => exit_codes::SUCCESS,
            ErrorKind::RunFailed => exit_codes::RUN_FAILURE,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            ErrorKind::Unknown => exit_codes::UNKNOWN_ERROR,
        }
    }

    /// Get a user-friendly description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Storage => "History storage error",
            ErrorKind::InvalidIndex => "Invalid history position",
            ErrorKind::RunActive => "Test already running",
            ErrorKind::RunFailed => "Test run failed",
            ErrorKind::Config => "Configuration error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

/// A user-friendly error type for pipeline operations.
#[derive(Debug)]
pub struct SpeedTestError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// User-friendly error message.
    pub message: String,
    /// Optional suggestion for how to resolve the error.
    pub suggestion: Option<String>,
    /// The underlying error, if any.
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl SpeedTestError {
    /// Create a new SpeedTestError.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    /// Add a suggestion for how to resolve the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add the underlying error source.
    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message).with_suggestion(
            "Check that the history file is writable and the disk has space.",
        )
    }

    /// Create an invalid-index error.
    pub fn invalid_index(position: usize, len: usize) -> Self {
        Self::new(
            ErrorKind::InvalidIndex,
            format!(
                "position {} is out of bounds for a history of {} records",
                position, len
            ),
        )
        .with_suggestion("List the history again to see current positions.")
    }

    /// Create a run-active error.
    pub fn run_active() -> Self {
        Self::new(
            ErrorKind::RunActive,
            "a speed test is already in progress",
        )
        .with_suggestion("Wait for the current run to finish.")
    }

    /// Create a run-failure error.
    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RunFailed, message)
            .with_suggestion("Start a new run to retry.")
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }
}

impl fmt::Display for SpeedTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for SpeedTestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Format an error for user display.
///
/// This function creates a user-friendly error message that includes
/// the error description and any available suggestions.
pub fn format_error_for_display(error: &SpeedTestError) -> String {
    let mut output = format!("Error: {}", error.message);

    if let Some(ref suggestion) = error.suggestion {
        output.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_exit_codes() {
        assert_eq!(ErrorKind::Storage.exit_code(), exit_codes::STORAGE_ERROR);
        assert_eq!(
            ErrorKind::InvalidIndex.exit_code(),
            exit_codes::INVALID_INDEX
        );
        assert_eq!(ErrorKind::RunActive.exit_code(), exit_codes::SUCCESS);
        assert_eq!(ErrorKind::RunFailed.exit_code(), exit_codes::RUN_FAILURE);
        assert_eq!(ErrorKind::Config.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_speed_test_error_display() {
        let error = SpeedTestError::storage("failed to write history")
            .with_suggestion("Check file permissions.");

        let display = format!("{}", error);
        assert!(display.contains("History storage error"));
        assert!(display.contains("failed to write history"));
        assert!(display.contains("Suggestion"));
    }

    #[test]
    fn test_invalid_index_message() {
        let error = SpeedTestError::invalid_index(7, 3);
        assert_eq!(error.kind, ErrorKind::InvalidIndex);
        assert!(error.message.contains("position 7"));
        assert!(error.message.contains("3 records"));
    }

    #[test]
    fn test_run_active_is_non_fatal() {
        let error = SpeedTestError::run_active();
        assert_eq!(error.kind, ErrorKind::RunActive);
        assert_eq!(error.exit_code(), exit_codes::SUCCESS);
    }

    #[test]
    fn test_with_source_preserves_chain() {
        let io = std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        );
        let error = SpeedTestError::storage("write failed").with_source(io);
        assert!(error.source.is_some());
        assert!(Error::source(&error).is_some());
    }

    #[test]
    fn test_format_error_for_display() {
        let error = SpeedTestError::run_failed("phase interrupted");
        let output = format_error_for_display(&error);
        assert!(output.starts_with("Error: phase interrupted"));
        assert!(output.contains("Suggestion"));
    }
}
