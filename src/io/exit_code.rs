//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - every candidate resolved without error diagnostics
//! - `1`: General error - unspecified failure
//! - `2`: Resolution errors - at least one triple failed
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::engine::RunReport;
use crate::error::MapError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Error diagnostics were reported (code 2)
    ResolutionErrors = 2,

    /// Named type not present in the metadata (code 3)
    NotFound = 3,

    /// Metadata document could not be parsed (code 4)
    ParseError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// `ResolutionErrors` when any error diagnostic was reported.
    ///
    /// Warnings never fail a run.
    pub fn from_report(report: &RunReport) -> Self {
        if report.has_errors() {
            ExitCode::ResolutionErrors
        } else {
            ExitCode::Success
        }
    }

    /// Convert a `MapError` to the appropriate exit code.
    pub fn from_error(error: &MapError) -> Self {
        match error {
            MapError::TypeNotFound { .. } => ExitCode::NotFound,
            MapError::MetadataParse { .. } | MapError::DuplicateType { .. } => {
                ExitCode::ParseError
            }
            MapError::FileRead { .. } | MapError::FileWrite { .. } => ExitCode::IoError,
            MapError::ConfigError { .. } => ExitCode::ConfigError,
            _ => ExitCode::GeneralError,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::ResolutionErrors => "Resolution reported errors",
            ExitCode::NotFound => "Not found",
            ExitCode::ParseError => "Parse error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}
