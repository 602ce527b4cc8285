//! Error types for Homebrew operations.
//!
//! Every failure carries the invocation or record that caused it so the
//! caller can report exactly what was in progress.

use std::time::Duration;
use thiserror::Error;

/// Categories of Homebrew errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A recorded identifier could not be parsed
    MalformedRecord,
    /// The brew binary could not be launched
    Launch,
    /// brew ran and reported failure
    CommandFailed,
    /// brew did not finish in time
    Timeout,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedRecord => "Malformed state record",
            Self::Launch => "Homebrew could not be launched",
            Self::CommandFailed => "Homebrew command failed",
            Self::Timeout => "Homebrew command timed out",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::MalformedRecord => "Inspect the state file; records must look like group:name:version",
            Self::Launch => "Check the configured Homebrew root or install Homebrew from https://brew.sh",
            Self::CommandFailed => "Fix the reported problem and run again; completed steps are kept",
            Self::Timeout => "Raise the timeout or run the command by hand to see where it hangs",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during Homebrew operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Recorded identifier is not `group:name:version`
    #[error("malformed record '{record}': expected group:name:version")]
    MalformedRecord {
        /// The offending identifier
        record: String,
    },

    /// The process could not be started
    #[error("failed to execute `{invocation}`: {source}")]
    Spawn {
        /// Rendered command line
        invocation: String,
        /// Underlying launch error
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("`{invocation}` exited with {}", describe_code(.code))]
    ExitStatus {
        /// Rendered command line
        invocation: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// The process exceeded the configured timeout and was killed
    #[error("`{invocation}` timed out after {}s", .after.as_secs())]
    TimedOut {
        /// Rendered command line
        invocation: String,
        /// Configured limit
        after: Duration,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedRecord { .. } => ErrorCategory::MalformedRecord,
            Error::Spawn { .. } => ErrorCategory::Launch,
            Error::ExitStatus { .. } => ErrorCategory::CommandFailed,
            Error::TimedOut { .. } => ErrorCategory::Timeout,
            Error::Io(_) => ErrorCategory::Other,
        }
    }
}

/// Result type for Homebrew operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = Error::MalformedRecord {
            record: "foo".into(),
        };
        assert_eq!(err.category(), ErrorCategory::MalformedRecord);

        let err = Error::ExitStatus {
            invocation: "brew update".into(),
            code: Some(1),
        };
        assert_eq!(err.category(), ErrorCategory::CommandFailed);
    }

    #[test]
    fn test_exit_status_message() {
        let err = Error::ExitStatus {
            invocation: "brew install wget".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "`brew install wget` exited with status 1");

        let err = Error::ExitStatus {
            invocation: "brew upgrade".into(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_timed_out_message() {
        let err = Error::TimedOut {
            invocation: "brew update".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "`brew update` timed out after 30s");
    }
}
