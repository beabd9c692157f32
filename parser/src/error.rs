//! Error types for status-dump parsing.
//!
//! Only connectivity failures abort a pass. Lines that look structural but
//! cannot be decoded are skipped and recorded in
//! [`ParseDiagnostics`](crate::ParseDiagnostics) instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the license server could not be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityFailure {
    /// The server host name could not be resolved.
    HostUnresolved,
    /// The server did not answer in time.
    TimedOut,
    /// The server refused the connection or is down.
    Unreachable,
}

impl std::fmt::Display for ConnectivityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostUnresolved => write!(f, "failed to resolve the server host"),
            Self::TimedOut => write!(f, "timed out while attempting to reach the license server"),
            Self::Unreachable => write!(f, "could not connect to the license server"),
        }
    }
}

/// Errors that abort a parse pass.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The dump reports that the license server could not be reached.
    #[error("license server unavailable: {reason} (line {line}: {text:?})")]
    Connectivity {
        reason: ConnectivityFailure,
        /// 1-based line number of the failure marker.
        line: usize,
        text: String,
    },
}

impl ParseError {
    /// Returns the connectivity failure reason, if this is one.
    pub fn connectivity(&self) -> Option<ConnectivityFailure> {
        match self {
            Self::Connectivity { reason, .. } => Some(*reason),
        }
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
