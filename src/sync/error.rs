//! Sync error types.

use crate::sync::phase::Phase;
use crate::sync::remote::RemoteError;

/// Errors converting between local rows and remote documents.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid local timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("remote timestamp out of range: {seconds}s {nanos}ns")]
    TimestampOutOfRange { seconds: i64, nanos: u32 },

    #[error("malformed document {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("document fields must serialize to an object")]
    NotAnObject,

    #[error("{0} has no remote key yet")]
    UnresolvedParent(&'static str),
}

/// Which side of the sync a problem was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

/// Errors that abort a `synchronize()` call.
///
/// Referential gaps and malformed remote documents are not errors; they
/// are recorded as skips in the sync report.
#[derive(Debug)]
pub enum SyncError {
    /// Local SQLite error
    Local(sqlx::Error),
    /// Remote store call failed or timed out
    Remote(RemoteError),
    /// Row/document conversion failed
    Convert(ConvertError),
    /// More than one shopping list exists on one side
    SingletonViolation { side: Side, count: usize },
    /// Cancelled before the given phase started
    Cancelled(Phase),
}

impl SyncError {
    /// True when retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Remote(e) => e.is_transient(),
            SyncError::Cancelled(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Local(e) => write!(f, "Local store error: {}", e),
            SyncError::Remote(e) => write!(f, "Remote store error: {}", e),
            SyncError::Convert(e) => write!(f, "Conversion error: {}", e),
            SyncError::SingletonViolation { side, count } => write!(
                f,
                "Found {} shopping lists in the {} store; expected at most one",
                count, side
            ),
            SyncError::Cancelled(phase) => write!(f, "Sync cancelled before {} phase", phase),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Local(e) => Some(e),
            SyncError::Remote(e) => Some(e),
            SyncError::Convert(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Local(e)
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        SyncError::Remote(e)
    }
}

impl From<ConvertError> for SyncError {
    fn from(e: ConvertError) -> Self {
        SyncError::Convert(e)
    }
}
