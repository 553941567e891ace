//! Error types for the vision bridge.
//!
//! Every failure that can cross the bridge boundary is a [`BridgeError`], so
//! the host decides per call whether a failure is recoverable.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the bridge.
///
/// All errors are serializable so a host front end can forward them as-is.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum BridgeError {
    /// Handle id is unknown, malformed, or was invalidated by a clear
    #[error("Lookup error: no stored object for handle '{0}'")]
    Lookup(String),

    /// Handle resolves to an object of another kind
    #[error("Type mismatch for handle '{handle}': expected {expected}, found {found}")]
    TypeMismatch {
        handle: String,
        expected: String,
        found: String,
    },

    /// Ingested data is inconsistent with its declared shape or cannot be decoded
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Verb is not part of the dispatch vocabulary
    #[error("Unknown verb: {0}")]
    UnknownVerb(String),

    /// Positional argument is missing or has the wrong shape
    #[error("Argument error in '{verb}' at position {position}: expected {expected}")]
    Argument {
        verb: String,
        position: usize,
        expected: String,
    },

    /// Native operation rejected its inputs; OpenCV exceptions land here
    #[error("Processing error: {0}")]
    Processing(String),

    /// Store refused to allocate another slot
    #[error("Store capacity of {0} objects exhausted")]
    Capacity(usize),

    /// Worker front end failed to schedule or finish a call
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Convenience result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

// Helper methods for error creation
impl BridgeError {
    pub fn lookup<T: Into<String>>(handle: T) -> Self {
        Self::Lookup(handle.into())
    }

    pub fn type_mismatch(
        handle: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            handle: handle.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        Self::UnsupportedInput(msg.into())
    }

    pub fn argument(verb: impl Into<String>, position: usize, expected: impl Into<String>) -> Self {
        Self::Argument {
            verb: verb.into(),
            position,
            expected: expected.into(),
        }
    }

    pub fn processing<T: Into<String>>(msg: T) -> Self {
        Self::Processing(msg.into())
    }

    pub fn worker<T: Into<String>>(msg: T) -> Self {
        Self::Worker(msg.into())
    }

    /// Whether the failure came from resolving a handle.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

impl From<tokio::sync::AcquireError> for BridgeError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        Self::Worker(format!("Failed to acquire worker: {}", err))
    }
}

impl From<tokio::task::JoinError> for BridgeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(format!("Call panicked: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for BridgeError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Worker("Bridge state is corrupted".to_string())
    }
}

impl From<opencv::Error> for BridgeError {
    fn from(err: opencv::Error) -> Self {
        Self::Processing(format!("OpenCV error {}: {}", err.code, err.message))
    }
}

impl From<base64::DecodeError> for BridgeError {
    fn from(err: base64::DecodeError) -> Self {
        Self::UnsupportedInput(format!("Invalid base64 payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize_with_kind_tag() {
        let err = BridgeError::lookup("3:1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "lookup");
        assert_eq!(json["detail"], "3:1");
    }

    #[test]
    fn native_errors_become_processing_errors() {
        let err = BridgeError::from(opencv::Error::new(-215, "Assertion failed"));
        assert_eq!(err, BridgeError::processing("OpenCV error -215: Assertion failed"));
    }

    #[test]
    fn argument_error_names_position() {
        let err = BridgeError::argument("add", 2, "mat");
        assert_eq!(
            err.to_string(),
            "Argument error in 'add' at position 2: expected mat"
        );
    }
}
