//! Error types for foreign-runtime calls

use crate::handle::RawHandle;

/// Result type for foreign-runtime calls
pub type AbiResult<T> = Result<T, AbiError>;

/// Failure of a single call across the runtime boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbiError {
    /// The handle is the null sentinel
    #[error("Invalid handle")]
    InvalidHandle,

    /// The handle was closed before the call
    #[error("Handle {0} is closed")]
    ClosedHandle(RawHandle),

    /// The runtime does not know this handle (never issued or already freed)
    #[error("Unknown handle {0}")]
    UnknownHandle(RawHandle),

    /// Scalar read of a value with a different runtime type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected runtime type
        expected: &'static str,
        /// Actual runtime type
        got: &'static str,
    },

    /// The runtime could not allocate a new slot
    #[error("Foreign runtime is out of memory")]
    OutOfMemory,

    /// The foreign side threw while servicing the call
    #[error("Foreign exception: {0}")]
    Exception(String),
}

impl From<String> for AbiError {
    fn from(s: String) -> Self {
        AbiError::Exception(s)
    }
}

impl From<&str> for AbiError {
    fn from(s: &str) -> Self {
        AbiError::Exception(s.to_string())
    }
}
