//! Bridge error types

use jsref_sdk::{AbiError, RawHandle};

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failures surfaced to callers of the bridge.
///
/// `InvalidHandle` and `NullArgument` are usage errors: they point at a
/// lifetime bug in the caller and are never absorbed by the bridge.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// Acquisition attempted on a closed or null handle
    #[error("Trying to acquire an invalid handle ({raw}, closed: {closed})")]
    InvalidHandle {
        /// Raw value of the offending handle
        raw: RawHandle,
        /// Whether it was closed (as opposed to null)
        closed: bool,
    },

    /// A required argument was absent
    #[error("Argument `{argument}` must not be null")]
    NullArgument {
        /// Name of the argument
        argument: &'static str,
    },

    /// The proxy's class is not the requested class or a subclass of it
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        /// Requested class name
        expected: &'static str,
        /// Class of the proxy that was found or resolved
        found: &'static str,
    },

    /// A foreign call the bridge cannot recover from failed
    #[error(transparent)]
    Abi(#[from] AbiError),
}

impl BridgeError {
    /// Whether this error reports caller misuse rather than foreign state
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidHandle { .. } | BridgeError::NullArgument { .. }
        )
    }
}
