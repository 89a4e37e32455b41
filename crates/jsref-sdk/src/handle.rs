//! Foreign handles
//!
//! A [`RawHandle`] is the identity of a foreign slot as reported by the
//! runtime. A [`JsHandle`] owns one reference on that slot and gives it back
//! when dropped or closed.

use std::fmt;
use std::sync::Arc;

use crate::error::{AbiError, AbiResult};
use crate::runtime::JsRuntime;

// ============================================================================
// RawHandle
// ============================================================================

/// Raw identity of a foreign slot.
///
/// Two references to the same foreign value carry the same raw handle; the
/// bridge keys its registry on it.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(u64);

impl RawHandle {
    /// The null sentinel. A handle with this value is invalid.
    pub const NULL: RawHandle = RawHandle(0);

    /// Wrap a raw value issued by the runtime
    pub const fn new(raw: u64) -> Self {
        RawHandle(raw)
    }

    /// The raw value
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the null sentinel
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.0)
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

// ============================================================================
// JsHandle
// ============================================================================

/// Owning reference to a foreign value.
///
/// States:
/// - valid: foreign calls go through to the runtime
/// - invalid: the raw value is [`RawHandle::NULL`]; nothing to release
/// - closed: released early with [`JsHandle::close`]; calls fail immediately
///
/// The reference is released exactly once, on close or on drop, whichever
/// comes first.
pub struct JsHandle {
    raw: RawHandle,
    closed: bool,
    runtime: Arc<dyn JsRuntime>,
}

impl JsHandle {
    /// Take ownership of one reference on `raw`.
    pub fn from_raw(runtime: Arc<dyn JsRuntime>, raw: RawHandle) -> Self {
        Self {
            raw,
            closed: false,
            runtime,
        }
    }

    /// Allocate a brand-new foreign slot.
    pub fn new_ref(runtime: Arc<dyn JsRuntime>) -> AbiResult<Self> {
        let raw = runtime.new_ref()?;
        Ok(Self::from_raw(runtime, raw))
    }

    /// Raw identity of the referenced slot
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The runtime this handle belongs to
    pub fn runtime(&self) -> &Arc<dyn JsRuntime> {
        &self.runtime
    }

    /// Whether the handle holds the null sentinel
    pub fn is_invalid(&self) -> bool {
        self.raw.is_null()
    }

    /// Whether the handle was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Return the raw handle if foreign calls are allowed on it.
    pub fn check(&self) -> AbiResult<RawHandle> {
        if self.closed {
            Err(AbiError::ClosedHandle(self.raw))
        } else if self.raw.is_null() {
            Err(AbiError::InvalidHandle)
        } else {
            Ok(self.raw)
        }
    }

    /// Release the reference now. Idempotent.
    pub fn close(&mut self) {
        if !self.closed && !self.raw.is_null() {
            tracing::trace!(raw = %self.raw, "closing foreign handle");
            self.runtime.release(self.raw);
        }
        self.closed = true;
    }

    /// Give up ownership without releasing; the caller now owns the reference.
    pub fn into_raw(mut self) -> RawHandle {
        self.closed = true;
        self.raw
    }

    // ========================================================================
    // Foreign Calls
    // ========================================================================

    /// Whether the value is an object
    pub fn is_object(&self) -> AbiResult<bool> {
        let raw = self.check()?;
        Ok(self.runtime.is_object(raw))
    }

    /// Whether the value is `null`
    pub fn is_null(&self) -> AbiResult<bool> {
        let raw = self.check()?;
        Ok(self.runtime.is_null(raw))
    }

    /// Whether the value is `undefined`
    pub fn is_undefined(&self) -> AbiResult<bool> {
        let raw = self.check()?;
        Ok(self.runtime.is_undefined(raw))
    }

    /// Whether the value is `null` or `undefined`
    pub fn is_nullish(&self) -> AbiResult<bool> {
        let raw = self.check()?;
        Ok(self.runtime.is_undefined(raw) || self.runtime.is_null(raw))
    }

    /// Read `self[name]` as a new owned handle
    pub fn get_property(&self, name: &str) -> AbiResult<JsHandle> {
        let raw = self.check()?;
        let value = self.runtime.get_property(raw, name)?;
        Ok(JsHandle::from_raw(Arc::clone(&self.runtime), value))
    }

    /// Read the value as a string
    pub fn read_string(&self) -> AbiResult<String> {
        let raw = self.check()?;
        self.runtime.read_string(raw)
    }

    /// Read the value as a number
    pub fn read_number(&self) -> AbiResult<f64> {
        let raw = self.check()?;
        self.runtime.read_number(raw)
    }

    /// Read the value as a boolean
    pub fn read_bool(&self) -> AbiResult<bool> {
        let raw = self.check()?;
        self.runtime.read_bool(raw)
    }
}

impl Drop for JsHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for JsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsHandle")
            .field("raw", &self.raw)
            .field("closed", &self.closed)
            .finish()
    }
}
