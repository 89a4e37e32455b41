//! JsRuntime trait — foreign-call primitives
//!
//! The bridge never talks to a JavaScript engine directly. Hosts implement
//! this trait over whatever ABI reaches the engine (a wasm import table, a
//! C shim, an in-process engine) and hand it to the bridge as
//! `Arc<dyn JsRuntime>`.

use crate::error::AbiResult;
use crate::handle::RawHandle;

/// Synchronous access to the foreign JavaScript runtime.
///
/// Every `RawHandle` passed in or returned represents one reference on a
/// foreign slot. A returned handle is owned by the caller and must be given
/// back with [`JsRuntime::release`] exactly once; `JsHandle` does that on drop.
///
/// Implementations are called from arbitrary threads, including whichever
/// thread drops the last reference to a proxy.
pub trait JsRuntime: Send + Sync {
    // ========================================================================
    // Type Tests
    // ========================================================================

    /// Whether the value is an object in the runtime's sense
    fn is_object(&self, handle: RawHandle) -> bool;

    /// Whether the value is `null`
    fn is_null(&self, handle: RawHandle) -> bool;

    /// Whether the value is `undefined`
    fn is_undefined(&self, handle: RawHandle) -> bool;

    // ========================================================================
    // Property Access
    // ========================================================================

    /// Read `handle[name]`. Returns a new owned reference; a missing
    /// property yields a reference to `undefined`, not an error.
    fn get_property(&self, handle: RawHandle, name: &str) -> AbiResult<RawHandle>;

    // ========================================================================
    // Scalar Reads
    // ========================================================================

    /// Read a string value (or the payload of a boxed string)
    fn read_string(&self, handle: RawHandle) -> AbiResult<String>;

    /// Read a number value (or the payload of a boxed number)
    fn read_number(&self, handle: RawHandle) -> AbiResult<f64>;

    /// Read a boolean value (or the payload of a boxed boolean)
    fn read_bool(&self, handle: RawHandle) -> AbiResult<bool>;

    // ========================================================================
    // Slot Lifetime
    // ========================================================================

    /// Allocate a brand-new foreign slot and return an owned reference to it
    fn new_ref(&self) -> AbiResult<RawHandle>;

    /// Drop one reference on a slot
    fn release(&self, handle: RawHandle);
}
