//! jsref SDK - foreign-runtime contract
//!
//! This crate defines what the bridge needs from a JavaScript runtime that is
//! only reachable across an ABI boundary, without depending on the bridge:
//!
//! - [`RawHandle`]: identity of a foreign slot
//! - [`JsHandle`]: an owning reference on a slot, released exactly once
//! - [`JsRuntime`]: the foreign-call primitives a host implements
//! - [`AbiError`]: failures of those calls
//!
//! With the `mock` feature, [`mock::MockRuntime`] provides an in-memory heap
//! implementing [`JsRuntime`].

#![warn(missing_docs)]

pub mod error;
pub mod handle;
pub mod runtime;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AbiError, AbiResult};
pub use handle::{JsHandle, RawHandle};
pub use runtime::JsRuntime;
