//! jsref - identity-stable proxies over foreign JavaScript handles
//!
//! Lets host code hold typed proxy objects for values owned by a JavaScript
//! runtime that is only reachable across an ABI boundary:
//!
//! - one live proxy per foreign value: acquiring the same value twice
//!   yields the same proxy ([`registry`])
//! - proxies are instantiated as the most specific known class, read from
//!   the value's `constructor.name` ([`Bridge::resolve_class`], [`table`])
//! - dropping the last reference finalizes the proxy and releases the
//!   foreign handle exactly once, even when a newer proxy already took over
//!   the same value ([`proxy`])
//! - callers can pin proxies the foreign side still needs ([`keep_alive`])
//!
//! # Example
//!
//! ```ignore
//! use jsref::{Bridge, JsNumber};
//!
//! let bridge = Bridge::new(runtime);
//! let n: JsNumber = bridge.acquire(bridge.handle(raw))?;
//! let again: JsNumber = bridge.acquire(bridge.handle(raw_again))?;
//! assert!(n.ptr_eq(&again));
//! ```

#![warn(missing_docs)]

pub mod bridge;
pub mod builtins;
pub mod class;
pub mod error;
pub mod keep_alive;
pub mod proxy;
pub mod registry;
mod resolver;
pub mod table;

pub use bridge::{Bridge, BridgeOptions};
pub use builtins::{JsBoolean, JsError, JsNumber, JsString, BOOLEAN, ERROR, NUMBER, STRING};
pub use class::{JsClass, ProxyClass, OBJECT};
pub use error::{BridgeError, BridgeResult};
pub use keep_alive::KeepAliveSet;
pub use proxy::{JsRef, WeakJsRef};
pub use registry::HandleRegistry;
pub use table::{TypeNameTable, TypeNameTableBuilder};

pub use jsref_sdk::{AbiError, AbiResult, JsHandle, JsRuntime, RawHandle};
