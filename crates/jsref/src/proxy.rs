//! Proxy objects
//!
//! A [`JsRef`] is a shared handle to one proxy cell. The cell owns the
//! foreign [`JsHandle`] and its class, both fixed at construction.
//!
//! The cell is finalized when the last strong `JsRef` (typed views and the
//! keep-alive set included) is dropped, on whatever thread that happens. Its
//! `Drop` removes the registry entry if that entry still refers to this cell,
//! then the handle field drops and releases the foreign reference. Both
//! happen exactly once per cell.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use jsref_sdk::{JsHandle, RawHandle};

use crate::class::{JsClass, ProxyClass, OBJECT};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::HandleRegistry;

pub(crate) struct ProxyCell {
    handle: JsHandle,
    class: &'static ProxyClass,
    registry: Arc<HandleRegistry>,
}

impl Drop for ProxyCell {
    fn drop(&mut self) {
        let raw = self.handle.raw();
        if self.registry.unregister_if_stale(raw, self) {
            tracing::trace!(%raw, class = %self.class, "proxy finalized");
        } else {
            tracing::trace!(
                %raw,
                class = %self.class,
                "proxy finalized, registry entry belongs to a newer proxy"
            );
        }
    }
}

/// Untyped proxy for a foreign value.
///
/// Cloning shares the same proxy. Equality and hashing are by proxy
/// identity, not by foreign value.
#[derive(Clone)]
pub struct JsRef {
    cell: Arc<ProxyCell>,
}

impl JsRef {
    /// Build a proxy cell. The caller registers it before handing it out.
    pub(crate) fn new(
        handle: JsHandle,
        class: &'static ProxyClass,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        Self {
            cell: Arc::new(ProxyCell {
                handle,
                class,
                registry,
            }),
        }
    }

    pub(crate) fn from_cell(cell: Arc<ProxyCell>) -> Self {
        Self { cell }
    }

    pub(crate) fn weak_cell(&self) -> Weak<ProxyCell> {
        Arc::downgrade(&self.cell)
    }

    /// Address of the proxy cell, stable while any strong reference exists
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.cell) as usize
    }

    /// The owned foreign handle
    pub fn handle(&self) -> &JsHandle {
        &self.cell.handle
    }

    /// Raw identity of the foreign value
    pub fn raw(&self) -> RawHandle {
        self.cell.handle.raw()
    }

    /// Concrete class chosen at construction
    pub fn class(&self) -> &'static ProxyClass {
        self.cell.class
    }

    /// Whether this proxy can be viewed as `T`
    pub fn is<T: JsClass>(&self) -> bool {
        self.cell.class.is_subclass_of(T::class())
    }

    /// Checked conversion to a typed view
    pub fn cast<T: JsClass>(self) -> BridgeResult<T> {
        if self.is::<T>() {
            Ok(T::from_ref(self))
        } else {
            Err(BridgeError::TypeMismatch {
                expected: T::class().name(),
                found: self.class().name(),
            })
        }
    }

    /// Whether both refer to the same proxy
    pub fn ptr_eq(&self, other: &JsRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Weak reference that does not keep the proxy alive
    pub fn downgrade(&self) -> WeakJsRef {
        WeakJsRef {
            cell: self.weak_cell(),
            raw: self.raw(),
        }
    }

    /// Number of strong references to this proxy
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.cell)
    }
}

impl JsClass for JsRef {
    fn class() -> &'static ProxyClass {
        &OBJECT
    }

    fn from_ref(proxy: JsRef) -> Self {
        proxy
    }

    fn js_ref(&self) -> &JsRef {
        self
    }
}

impl PartialEq for JsRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for JsRef {}

impl Hash for JsRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for JsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsRef")
            .field("class", &self.class().name())
            .field("raw", &self.raw())
            .finish()
    }
}

impl fmt::Display for JsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class(), self.raw())
    }
}

/// Non-owning reference to a proxy
#[derive(Clone)]
pub struct WeakJsRef {
    cell: Weak<ProxyCell>,
    raw: RawHandle,
}

impl WeakJsRef {
    /// The proxy, if it has not been finalized
    pub fn upgrade(&self) -> Option<JsRef> {
        self.cell.upgrade().map(JsRef::from_cell)
    }

    /// Whether the proxy has been finalized
    pub fn is_reclaimed(&self) -> bool {
        self.cell.strong_count() == 0
    }

    /// Raw identity of the foreign value the proxy wrapped
    pub fn raw(&self) -> RawHandle {
        self.raw
    }
}

impl fmt::Debug for WeakJsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakJsRef")
            .field("raw", &self.raw)
            .field("reclaimed", &self.is_reclaimed())
            .finish()
    }
}
