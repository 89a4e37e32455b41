//! Bridge entry points
//!
//! [`Bridge`] ties the pieces together for one foreign runtime:
//!
//! 1. registry lookup by raw identity (hit: return the live proxy)
//! 2. on a miss, resolve the most specific class
//! 3. construct the proxy, registering it before it is handed out
//! 4. optionally pin it with the keep-alive override

use std::sync::Arc;

use jsref_sdk::{JsHandle, JsRuntime, RawHandle};

use crate::class::{JsClass, ProxyClass};
use crate::error::{BridgeError, BridgeResult};
use crate::keep_alive::KeepAliveSet;
use crate::proxy::JsRef;
use crate::registry::HandleRegistry;
use crate::resolver;
use crate::table::TypeNameTable;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Constructor name -> class table (frozen)
    pub type_table: Arc<TypeNameTable>,

    /// Resolve classes from `constructor.name`; when off, the requested
    /// class is always used
    pub resolve_types: bool,

    /// Maximum nesting of re-entrant resolutions
    pub max_resolve_depth: usize,

    /// Initial registry capacity
    pub registry_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            type_table: TypeNameTable::builtin(),
            resolve_types: true,
            max_resolve_depth: 4,
            registry_capacity: 0,
        }
    }
}

/// Identity-preserving proxy factory for one foreign runtime.
///
/// `Bridge` is `Send + Sync`; proxies it hands out may be dropped on any
/// thread.
pub struct Bridge {
    runtime: Arc<dyn JsRuntime>,
    registry: Arc<HandleRegistry>,
    keep_alive: KeepAliveSet,
    options: BridgeOptions,
}

impl Bridge {
    /// Create a bridge with default options
    pub fn new(runtime: Arc<dyn JsRuntime>) -> Self {
        Self::with_options(runtime, BridgeOptions::default())
    }

    /// Create a bridge with the given options
    pub fn with_options(runtime: Arc<dyn JsRuntime>, options: BridgeOptions) -> Self {
        Self {
            runtime,
            registry: Arc::new(HandleRegistry::with_capacity(options.registry_capacity)),
            keep_alive: KeepAliveSet::new(),
            options,
        }
    }

    /// The foreign runtime
    pub fn runtime(&self) -> &Arc<dyn JsRuntime> {
        &self.runtime
    }

    /// The handle registry
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// The type name table
    pub fn type_table(&self) -> &TypeNameTable {
        &self.options.type_table
    }

    /// Bridge configuration
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// The keep-alive set
    pub fn keep_alive_set(&self) -> &KeepAliveSet {
        &self.keep_alive
    }

    /// Take ownership of a raw reference issued by this bridge's runtime
    pub fn handle(&self, raw: RawHandle) -> JsHandle {
        JsHandle::from_raw(Arc::clone(&self.runtime), raw)
    }

    // ========================================================================
    // Acquisition
    // ========================================================================

    /// The proxy for `handle`, viewed as `T`.
    ///
    /// Returns the registered proxy if one is alive (the passed handle is
    /// then released), otherwise constructs one of the most specific known
    /// class. Fails with `InvalidHandle` for a closed or null handle and with
    /// `TypeMismatch` when the proxy's class does not derive from `T`.
    pub fn acquire<T: JsClass>(&self, handle: JsHandle) -> BridgeResult<T> {
        self.acquire_at(handle, 0)
    }

    /// Like [`Bridge::acquire`], but `null` and `undefined` yield `Ok(None)`
    /// without constructing a proxy.
    pub fn acquire_or_null<T: JsClass>(&self, handle: JsHandle) -> BridgeResult<Option<T>> {
        self.acquire_or_null_at(handle, 0)
    }

    /// Untyped [`Bridge::acquire`]
    pub fn acquire_any(&self, handle: JsHandle) -> BridgeResult<JsRef> {
        self.acquire(handle)
    }

    /// Untyped [`Bridge::acquire_or_null`]
    pub fn acquire_any_or_null(&self, handle: JsHandle) -> BridgeResult<Option<JsRef>> {
        self.acquire_or_null(handle)
    }

    /// Class [`Bridge::acquire`] would instantiate for `handle` when asked
    /// for `requested`, ignoring the registry.
    pub fn resolve_class(
        &self,
        handle: &JsHandle,
        requested: &'static ProxyClass,
    ) -> &'static ProxyClass {
        resolver::resolve(self, handle, requested, 0)
    }

    pub(crate) fn acquire_at<T: JsClass>(&self, handle: JsHandle, depth: usize) -> BridgeResult<T> {
        let raw = check_usable(&handle)?;

        if let Some(existing) = self.registry.lookup(raw) {
            tracing::trace!(%raw, class = %existing.class(), "registry hit");
            return existing.cast();
        }

        let class = resolver::resolve(self, &handle, T::class(), depth);
        if !class.is_subclass_of(T::class()) {
            return Err(BridgeError::TypeMismatch {
                expected: T::class().name(),
                found: class.name(),
            });
        }

        let registry = Arc::clone(&self.registry);
        let (proxy, created) = self
            .registry
            .get_or_register(raw, move || JsRef::new(handle, class, registry));
        if created {
            tracing::debug!(%raw, %class, "proxy constructed");
        } else {
            tracing::trace!(%raw, "proxy registered concurrently, reusing it");
        }
        proxy.cast()
    }

    pub(crate) fn acquire_or_null_at<T: JsClass>(
        &self,
        handle: JsHandle,
        depth: usize,
    ) -> BridgeResult<Option<T>> {
        check_usable(&handle)?;
        if handle.is_nullish()? {
            return Ok(None);
        }
        self.acquire_at(handle, depth).map(Some)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Construct a new proxy of class `T` for `handle`, superseding any
    /// proxy registered for the same foreign value. No resolution happens.
    pub fn construct<T: JsClass>(&self, handle: JsHandle) -> BridgeResult<T> {
        let raw = check_usable(&handle)?;
        let class = T::class();
        let proxy = JsRef::new(handle, class, Arc::clone(&self.registry));
        if self.registry.register(raw, &proxy) {
            tracing::debug!(%raw, %class, "proxy constructed, superseding a live proxy");
        } else {
            tracing::debug!(%raw, %class, "proxy constructed");
        }
        Ok(T::from_ref(proxy))
    }

    /// Allocate a brand-new foreign slot and construct a `T` over it
    pub fn create<T: JsClass>(&self) -> BridgeResult<T> {
        let handle = JsHandle::new_ref(Arc::clone(&self.runtime))?;
        self.construct(handle)
    }

    // ========================================================================
    // Keep-Alive
    // ========================================================================

    /// Pin (`true`) or unpin (`false`) a proxy independently of ordinary
    /// reachability. `None` is a usage error.
    pub fn set_keep_alive<P: JsClass>(&self, proxy: Option<&P>, keep_alive: bool) -> BridgeResult<()> {
        let proxy = proxy
            .ok_or(BridgeError::NullArgument { argument: "proxy" })?
            .js_ref();
        tracing::info!(%proxy, keep_alive, "set keep-alive");
        self.keep_alive.set(proxy, keep_alive);
        Ok(())
    }

    /// Whether `proxy` is pinned
    pub fn is_kept_alive<P: JsClass>(&self, proxy: &P) -> bool {
        self.keep_alive.contains(proxy.js_ref())
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("registry_len", &self.registry.len())
            .field("keep_alive", &self.keep_alive)
            .field("options", &self.options)
            .finish()
    }
}

fn check_usable(handle: &JsHandle) -> BridgeResult<RawHandle> {
    if handle.is_closed() || handle.is_invalid() {
        Err(BridgeError::InvalidHandle {
            raw: handle.raw(),
            closed: handle.is_closed(),
        })
    } else {
        Ok(handle.raw())
    }
}
