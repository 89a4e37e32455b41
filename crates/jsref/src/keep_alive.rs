//! Keep-alive override
//!
//! Strong references that pin proxies regardless of ordinary reachability,
//! for foreign values that must outlive the host's view of them (a track
//! that is still playing, a stream still flowing). Membership is entirely
//! caller-controlled.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::proxy::JsRef;

/// Set of pinned proxies, keyed by proxy identity
#[derive(Default)]
pub struct KeepAliveSet {
    pinned: Mutex<FxHashMap<usize, JsRef>>,
}

impl KeepAliveSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin or unpin `proxy`. Returns whether membership changed.
    pub fn set(&self, proxy: &JsRef, keep_alive: bool) -> bool {
        if keep_alive {
            let previous = self.pinned.lock().insert(proxy.addr(), proxy.clone());
            previous.is_none()
        } else {
            // the caller still holds `proxy`, so this never finalizes it
            let removed = self.pinned.lock().remove(&proxy.addr());
            removed.is_some()
        }
    }

    /// Whether `proxy` is pinned
    pub fn contains(&self, proxy: &JsRef) -> bool {
        self.pinned.lock().contains_key(&proxy.addr())
    }

    /// Number of pinned proxies
    pub fn len(&self) -> usize {
        self.pinned.lock().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.pinned.lock().is_empty()
    }

    /// Unpin everything, returning how many proxies were released.
    ///
    /// Proxies with no other strong reference are finalized here, after the
    /// set's lock is released.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.pinned.lock());
        drained.len()
    }
}

impl std::fmt::Debug for KeepAliveSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAliveSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::OBJECT;
    use crate::registry::HandleRegistry;
    use jsref_sdk::mock::MockRuntime;
    use jsref_sdk::JsHandle;
    use std::sync::Arc;

    fn proxy(rt: &Arc<MockRuntime>) -> JsRef {
        let registry = Arc::new(HandleRegistry::new());
        let handle = JsHandle::from_raw(rt.clone(), rt.bare_object());
        JsRef::new(handle, &OBJECT, registry)
    }

    #[test]
    fn test_set_is_idempotent() {
        let rt = Arc::new(MockRuntime::new());
        let set = KeepAliveSet::new();
        let p = proxy(&rt);

        assert!(set.set(&p, true));
        assert!(!set.set(&p, true));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&p));

        assert!(set.set(&p, false));
        assert!(!set.set(&p, false));
        assert!(set.is_empty());
    }

    #[test]
    fn test_pin_outlives_caller() {
        let rt = Arc::new(MockRuntime::new());
        let set = KeepAliveSet::new();
        let p = proxy(&rt);
        let raw = p.raw();
        let weak = p.downgrade();

        set.set(&p, true);
        drop(p);
        assert!(!weak.is_reclaimed());
        assert!(!rt.is_freed(raw));

        assert_eq!(set.clear(), 1);
        assert!(weak.is_reclaimed());
        assert!(rt.is_freed(raw));
    }
}
