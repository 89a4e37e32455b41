//! Handle registry
//!
//! Maps a foreign value's raw identity to a weak reference on its current
//! proxy, so repeated acquisition of one foreign value yields one proxy.
//!
//! Entries may outlive their proxy (a stale entry) until they are overwritten
//! or removed by that proxy's finalizer. Lookups treat stale entries as
//! absent.
//!
//! All mutation happens under the map's per-shard lock. Nothing that can
//! finalize a proxy or release a handle runs while a shard lock is held,
//! since finalization re-enters [`HandleRegistry::unregister_if_stale`].

use std::ptr;
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jsref_sdk::RawHandle;

use crate::proxy::{JsRef, ProxyCell};

/// Identity-keyed weak table of live proxies
pub struct HandleRegistry {
    entries: DashMap<RawHandle, Weak<ProxyCell>>,
}

impl HandleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Create an empty registry with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// The live proxy registered for `raw`, if any.
    ///
    /// A key that was never registered and a stale entry both yield `None`.
    pub fn lookup(&self, raw: RawHandle) -> Option<JsRef> {
        self.entries
            .get(&raw)
            .and_then(|entry| entry.value().upgrade())
            .map(JsRef::from_cell)
    }

    /// Record `proxy` as the proxy for `raw`, replacing whatever was there.
    ///
    /// Returns `true` if a different live proxy was superseded.
    pub fn register(&self, raw: RawHandle, proxy: &JsRef) -> bool {
        let previous = self.entries.insert(raw, proxy.weak_cell());
        previous.is_some_and(|weak| {
            weak.strong_count() > 0 && weak.as_ptr() as usize != proxy.addr()
        })
    }

    /// Return the live proxy for `raw`, or register the one built by `make`.
    ///
    /// Lookup and insertion happen under one shard lock, so concurrent
    /// callers for the same key agree on a single proxy. `make` runs under
    /// that lock and must not call back into the registry. The boolean is
    /// `true` when `make` was used.
    #[allow(clippy::let_and_return)]
    pub(crate) fn get_or_register<F>(&self, raw: RawHandle, make: F) -> (JsRef, bool)
    where
        F: FnOnce() -> JsRef,
    {
        // An unused `make` may own a handle whose drop calls out. Returning
        // the `match` directly would keep the entry guard alive past the
        // drop of `make`; binding it first releases the guard at the `;`.
        let outcome = match self.entries.entry(raw) {
            Entry::Occupied(mut occupied) => match occupied.get().upgrade() {
                Some(cell) => (JsRef::from_cell(cell), false),
                None => {
                    let proxy = make();
                    occupied.insert(proxy.weak_cell());
                    (proxy, true)
                }
            },
            Entry::Vacant(vacant) => {
                let proxy = make();
                vacant.insert(proxy.weak_cell());
                (proxy, true)
            }
        };
        outcome
    }

    /// Remove the entry for `raw` if it still refers to `cell` or is stale.
    ///
    /// Called only from a proxy's finalizer. An entry pointing at a newer
    /// live proxy is left in place and `false` is returned.
    pub(crate) fn unregister_if_stale(&self, raw: RawHandle, cell: &ProxyCell) -> bool {
        self.entries
            .remove_if(&raw, |_, weak| {
                ptr::eq(weak.as_ptr(), cell) || weak.strong_count() == 0
            })
            .is_some()
    }

    /// Whether any entry (live or stale) exists for `raw`
    pub fn contains(&self, raw: RawHandle) -> bool {
        self.entries.contains_key(&raw)
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose proxy is still alive
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    /// Drop stale entries, returning how many were removed
    pub fn purge_stale(&self) -> usize {
        let mut purged = 0;
        self.entries.retain(|_, weak| {
            let live = weak.strong_count() > 0;
            if !live {
                purged += 1;
            }
            live
        });
        purged
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
