//! Concurrent acquisition and finalization
//!
//! Proxies are acquired and dropped from many threads at once. Whatever the
//! interleaving, a foreign value must never end up with two live registered
//! proxies, a live proxy must never lose its registry entry to a stale
//! finalizer, and every foreign reference must be released exactly once.
//!
//! # Running Tests
//! ```bash
//! cargo test -p jsref --test concurrency_tests
//! ```

use std::sync::{Arc, Barrier};
use std::thread;

use jsref::{Bridge, JsNumber, JsRef, JsRuntime};
use jsref_sdk::mock::MockRuntime;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

fn setup() -> (Arc<MockRuntime>, Bridge) {
    let rt = Arc::new(MockRuntime::new());
    let bridge = Bridge::new(rt.clone());
    (rt, bridge)
}

#[test]
fn test_concurrent_acquire_yields_one_proxy() {
    let (rt, bridge) = setup();
    let raw = rt.boxed_number(1.0);
    for _ in 0..THREADS {
        rt.retain(raw);
    }
    let barrier = Barrier::new(THREADS);

    let proxies: Vec<JsNumber> = thread::scope(|s| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    bridge.acquire::<JsNumber>(bridge.handle(raw)).unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let first = &proxies[0];
    assert!(proxies.iter().all(|p| p.ptr_eq(first)));
    assert_eq!(bridge.registry().live_count(), 1);
    // one reference is owned by the proxy, the extra ones were handed back
    assert_eq!(rt.refcount(raw), 2);

    drop(proxies);
    rt.release(raw);
    assert!(rt.is_freed(raw));
    assert_eq!(rt.double_releases(), 0);
}

#[test]
fn test_acquire_and_drop_churn() {
    let (rt, bridge) = setup();
    let raws: Vec<_> = (0..4).map(|i| rt.boxed_number(i as f64)).collect();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let (rt, bridge, raws, barrier) = (&rt, &bridge, &raws, &barrier);
            s.spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let raw = raws[(t + round) % raws.len()];
                    let proxy = bridge.acquire_any(bridge.handle(rt.retain(raw))).unwrap();
                    // the registered proxy for a value is always the one we hold
                    // or a newer one, never a dead one
                    if let Some(registered) = bridge.registry().lookup(raw) {
                        assert_eq!(registered.raw(), raw);
                    }
                    assert_eq!(proxy.raw(), raw);
                }
            });
        }
    });

    assert_eq!(bridge.registry().live_count(), 0);
    bridge.registry().purge_stale();
    assert!(bridge.registry().is_empty());

    for raw in &raws {
        assert_eq!(rt.refcount(*raw), 1);
        rt.release(*raw);
    }
    assert_eq!(rt.live_slots(), 0);
    assert_eq!(rt.double_releases(), 0);
}

#[test]
fn test_live_holder_never_loses_entry() {
    let (rt, bridge) = setup();
    let raw = rt.boxed_number(5.0);
    rt.retain(raw);

    // one long-lived holder while other threads churn through the same value
    let holder: JsRef = bridge.acquire(bridge.handle(raw)).unwrap();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let p = bridge.acquire_any(bridge.handle(rt.retain(raw))).unwrap();
                    assert!(p.ptr_eq(&holder));
                }
            });
        }
    });

    assert!(bridge.registry().lookup(raw).unwrap().ptr_eq(&holder));
    assert_eq!(rt.refcount(raw), 2);
}

#[test]
fn test_finalization_on_another_thread() {
    let (rt, bridge) = setup();
    let raw = rt.boxed_number(9.0);
    rt.retain(raw);

    let proxy: JsNumber = bridge.acquire(bridge.handle(raw)).unwrap();
    let weak = proxy.downgrade();
    thread::spawn(move || drop(proxy)).join().unwrap();

    assert!(weak.is_reclaimed());
    assert!(!bridge.registry().contains(raw));

    let fresh: JsNumber = bridge.acquire(bridge.handle(raw)).unwrap();
    assert!(bridge.registry().lookup(raw).unwrap().ptr_eq(&fresh));
    assert_eq!(fresh.value().unwrap(), 9.0);
}

#[test]
fn test_keep_alive_across_threads() {
    let (rt, bridge) = setup();
    let raw = rt.boxed_number(3.0);
    let proxy: JsNumber = bridge.acquire(bridge.handle(raw)).unwrap();
    let weak = proxy.downgrade();

    thread::scope(|s| {
        s.spawn(|| bridge.set_keep_alive(Some(&proxy), true).unwrap());
    });
    drop(proxy);
    assert!(!weak.is_reclaimed());

    let pinned = weak.upgrade().unwrap();
    thread::scope(|s| {
        s.spawn(|| bridge.set_keep_alive(Some(&pinned), false).unwrap());
    });
    drop(pinned);
    assert!(weak.is_reclaimed());
    assert!(rt.is_freed(raw));
}
