//! Type resolution
//!
//! Picks the most specific known class for a foreign value by reading
//! `value.constructor.name` and consulting the bridge's [`TypeNameTable`].
//! The name is acquired through the bridge as an untyped proxy and read as
//! a string, so whatever proxy already exists for the name slot is reused.
//! Foreign irregularities never fail resolution; they fall back to the class
//! the caller asked for.
//!
//! [`TypeNameTable`]: crate::table::TypeNameTable

use jsref_sdk::JsHandle;

use crate::bridge::Bridge;
use crate::class::ProxyClass;
use crate::error::BridgeResult;
use crate::proxy::JsRef;

/// Resolve the class to instantiate for `handle`.
///
/// `depth` counts re-entrant resolutions (reading the constructor name
/// acquires it as a proxy, which resolves again).
pub(crate) fn resolve(
    bridge: &Bridge,
    handle: &JsHandle,
    requested: &'static ProxyClass,
    depth: usize,
) -> &'static ProxyClass {
    let options = bridge.options();
    if !options.resolve_types {
        return requested;
    }
    let raw = handle.raw();
    if depth >= options.max_resolve_depth {
        tracing::debug!(%raw, depth, %requested, "resolution depth exhausted");
        return requested;
    }

    match handle.is_object() {
        Ok(true) => {}
        Ok(false) => return requested,
        Err(err) => {
            tracing::debug!(%raw, %err, %requested, "object test failed");
            return requested;
        }
    }

    match constructor_name(bridge, handle, depth) {
        Ok(Some(name)) => match bridge.type_table().get(&name) {
            Some(class) => {
                tracing::trace!(%raw, %class, "resolved foreign type");
                class
            }
            None => {
                tracing::trace!(%raw, name = %name, %requested, "unmapped foreign type");
                requested
            }
        },
        Ok(None) => {
            tracing::debug!(%raw, %requested, "object has no constructor name");
            requested
        }
        Err(err) => {
            tracing::debug!(%raw, %err, %requested, "constructor name lookup failed");
            requested
        }
    }
}

/// `handle.constructor.name`, or `None` when either link is null/undefined.
fn constructor_name(
    bridge: &Bridge,
    handle: &JsHandle,
    depth: usize,
) -> BridgeResult<Option<String>> {
    let ctor = handle.get_property("constructor")?;
    if ctor.is_nullish()? {
        return Ok(None);
    }
    let name = ctor.get_property("name")?;
    // untyped, so a live proxy of any class for the name slot is accepted
    match bridge.acquire_or_null_at::<JsRef>(name, depth + 1)? {
        Some(name) => Ok(Some(name.handle().read_string()?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeOptions;
    use crate::builtins::{BOOLEAN, ERROR, NUMBER, STRING};
    use crate::class::OBJECT;
    use crate::table::TypeNameTable;
    use jsref_sdk::mock::MockRuntime;
    use std::sync::Arc;

    static ROOM: ProxyClass = ProxyClass::new("Room", &OBJECT);

    fn setup() -> (Arc<MockRuntime>, Bridge) {
        let rt = Arc::new(MockRuntime::new());
        let bridge = Bridge::new(rt.clone());
        (rt, bridge)
    }

    #[test]
    fn test_primitive_keeps_requested() {
        let (rt, bridge) = setup();
        let h = bridge.handle(rt.number(3.0));
        assert_eq!(bridge.resolve_class(&h, &NUMBER), &NUMBER);
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
        assert_eq!(rt.property_reads(), 0);
    }

    #[test]
    fn test_builtin_names_resolve() {
        let (rt, bridge) = setup();
        let n = bridge.handle(rt.boxed_number(1.0));
        let s = bridge.handle(rt.boxed_string("x"));
        let b = bridge.handle(rt.boxed_boolean(false));
        let e = bridge.handle(rt.error("Error", "boom"));

        assert_eq!(bridge.resolve_class(&n, &OBJECT), &NUMBER);
        assert_eq!(bridge.resolve_class(&s, &OBJECT), &STRING);
        assert_eq!(bridge.resolve_class(&b, &OBJECT), &BOOLEAN);
        assert_eq!(bridge.resolve_class(&e, &OBJECT), &ERROR);
    }

    #[test]
    fn test_unmapped_name_keeps_requested() {
        let (rt, bridge) = setup();
        let h = bridge.handle(rt.instance("Room"));
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_custom_table() {
        let rt = Arc::new(MockRuntime::new());
        let options = BridgeOptions {
            type_table: Arc::new(TypeNameTable::builder().register(&ROOM).build()),
            ..BridgeOptions::default()
        };
        let bridge = Bridge::with_options(rt.clone(), options);

        let room = bridge.handle(rt.instance("Room"));
        let number = bridge.handle(rt.boxed_number(1.0));
        assert_eq!(bridge.resolve_class(&room, &OBJECT), &ROOM);
        assert_eq!(bridge.resolve_class(&number, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_missing_constructor_falls_back() {
        let (rt, bridge) = setup();
        let h = bridge.handle(rt.bare_object());
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_non_string_name_falls_back() {
        let (rt, bridge) = setup();
        let obj = rt.bare_object();
        let ctor = rt.bare_object();
        let name = rt.number(42.0);
        rt.set_property(ctor, "name", name);
        rt.set_property(obj, "constructor", ctor);

        let h = bridge.handle(obj);
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_foreign_exception_falls_back() {
        let (rt, bridge) = setup();
        let h = bridge.handle(rt.boxed_number(1.0));
        rt.set_fail_property_reads(true);
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_resolution_disabled() {
        let rt = Arc::new(MockRuntime::new());
        let options = BridgeOptions {
            resolve_types: false,
            ..BridgeOptions::default()
        };
        let bridge = Bridge::with_options(rt.clone(), options);

        let h = bridge.handle(rt.boxed_number(1.0));
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
        assert_eq!(rt.property_reads(), 0);
    }

    #[test]
    fn test_depth_limit() {
        let rt = Arc::new(MockRuntime::new());
        let options = BridgeOptions {
            max_resolve_depth: 0,
            ..BridgeOptions::default()
        };
        let bridge = Bridge::with_options(rt.clone(), options);

        let h = bridge.handle(rt.boxed_number(1.0));
        assert_eq!(bridge.resolve_class(&h, &OBJECT), &OBJECT);
    }

    #[test]
    fn test_live_name_proxy_does_not_affect_resolution() {
        let (rt, bridge) = setup();
        let obj = rt.boxed_number(1.0);
        let h = bridge.handle(obj);

        let ctor = h.get_property("constructor").unwrap();
        let name = bridge.acquire_any(ctor.get_property("name").unwrap()).unwrap();
        assert_eq!(name.class(), &OBJECT);

        assert_eq!(bridge.resolve_class(&h, &OBJECT), &NUMBER);
        assert!(bridge.registry().lookup(name.raw()).unwrap().ptr_eq(&name));
    }

    #[test]
    fn test_resolution_releases_temporaries() {
        let (rt, bridge) = setup();
        let raw = rt.boxed_number(1.0);
        let live_before = rt.live_slots();

        let h = bridge.handle(raw);
        bridge.resolve_class(&h, &OBJECT);

        // constructor and name references were handed back, and the name
        // proxy did not outlive resolution
        assert_eq!(rt.live_slots(), live_before);
        assert!(bridge.registry().is_empty());
        assert_eq!(rt.double_releases(), 0);
    }
}
