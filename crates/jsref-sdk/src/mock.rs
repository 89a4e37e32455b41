//! In-memory foreign runtime
//!
//! `MockRuntime` models a JavaScript heap as reference-counted slots. Each
//! foreign value has one slot, so every reference to it shares one
//! [`RawHandle`]. Objects hold their own references on property values and
//! give them back when freed.
//!
//! Besides implementing [`JsRuntime`] it exposes counters (references,
//! releases, double releases, property reads) so tests can check that
//! handles are released exactly once, plus switches to inject failures.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{AbiError, AbiResult};
use crate::handle::RawHandle;
use crate::runtime::JsRuntime;

#[derive(Debug, Clone)]
enum Primitive {
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug)]
enum SlotValue {
    Undefined,
    Null,
    Primitive(Primitive),
    Object {
        properties: FxHashMap<String, u64>,
        payload: Option<Primitive>,
    },
}

impl SlotValue {
    fn type_name(&self) -> &'static str {
        match self {
            SlotValue::Undefined => "undefined",
            SlotValue::Null => "null",
            SlotValue::Primitive(Primitive::Bool(_)) => "boolean",
            SlotValue::Primitive(Primitive::Number(_)) => "number",
            SlotValue::Primitive(Primitive::String(_)) => "string",
            SlotValue::Object { .. } => "object",
        }
    }

    /// The primitive a scalar read sees, unboxing wrapper objects
    fn primitive(&self) -> Option<&Primitive> {
        match self {
            SlotValue::Primitive(p) => Some(p),
            SlotValue::Object { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    value: SlotValue,
    refs: usize,
    releases: usize,
    freed: bool,
}

#[derive(Debug, Default)]
struct Heap {
    slots: FxHashMap<u64, Slot>,
    next_id: u64,
    double_releases: usize,
    property_reads: usize,
    fail_property_reads: bool,
    fail_new_ref: bool,
}

impl Heap {
    fn alloc(&mut self, value: SlotValue) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.slots.insert(
            id,
            Slot {
                value,
                refs: 1,
                releases: 0,
                freed: false,
            },
        );
        id
    }

    fn live(&self, id: u64) -> AbiResult<&Slot> {
        match self.slots.get(&id) {
            Some(slot) if !slot.freed => Ok(slot),
            _ => Err(AbiError::UnknownHandle(RawHandle::new(id))),
        }
    }

    fn retain(&mut self, id: u64) {
        if let Some(slot) = self.slots.get_mut(&id) {
            if !slot.freed {
                slot.refs += 1;
            }
        }
    }

    /// Drop one reference, freeing the slot (and what it holds) at zero.
    fn decref(&mut self, id: u64) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(slot) = self.slots.get_mut(&id) else {
                self.double_releases += 1;
                continue;
            };
            if slot.freed {
                self.double_releases += 1;
                continue;
            }
            slot.refs -= 1;
            if slot.refs > 0 {
                continue;
            }
            slot.freed = true;
            if let SlotValue::Object { properties, .. } = &mut slot.value {
                pending.extend(properties.drain().map(|(_, child)| child));
            }
        }
    }

    fn scalar(&self, id: u64, expected: &'static str) -> AbiResult<Primitive> {
        let slot = self.live(id)?;
        slot.value
            .primitive()
            .cloned()
            .ok_or(AbiError::TypeMismatch {
                expected,
                got: slot.value.type_name(),
            })
    }
}

/// In-memory [`JsRuntime`] for tests and benches
#[derive(Debug, Default)]
pub struct MockRuntime {
    heap: Mutex<Heap>,
}

impl MockRuntime {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self, value: SlotValue) -> RawHandle {
        RawHandle::new(self.heap.lock().alloc(value))
    }

    fn plain_object(&self) -> RawHandle {
        self.alloc(SlotValue::Object {
            properties: FxHashMap::default(),
            payload: None,
        })
    }

    // ========================================================================
    // Value Construction (each returns one owned reference)
    // ========================================================================

    /// Allocate `undefined`
    pub fn undefined(&self) -> RawHandle {
        self.alloc(SlotValue::Undefined)
    }

    /// Allocate `null`
    pub fn null(&self) -> RawHandle {
        self.alloc(SlotValue::Null)
    }

    /// Allocate a primitive boolean
    pub fn boolean(&self, value: bool) -> RawHandle {
        self.alloc(SlotValue::Primitive(Primitive::Bool(value)))
    }

    /// Allocate a primitive number
    pub fn number(&self, value: f64) -> RawHandle {
        self.alloc(SlotValue::Primitive(Primitive::Number(value)))
    }

    /// Allocate a primitive string
    pub fn string(&self, value: &str) -> RawHandle {
        self.alloc(SlotValue::Primitive(Primitive::String(value.to_string())))
    }

    /// Allocate an object whose `constructor.name` is `class_name`
    pub fn instance(&self, class_name: &str) -> RawHandle {
        let ctor = self.plain_object();
        let name = self.string(class_name);
        self.set_property(ctor, "name", name);

        let object = self.plain_object();
        self.set_property(object, "constructor", ctor);
        object
    }

    /// Allocate an object with no `constructor` property at all
    pub fn bare_object(&self) -> RawHandle {
        self.plain_object()
    }

    /// Allocate a `Number` wrapper object
    pub fn boxed_number(&self, value: f64) -> RawHandle {
        self.boxed("Number", Primitive::Number(value))
    }

    /// Allocate a `String` wrapper object
    pub fn boxed_string(&self, value: &str) -> RawHandle {
        self.boxed("String", Primitive::String(value.to_string()))
    }

    /// Allocate a `Boolean` wrapper object
    pub fn boxed_boolean(&self, value: bool) -> RawHandle {
        self.boxed("Boolean", Primitive::Bool(value))
    }

    /// Allocate an error instance of `class_name` carrying `message`
    pub fn error(&self, class_name: &str, message: &str) -> RawHandle {
        let object = self.instance(class_name);
        let message = self.string(message);
        self.set_property(object, "message", message);
        object
    }

    fn boxed(&self, class_name: &str, payload: Primitive) -> RawHandle {
        let object = self.instance(class_name);
        if let Some(slot) = self.heap.lock().slots.get_mut(&object.as_u64()) {
            if let SlotValue::Object { payload: p, .. } = &mut slot.value {
                *p = Some(payload);
            }
        }
        object
    }

    /// Store `value` under `name` on `object`, taking over the caller's
    /// reference on `value`. A replaced property value is released.
    pub fn set_property(&self, object: RawHandle, name: &str, value: RawHandle) {
        let mut heap = self.heap.lock();
        let inserted = match heap.slots.get_mut(&object.as_u64()) {
            Some(Slot {
                value: SlotValue::Object { properties, .. },
                freed: false,
                ..
            }) => Some(properties.insert(name.to_string(), value.as_u64())),
            _ => None,
        };
        match inserted {
            Some(Some(previous)) => heap.decref(previous),
            Some(None) => {}
            // not an object: the value has nowhere to live
            None => heap.decref(value.as_u64()),
        }
    }

    /// Take one more reference on `handle` and return it
    pub fn retain(&self, handle: RawHandle) -> RawHandle {
        self.heap.lock().retain(handle.as_u64());
        handle
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Outstanding references on a slot (0 once freed)
    pub fn refcount(&self, handle: RawHandle) -> usize {
        self.heap
            .lock()
            .slots
            .get(&handle.as_u64())
            .map_or(0, |slot| slot.refs)
    }

    /// Number of `release` calls received for a slot
    pub fn release_count(&self, handle: RawHandle) -> usize {
        self.heap
            .lock()
            .slots
            .get(&handle.as_u64())
            .map_or(0, |slot| slot.releases)
    }

    /// Whether the slot has been freed
    pub fn is_freed(&self, handle: RawHandle) -> bool {
        self.heap
            .lock()
            .slots
            .get(&handle.as_u64())
            .is_some_and(|slot| slot.freed)
    }

    /// Releases of freed or unknown slots
    pub fn double_releases(&self) -> usize {
        self.heap.lock().double_releases
    }

    /// Slots not yet freed
    pub fn live_slots(&self) -> usize {
        self.heap
            .lock()
            .slots
            .values()
            .filter(|slot| !slot.freed)
            .count()
    }

    /// Number of successful `get_property` calls
    pub fn property_reads(&self) -> usize {
        self.heap.lock().property_reads
    }

    // ========================================================================
    // Failure Injection
    // ========================================================================

    /// Make every `get_property` call throw
    pub fn set_fail_property_reads(&self, fail: bool) {
        self.heap.lock().fail_property_reads = fail;
    }

    /// Make every `new_ref` call fail with out-of-memory
    pub fn set_fail_new_ref(&self, fail: bool) {
        self.heap.lock().fail_new_ref = fail;
    }
}

impl JsRuntime for MockRuntime {
    fn is_object(&self, handle: RawHandle) -> bool {
        self.heap
            .lock()
            .live(handle.as_u64())
            .is_ok_and(|slot| matches!(slot.value, SlotValue::Object { .. }))
    }

    fn is_null(&self, handle: RawHandle) -> bool {
        self.heap
            .lock()
            .live(handle.as_u64())
            .is_ok_and(|slot| matches!(slot.value, SlotValue::Null))
    }

    fn is_undefined(&self, handle: RawHandle) -> bool {
        self.heap
            .lock()
            .live(handle.as_u64())
            .is_ok_and(|slot| matches!(slot.value, SlotValue::Undefined))
    }

    fn get_property(&self, handle: RawHandle, name: &str) -> AbiResult<RawHandle> {
        let mut heap = self.heap.lock();
        if heap.fail_property_reads {
            return Err(AbiError::Exception(format!(
                "cannot read property '{name}'"
            )));
        }
        let found = match &heap.live(handle.as_u64())?.value {
            SlotValue::Undefined | SlotValue::Null => {
                return Err(AbiError::Exception(format!(
                    "cannot read properties of null (reading '{name}')"
                )));
            }
            SlotValue::Object { properties, .. } => properties.get(name).copied(),
            SlotValue::Primitive(_) => None,
        };
        heap.property_reads += 1;
        let id = match found {
            Some(id) => {
                heap.retain(id);
                id
            }
            None => heap.alloc(SlotValue::Undefined),
        };
        Ok(RawHandle::new(id))
    }

    fn read_string(&self, handle: RawHandle) -> AbiResult<String> {
        match self.heap.lock().scalar(handle.as_u64(), "string")? {
            Primitive::String(s) => Ok(s),
            Primitive::Bool(_) => Err(AbiError::TypeMismatch {
                expected: "string",
                got: "boolean",
            }),
            Primitive::Number(_) => Err(AbiError::TypeMismatch {
                expected: "string",
                got: "number",
            }),
        }
    }

    fn read_number(&self, handle: RawHandle) -> AbiResult<f64> {
        match self.heap.lock().scalar(handle.as_u64(), "number")? {
            Primitive::Number(n) => Ok(n),
            Primitive::Bool(_) => Err(AbiError::TypeMismatch {
                expected: "number",
                got: "boolean",
            }),
            Primitive::String(_) => Err(AbiError::TypeMismatch {
                expected: "number",
                got: "string",
            }),
        }
    }

    fn read_bool(&self, handle: RawHandle) -> AbiResult<bool> {
        match self.heap.lock().scalar(handle.as_u64(), "boolean")? {
            Primitive::Bool(b) => Ok(b),
            Primitive::Number(_) => Err(AbiError::TypeMismatch {
                expected: "boolean",
                got: "number",
            }),
            Primitive::String(_) => Err(AbiError::TypeMismatch {
                expected: "boolean",
                got: "string",
            }),
        }
    }

    fn new_ref(&self) -> AbiResult<RawHandle> {
        let mut heap = self.heap.lock();
        if heap.fail_new_ref {
            return Err(AbiError::OutOfMemory);
        }
        let id = heap.alloc(SlotValue::Object {
            properties: FxHashMap::default(),
            payload: None,
        });
        Ok(RawHandle::new(id))
    }

    fn release(&self, handle: RawHandle) {
        let mut heap = self.heap.lock();
        if let Some(slot) = heap.slots.get_mut(&handle.as_u64()) {
            slot.releases += 1;
        }
        heap.decref(handle.as_u64());
    }
}
