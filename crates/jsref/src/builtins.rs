//! Built-in JavaScript classes
//!
//! Proxy variants for the runtime's own constructors. Domain layers add
//! their classes with [`js_class!`](crate::js_class), usually deriving
//! error types from [`ERROR`].

use jsref_sdk::AbiResult;

use crate::class::OBJECT;
use crate::js_class;

js_class! {
    /// A `Number` value
    pub struct JsNumber => NUMBER("Number") extends OBJECT;

    /// A `String` value
    pub struct JsString => STRING("String") extends OBJECT;

    /// A `Boolean` value
    pub struct JsBoolean => BOOLEAN("Boolean") extends OBJECT;

    /// An `Error` (or subclass) instance
    pub struct JsError => ERROR("Error") extends OBJECT;
}

impl JsNumber {
    /// Read the numeric value
    pub fn value(&self) -> AbiResult<f64> {
        self.handle().read_number()
    }
}

impl JsString {
    /// Read the string value
    pub fn value(&self) -> AbiResult<String> {
        self.handle().read_string()
    }
}

impl JsBoolean {
    /// Read the boolean value
    pub fn value(&self) -> AbiResult<bool> {
        self.handle().read_bool()
    }
}

impl JsError {
    /// Read the `message` property
    pub fn message(&self) -> AbiResult<String> {
        self.handle().get_property("message")?.read_string()
    }
}
