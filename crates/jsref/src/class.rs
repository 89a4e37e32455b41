//! Proxy classes
//!
//! Every proxy carries a static [`ProxyClass`] chosen when it is constructed.
//! Classes form a single-inheritance chain rooted at [`OBJECT`]; a proxy of
//! class `C` can be handed out as any class on `C`'s chain.
//!
//! Typed proxies are newtypes over [`JsRef`] implementing [`JsClass`];
//! declare them with [`js_class!`](crate::js_class).

use std::fmt;
use std::ptr;

use crate::proxy::JsRef;

/// Static descriptor of a proxy variant.
///
/// Compared by address: two descriptors with the same name are still
/// distinct classes.
pub struct ProxyClass {
    name: &'static str,
    parent: Option<&'static ProxyClass>,
}

impl ProxyClass {
    /// Declare a class deriving from `parent`
    pub const fn new(name: &'static str, parent: &'static ProxyClass) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Runtime type name this class stands for
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent, `None` only for [`OBJECT`]
    pub fn parent(&self) -> Option<&'static ProxyClass> {
        self.parent
    }

    /// Whether `self` is `other` or derives from it
    pub fn is_subclass_of(&self, other: &ProxyClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if ptr::eq(class, other) {
                return true;
            }
            current = class.parent;
        }
        false
    }

    /// Number of steps to the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(class) = current {
            depth += 1;
            current = class.parent;
        }
        depth
    }
}

impl PartialEq for ProxyClass {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ProxyClass {}

impl fmt::Debug for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyClass({})", self.name)
    }
}

impl fmt::Display for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Root of every class chain; the class of an untyped [`JsRef`].
pub static OBJECT: ProxyClass = ProxyClass::root("Object");

/// A typed view of a proxy.
pub trait JsClass: Clone + Send + Sync + Sized + 'static {
    /// Class this view stands for
    fn class() -> &'static ProxyClass;

    /// Wrap a proxy without checking its class. Use [`JsRef::cast`] for a
    /// checked conversion.
    fn from_ref(proxy: JsRef) -> Self;

    /// The underlying untyped proxy
    fn js_ref(&self) -> &JsRef;
}

/// Declare typed proxy classes.
///
/// ```ignore
/// js_class! {
///     /// A LiveKit room
///     pub struct Room => ROOM("Room") extends jsref::OBJECT;
///     pub struct ConnectionError => CONNECTION_ERROR("ConnectionError") extends jsref::ERROR;
/// }
/// ```
///
/// Each entry defines a `static` [`ProxyClass`] and a newtype over
/// [`JsRef`] implementing [`JsClass`] and `Deref<Target = JsRef>`.
#[macro_export]
macro_rules! js_class {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $class:ident($js_name:literal) extends $parent:path;
    )+) => {$(
        #[doc = concat!("Class descriptor for `", $js_name, "`")]
        $vis static $class: $crate::ProxyClass = $crate::ProxyClass::new($js_name, &$parent);

        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        $vis struct $name($crate::JsRef);

        impl $crate::JsClass for $name {
            fn class() -> &'static $crate::ProxyClass {
                &$class
            }

            fn from_ref(proxy: $crate::JsRef) -> Self {
                $name(proxy)
            }

            fn js_ref(&self) -> &$crate::JsRef {
                &self.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::JsRef;

            fn deref(&self) -> &$crate::JsRef {
                &self.0
            }
        }

        impl ::std::convert::From<$name> for $crate::JsRef {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    )+};
}
