//! Type name table
//!
//! Static mapping from the runtime-reported constructor name to the proxy
//! class to instantiate. Built once at startup and frozen; the bridge only
//! ever reads it.

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

use crate::builtins::{BOOLEAN, ERROR, NUMBER, STRING};
use crate::class::ProxyClass;

static BUILTIN_TABLE: LazyLock<Arc<TypeNameTable>> =
    LazyLock::new(|| Arc::new(TypeNameTable::builder().with_builtins().build()));

/// Immutable name -> class table
#[derive(Debug, Default)]
pub struct TypeNameTable {
    classes: FxHashMap<&'static str, &'static ProxyClass>,
}

impl TypeNameTable {
    /// Start building a table (empty)
    pub fn builder() -> TypeNameTableBuilder {
        TypeNameTableBuilder::default()
    }

    /// Shared table holding only the built-in classes
    pub fn builtin() -> Arc<TypeNameTable> {
        Arc::clone(&BUILTIN_TABLE)
    }

    /// Class registered under `name`
    pub fn get(&self, name: &str) -> Option<&'static ProxyClass> {
        self.classes.get(name).copied()
    }

    /// Whether `name` is mapped
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of mapped names
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All (name, class) pairs, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static ProxyClass)> + '_ {
        self.classes.iter().map(|(name, class)| (*name, *class))
    }
}

/// Builder for [`TypeNameTable`]
#[derive(Debug, Default)]
pub struct TypeNameTableBuilder {
    classes: FxHashMap<&'static str, &'static ProxyClass>,
}

impl TypeNameTableBuilder {
    /// Map the built-in classes (`Number`, `String`, `Boolean`, `Error`)
    pub fn with_builtins(self) -> Self {
        self.register(&NUMBER)
            .register(&STRING)
            .register(&BOOLEAN)
            .register(&ERROR)
    }

    /// Map `class` under its own name. A later registration of the same name
    /// wins.
    pub fn register(self, class: &'static ProxyClass) -> Self {
        self.alias(class.name(), class)
    }

    /// Map `class` under a different runtime name
    pub fn alias(mut self, name: &'static str, class: &'static ProxyClass) -> Self {
        self.classes.insert(name, class);
        self
    }

    /// Freeze the table
    pub fn build(self) -> TypeNameTable {
        TypeNameTable {
            classes: self.classes,
        }
    }
}
