//! Native function libraries
//!
//! The interpreter only sees a [`NativeRegistry`]; each submodule contributes
//! a table of [`NativeFn`]s.

use std::collections::HashMap;

use crate::error::{ErrorKind, Result};
use crate::value::{NativeFn, Value};

pub mod core;
pub mod quantum;
pub mod spiritual;

/// Name to native function mapping handed to the interpreter
#[derive(Debug, Clone, Default)]
pub struct NativeRegistry {
    natives: HashMap<String, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a native, replacing any previous one with the same name.
    pub fn register(&mut self, native: NativeFn) {
        self.natives.insert(native.name.clone(), native);
    }

    pub fn register_all(&mut self, natives: impl IntoIterator<Item = NativeFn>) {
        for native in natives {
            self.register(native);
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.natives.get(name)
    }

    pub fn len(&self) -> usize {
        self.natives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeFn> {
        self.natives.values()
    }
}

/// Registry with the core, quantum and spiritual libraries loaded
pub fn default_registry() -> NativeRegistry {
    let mut registry = NativeRegistry::new();
    registry.register_all(core::natives());
    registry.register_all(quantum::natives());
    registry.register_all(spiritual::natives());
    registry
}

// Argument helpers shared by the libraries. Arity is checked before a native
// runs, so required positions are always present.

pub(crate) fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64> {
    args[index].as_number(&format!("{}() expects a number", name))
}

/// Optional numeric argument; missing or null falls back to `default`.
pub(crate) fn opt_number_arg(name: &str, args: &[Value], index: usize, default: f64) -> Result<f64> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => number_arg(name, args, index),
    }
}

pub(crate) fn type_error(name: &str, expected: &str, got: &Value) -> crate::error::QbetError {
    ErrorKind::type_mismatch(format!("{}() expects {}", name, expected), expected, got.type_name()).into()
}
