//! Variable environment for QBET
//!
//! Scopes form a chain from the innermost block or call up to the root.
//! Closures keep their defining scope alive by holding an [`EnvRef`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ErrorKind, QbetError, Result};
use crate::value::Value;

/// Shared handle to a scope
pub type EnvRef = Rc<RefCell<Environment>>;

/// Variable environment with lexical scoping
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new root environment
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            parent: None,
        }
    }

    /// Create a child environment with parent scope
    pub fn with_parent(parent: EnvRef) -> Self {
        Self {
            values: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// A fresh root scope behind a shared handle
    pub fn new_ref() -> EnvRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// A fresh child of `parent` behind a shared handle
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_parent(Rc::clone(parent))))
    }

    /// Bind `name` in this scope, replacing any existing binding here
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look a name up, walking outwards to the root
    pub fn get(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            Err(QbetError::new(
                ErrorKind::UndefinedVariable(name.to_string()),
                None,
            ))
        }
    }

    /// Overwrite the nearest existing binding of `name`
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().set(name, value)
        } else {
            Err(QbetError::new(
                ErrorKind::UndefinedVariable(name.to_string()),
                None,
            ))
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.parent.as_ref().map_or(false, |parent| parent.borrow().exists(name))
    }

    /// Names bound directly in this scope, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }
}
