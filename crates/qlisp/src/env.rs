//! Name-to-value environments.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{BuiltinFn, EnvRef, Value};

/// A binding scope with an optional parent.
///
/// Environments form a parent-linked chain; lookups walk toward the root,
/// and [`def`](Environment::def) binds at the root so a definition made
/// anywhere is visible everywhere. Environments are shared through
/// [`EnvRef`] handles because function values capture them.
#[derive(Debug, Default, PartialEq)]
pub struct Environment {
    parent: Option<EnvRef>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates an empty root environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty root environment behind a shared handle.
    pub fn new_ref() -> EnvRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Creates an empty child of `parent`.
    pub fn with_parent(parent: EnvRef) -> Self {
        Self {
            parent: Some(parent),
            bindings: HashMap::new(),
        }
    }

    /// Copies this environment: every binding is deep-copied, the parent
    /// chain is shared by reference.
    pub fn deep_copy(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            bindings: self
                .bindings
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Registers a builtin function under `name`.
    pub fn add_builtin(&mut self, name: &str, function: BuiltinFn) {
        self.put(name, Value::builtin(function));
    }

    /// Looks up `name` here and then along the parent chain, returning a
    /// copy of the bound value.
    ///
    /// A name that is bound nowhere yields an error value.
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.bindings.get(name) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => Value::error(format!("Unbound symbol '{}'!", name)),
        }
    }

    /// Binds `value` to `name` in this environment, shadowing any binding
    /// of the same name further up the chain.
    pub fn put(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Binds `value` to `name` in the root environment.
    pub fn def(&mut self, name: &str, value: Value) {
        match &self.parent {
            Some(parent) => parent.borrow_mut().def(name, value),
            None => self.put(name, value),
        }
    }
}
