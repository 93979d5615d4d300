// lemur-core - Lexical environments for the evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexical environments for the tree-walking evaluator.
//!
//! Environments form a tree linked by outer pointers. Function values keep
//! their defining environment alive through shared ownership, which is what
//! makes closures work; the resulting `Rc` cycles are accepted for the
//! lifetime of an interpreter session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A shared, mutable binding environment.
#[derive(Debug, Clone, Default)]
pub struct Env(Rc<RefCell<EnvInner>>);

#[derive(Debug, Default)]
struct EnvInner {
    store: HashMap<String, Value>,
    outer: Option<Env>,
}

impl Env {
    /// Create a fresh top-level environment.
    #[must_use]
    pub fn new() -> Env {
        Env::default()
    }

    /// Create an environment enclosed by `outer`.
    #[must_use]
    pub fn new_enclosed(outer: &Env) -> Env {
        Env(Rc::new(RefCell::new(EnvInner {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Look up a name, walking outward through enclosing environments.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let inner = self.0.borrow();
        if let Some(value) = inner.store.get(name) {
            return Some(value.clone());
        }
        inner.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Bind a name in this environment.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().store.insert(name.into(), value);
    }
}
