// lemur-vm - Symbol tables for the bytecode compiler
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Nested symbol tables.
//!
//! Each table classifies the names defined in one lexical scope and hands
//! out dense per-scope indices: globals index the VM's globals vector,
//! locals index frame slots, builtins index the builtin registry, and free
//! symbols index the running closure's capture list.
//!
//! Resolution walks outward. A hit in an enclosing function scope is
//! promoted to a `Free` symbol in the current table, which is how the
//! compiler discovers each function's capture list.

use std::collections::HashMap;
use std::mem;

/// Storage class of a resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    /// Top-level binding, lives in the VM's globals vector.
    Global,
    /// Frame-local binding at `base_pointer + index`.
    Local,
    /// One of the registered builtin functions.
    Builtin,
    /// Captured from an enclosing function; loaded from the closure.
    Free,
    /// The name of the function currently being compiled. Not a storage
    /// class: it compiles to `CurrentClosure`.
    Function,
}

/// A resolved name: its storage class and within-class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

/// One lexical scope's name table, linked to its enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub(crate) outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    /// Number of plain `define`s: globals at the root, locals elsewhere.
    pub num_definitions: usize,
    /// Captured symbols as seen by the enclosing scope, in first-capture
    /// order. Index i here matches the `Free` symbol with index i in
    /// `store`.
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Create the root (global) table.
    #[must_use]
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Create a table for a scope nested inside `outer`.
    #[must_use]
    pub fn new_enclosed(outer: SymbolTable) -> SymbolTable {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    /// Whether this is the root table.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// Define a name in this scope: global at the root, local elsewhere.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register a builtin at its registry index. Builtins are defined on
    /// the root table before any user code compiles.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Bind the name of the function whose body this table belongs to.
    /// References to it compile to `CurrentClosure`; parameters and locals
    /// with the same name shadow it.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Resolve a name, walking outward.
    ///
    /// Global and builtin symbols are visible from any depth unchanged.
    /// Anything else found in an enclosing table is captured: it is
    /// recorded in `free_symbols` and replaced by a `Free` symbol here, so
    /// repeated resolution is stable.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let symbol = self.outer.as_mut()?.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            _ => Some(self.define_free(symbol)),
        }
    }

    /// Drop this scope, returning the enclosing table and this scope's
    /// capture list. Must not be called on the root table.
    pub(crate) fn pop(&mut self) -> Vec<Symbol> {
        let table = mem::take(self);
        let outer = *table.outer.expect("symbol table underflow: pop on the root table");
        *self = outer;
        table.free_symbols
    }
}
