// lemur-core - Value types for Lemur
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Core value type for Lemur.
//!
//! `Value` is the central enum representing all runtime values, shared by
//! the tree-walking evaluator and the bytecode VM. Values are cheap to
//! clone: composites sit behind `Rc` or `im` persistent collections.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use im::{OrdMap, Vector};
use lemur_parser::ast::BlockStatement;

use crate::code::Instructions;
use crate::env::Env;

/// The canonical `true` value.
pub const TRUE: Value = Value::Boolean(true);
/// The canonical `false` value.
pub const FALSE: Value = Value::Boolean(false);
/// The canonical `null` value.
pub const NULL: Value = Value::Null;

/// A Lemur runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(Rc<str>),
    Array(Vector<Value>),
    /// Hash values are keyed by [`HashKey`]; each entry keeps the original
    /// key value alongside the stored value for display and lookup results.
    Hash(OrdMap<HashKey, HashPair>),
    /// A runtime error as a value. The evaluator threads these through
    /// directly; the VM promotes builtin-produced errors to runtime errors.
    Error(Rc<str>),
    /// Evaluator-internal wrapper that unwinds `return` through blocks.
    ReturnValue(Rc<Value>),
    /// An evaluator closure: parameters, body, and the captured environment.
    Function(Rc<FunctionObj>),
    /// Compiled code; lives only in the constants pool, never on the stack.
    CompiledFunction(Rc<CompiledFunction>),
    /// A compiled function plus its captured free values.
    Closure(Rc<Closure>),
    Builtin(Builtin),
}

/// An evaluator function object.
#[derive(Debug)]
pub struct FunctionObj {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Env,
}

/// Bytecode for one function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    /// Stack slots to reserve at the frame base (parameters included).
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function together with the values of its free variables.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// A native function callable from Lemur code.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    /// Invoked with the argument slice; an `Error` return signals failure.
    pub func: fn(&[Value]) -> Value,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// The kind tag inside a [`HashKey`]. Acts as the per-kind salt: keys of
/// different kinds can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKind {
    Integer,
    Boolean,
    Str,
}

/// A hash-map key derived from a hashable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey {
    kind: HashKind,
    raw: u64,
}

/// One entry of a hash value: the original key and the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Create an error value.
    pub fn error(message: impl AsRef<str>) -> Value {
        Value::Error(Rc::from(message.as_ref()))
    }

    /// Uppercase kind name, as used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Error(_) => "ERROR",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// Everything except `null` and `false` is truthy; `0` is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The hash key for this value, or `None` if the kind is not hashable.
    /// Only integers, booleans and strings are hashable.
    #[must_use]
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey {
                kind: HashKind::Integer,
                raw: *n as u64,
            }),
            Value::Boolean(b) => Some(HashKey {
                kind: HashKind::Boolean,
                raw: u64::from(*b),
            }),
            Value::Str(s) => {
                let mut hasher = DefaultHasher::new();
                s.as_bytes().hash(&mut hasher);
                Some(HashKey {
                    kind: HashKind::Str,
                    raw: hasher.finish(),
                })
            }
            _ => None,
        }
    }

    /// Equality as seen by the `==` operator in Lemur code.
    ///
    /// Integers, booleans and null compare by value; every other kind
    /// compares by reference identity. Both execution engines use this one
    /// function, so their observable semantics cannot drift.
    #[must_use]
    pub fn runtime_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Hash(a), Value::Hash(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

// Structural equality, used by tests and constant comparison. Runtime `==`
// semantics live in `runtime_eq`.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::ReturnValue(a), Value::ReturnValue(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            Value::Hash(entries) => {
                let pairs: Vec<String> = entries
                    .values()
                    .map(|p| format!("{}: {}", p.key, p.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::ReturnValue(inner) => write!(f, "{}", inner),
            Value::Function(_) | Value::Closure(_) => write!(f, "#<fn>"),
            Value::CompiledFunction(_) => write!(f, "#<compiled fn>"),
            Value::Builtin(builtin) => write!(f, "#<builtin {}>", builtin.name),
        }
    }
}
