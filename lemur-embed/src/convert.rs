// lemur-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type conversion between Rust and Lemur values.
//!
//! This module provides the [`IntoLemur`] and [`FromLemur`] traits for
//! converting between Rust types and [`Value`].
//!
//! # Built-in Conversions
//!
//! | Rust Type | Lemur Type |
//! |-----------|------------|
//! | `()` | `null` |
//! | `bool` | `boolean` |
//! | `i32`, `i64`, `usize` | `integer` |
//! | `String`, `&str` | `string` |
//! | `Vec<T>` | `array` |
//! | `Option<T>` | `T` or `null` |

use std::fmt;

use im::Vector;
use lemur_core::{Value, NULL};

/// Error converting a Lemur value into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    pub expected: &'static str,
    pub got: &'static str,
}

impl ConvertError {
    fn new(expected: &'static str, got: &'static str) -> ConvertError {
        ConvertError { expected, got }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.got, self.expected)
    }
}

impl std::error::Error for ConvertError {}

/// Result type for conversions.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Convert a Rust type into a `Value`.
pub trait IntoLemur {
    fn into_lemur(self) -> Value;
}

/// Convert a `Value` into a Rust type.
pub trait FromLemur: Sized {
    fn from_lemur(value: &Value) -> Result<Self>;
}

// ============================================================================
// IntoLemur implementations
// ============================================================================

impl IntoLemur for Value {
    fn into_lemur(self) -> Value {
        self
    }
}

impl IntoLemur for () {
    fn into_lemur(self) -> Value {
        NULL
    }
}

impl IntoLemur for bool {
    fn into_lemur(self) -> Value {
        Value::Boolean(self)
    }
}

impl IntoLemur for i64 {
    fn into_lemur(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoLemur for i32 {
    fn into_lemur(self) -> Value {
        Value::Integer(self as i64)
    }
}

impl IntoLemur for usize {
    fn into_lemur(self) -> Value {
        Value::Integer(self as i64)
    }
}

impl IntoLemur for String {
    fn into_lemur(self) -> Value {
        Value::string(self)
    }
}

impl IntoLemur for &str {
    fn into_lemur(self) -> Value {
        Value::string(self)
    }
}

impl<T: IntoLemur> IntoLemur for Vec<T> {
    fn into_lemur(self) -> Value {
        Value::Array(
            self.into_iter()
                .map(IntoLemur::into_lemur)
                .collect::<Vector<_>>(),
        )
    }
}

impl<T: IntoLemur> IntoLemur for Option<T> {
    fn into_lemur(self) -> Value {
        match self {
            Some(value) => value.into_lemur(),
            None => NULL,
        }
    }
}

// ============================================================================
// FromLemur implementations
// ============================================================================

impl FromLemur for Value {
    fn from_lemur(value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}

impl FromLemur for () {
    fn from_lemur(value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            other => Err(ConvertError::new("NULL", other.type_name())),
        }
    }
}

impl FromLemur for bool {
    fn from_lemur(value: &Value) -> Result<bool> {
        match value {
            Value::Boolean(b) => Ok(*b),
            other => Err(ConvertError::new("BOOLEAN", other.type_name())),
        }
    }
}

impl FromLemur for i64 {
    fn from_lemur(value: &Value) -> Result<i64> {
        match value {
            Value::Integer(n) => Ok(*n),
            other => Err(ConvertError::new("INTEGER", other.type_name())),
        }
    }
}

impl FromLemur for String {
    fn from_lemur(value: &Value) -> Result<String> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(ConvertError::new("STRING", other.type_name())),
        }
    }
}

impl<T: FromLemur> FromLemur for Vec<T> {
    fn from_lemur(value: &Value) -> Result<Vec<T>> {
        match value {
            Value::Array(elements) => elements.iter().map(T::from_lemur).collect(),
            other => Err(ConvertError::new("ARRAY", other.type_name())),
        }
    }
}

impl<T: FromLemur> FromLemur for Option<T> {
    fn from_lemur(value: &Value) -> Result<Option<T>> {
        match value {
            Value::Null => Ok(None),
            other => T::from_lemur(other).map(Some),
        }
    }
}
