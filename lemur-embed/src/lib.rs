// lemur-embed - Embedding API for the Lemur programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # lemur-embed
//!
//! High-level embedding API for Lemur.
//!
//! [`Engine`] wraps the parser, compiler, VM and tree-walking evaluator
//! behind a handful of methods, and keeps the cross-input state (globals,
//! constants, symbol table) alive so bindings persist between calls.
//!
//! # Quick Start
//!
//! ```
//! use lemur_embed::Engine;
//!
//! let mut engine = Engine::new();
//! engine.run("let double = fn(x) { x * 2 };").unwrap();
//! let result = engine.run("double(21)").unwrap();
//! assert_eq!(result.to_string(), "42");
//! ```

pub mod convert;
pub mod engine;

pub use convert::{ConvertError, FromLemur, IntoLemur};
pub use engine::{Engine, EngineError};

// Re-export the value type for convenience.
pub use lemur_core::Value;
