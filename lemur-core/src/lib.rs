// lemur-core - Object model, bytecode encoding and evaluator for Lemur
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # lemur-core
//!
//! The shared heart of the Lemur toolchain: the runtime object model, the
//! bytecode instruction encoding, the builtin function registry, and the
//! tree-walking reference evaluator.
//!
//! The bytecode compiler and VM live in `lemur-vm`; both execution engines
//! operate on the [`Value`] type defined here.
//!
//! # Quick Start
//!
//! ```
//! use lemur_core::{eval_program, Env};
//! use lemur_parser::Parser;
//!
//! let program = Parser::parse_source("let x = 2; x * 21").unwrap();
//! let env = Env::new();
//! assert_eq!(eval_program(&program, &env).to_string(), "42");
//! ```

pub mod builtins;
pub mod code;
pub mod env;
pub mod eval;
pub mod value;

pub use builtins::BUILTINS;
pub use code::{Instructions, Op};
pub use env::Env;
pub use eval::{apply_function, eval_program};
pub use value::{
    Builtin, Closure, CompiledFunction, FunctionObj, HashKey, HashPair, Value, FALSE, NULL, TRUE,
};
