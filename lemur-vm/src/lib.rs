// lemur-vm - Bytecode compiler and virtual machine for the Lemur programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # lemur-vm
//!
//! Bytecode compiler and stack-based virtual machine for Lemur.
//!
//! This crate is the compiled execution model: `lemur-core`'s tree-walking
//! evaluator defines the reference semantics, and the compiler+VM pair here
//! is validated against it. Code is compiled in a single pass to a flat
//! instruction stream plus a constants pool, then executed on a value
//! stack with explicit call frames.
//!
//! # Quick Start
//!
//! ```
//! use lemur_parser::Parser;
//! use lemur_vm::{Compiler, VM};
//!
//! let program = Parser::parse_source("let x = 2; x * 21").unwrap();
//! let mut compiler = Compiler::new();
//! compiler.compile(&program).unwrap();
//!
//! let mut vm = VM::new(compiler.bytecode());
//! vm.run().unwrap();
//! assert_eq!(vm.last_popped().to_string(), "42");
//! ```

pub mod compiler;
pub mod frame;
pub mod symbol_table;
pub mod vm;

pub use compiler::{Bytecode, CompileError, Compiler};
pub use frame::Frame;
pub use symbol_table::{Symbol, SymbolScope, SymbolTable};
pub use vm::{RuntimeError, GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE, VM};
