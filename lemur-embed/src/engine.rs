// lemur-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Lemur.

use std::fmt;
use std::mem;

use lemur_core::builtins::BUILTINS;
use lemur_core::{eval_program, Env, Value, NULL};
use lemur_parser::{ParseError, Parser};
use lemur_vm::{
    CompileError, Compiler, RuntimeError, SymbolScope, SymbolTable, GLOBALS_SIZE, VM,
};

use crate::convert::{FromLemur, IntoLemur};

/// Error from any phase of running a piece of source.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Parse(ParseError),
    Compile(CompileError),
    Runtime(RuntimeError),
    /// An error object produced by the tree-walking evaluator.
    Eval(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse(e) => write!(f, "parse error: {}", e),
            EngineError::Compile(e) => write!(f, "compile error: {}", e),
            EngineError::Runtime(e) => write!(f, "runtime error: {}", e),
            EngineError::Eval(message) => write!(f, "runtime error: {}", message),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The Lemur scripting engine.
///
/// `Engine` owns the state that survives across inputs - the global symbol
/// table, the constants pool, the globals vector, and the tree-walker's
/// environment - so a REPL or host application can feed it source a piece
/// at a time and bindings persist. A failed input leaves previously
/// defined bindings intact.
///
/// `Engine` is not thread-safe; create one per thread.
///
/// # Example
///
/// ```
/// use lemur_embed::Engine;
///
/// let mut engine = Engine::new();
/// engine.run("let a = 2;").unwrap();
/// let result = engine.run("a * 3").unwrap();
/// assert_eq!(result.to_string(), "6");
/// ```
pub struct Engine {
    symbol_table: SymbolTable,
    constants: Vec<Value>,
    globals: Vec<Value>,
    env: Env,
}

impl Engine {
    /// Create an engine with the builtins registered.
    #[must_use]
    pub fn new() -> Engine {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name);
        }
        Engine {
            symbol_table,
            constants: Vec::new(),
            globals: vec![NULL; GLOBALS_SIZE],
            env: Env::new(),
        }
    }

    /// Compile and run source on the VM; returns the value of the last
    /// expression statement.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let program = Parser::parse_source(source).map_err(EngineError::Parse)?;

        let mut compiler = Compiler::with_state(
            mem::take(&mut self.symbol_table),
            mem::take(&mut self.constants),
        );
        let compiled = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        let (symbol_table, constants) = compiler.into_state();
        self.symbol_table = symbol_table;
        self.constants = constants;
        compiled.map_err(EngineError::Compile)?;

        let mut vm = VM::with_globals(bytecode, mem::take(&mut self.globals));
        let ran = vm.run();
        let result = vm.last_popped();
        self.globals = vm.into_globals();
        ran.map_err(EngineError::Runtime)?;

        Ok(result)
    }

    /// Run source on the tree-walking evaluator instead of the VM. Uses a
    /// separate persistent environment; `run` and `eval` bindings do not
    /// mix.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let program = Parser::parse_source(source).map_err(EngineError::Parse)?;
        match eval_program(&program, &self.env) {
            Value::Error(message) => Err(EngineError::Eval(message.to_string())),
            value => Ok(value),
        }
    }

    /// Compile source and return the disassembly of its main-scope
    /// instructions, without running it or touching engine state.
    pub fn disassemble(&self, source: &str) -> Result<String> {
        let program = Parser::parse_source(source).map_err(EngineError::Parse)?;
        let mut compiler =
            Compiler::with_state(self.symbol_table.clone(), self.constants.clone());
        compiler.compile(&program).map_err(EngineError::Compile)?;
        Ok(compiler.bytecode().instructions.to_string())
    }

    /// Define a global binding visible to compiled code.
    pub fn set_global(&mut self, name: &str, value: impl IntoLemur) {
        let symbol = self.symbol_table.define(name);
        self.globals[symbol.index] = value.into_lemur();
    }

    /// Read a global binding, if defined.
    #[must_use]
    pub fn get_global(&mut self, name: &str) -> Option<Value> {
        let symbol = self.symbol_table.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global => self.globals.get(symbol.index).cloned(),
            _ => None,
        }
    }

    /// Read a global binding converted to a Rust type. `None` if the name
    /// is undefined or the kind does not convert.
    #[must_use]
    pub fn get_global_as<T: FromLemur>(&mut self, name: &str) -> Option<T> {
        self.get_global(name)
            .and_then(|value| T::from_lemur(&value).ok())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
