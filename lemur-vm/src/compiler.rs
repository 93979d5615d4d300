// lemur-vm - Bytecode compiler for Lemur
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Single-pass bytecode compiler: AST in, instructions and constants out.
//!
//! The compiler keeps a stack of compilation scopes, one per function
//! literal being compiled, each owning its growing instruction buffer and
//! remembering the last two emitted instructions so that `if`-arms and
//! function bodies can rewrite a trailing `Pop`. Jumps are emitted with a
//! `0xFFFF` placeholder operand and back-patched in place once the target
//! offset is known.

use std::fmt;
use std::mem;
use std::rc::Rc;

use lemur_core::builtins::BUILTINS;
use lemur_core::code::{self, Instructions, Op};
use lemur_core::value::{CompiledFunction, Value};
use lemur_parser::ast::{BlockStatement, Expression, InfixOp, PrefixOp, Program, Statement};

use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

/// Error during compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An identifier that resolves in no enclosing scope.
    UndefinedVariable(String),
    /// Constant pool overflow: the `Constant` operand is 16 bits.
    TooManyConstants,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedVariable(name) => {
                write!(f, "undefined variable {}", name)
            }
            CompileError::TooManyConstants => write!(f, "too many constants"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// The compiler's output: a flat instruction stream plus the constants it
/// refers to by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

/// The opcode and position of an already-emitted instruction.
#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Op,
    position: usize,
}

/// One function literal's in-progress instruction buffer.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// The Lemur bytecode compiler.
pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Compiler {
    /// Create a compiler with a fresh global scope and the builtin
    /// registry pre-defined.
    #[must_use]
    pub fn new() -> Compiler {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name);
        }
        Compiler::with_state(symbol_table, Vec::new())
    }

    /// Create a compiler that continues from existing state. A REPL threads
    /// the global symbol table and constants pool through successive
    /// inputs this way.
    #[must_use]
    pub fn with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Compiler {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
        }
    }

    /// Compile a program into the main scope.
    pub fn compile(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The compiled main-scope instructions and the constants pool.
    #[must_use]
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: Instructions(self.scopes[self.scope_index].instructions.clone()),
            constants: self.constants.clone(),
        }
    }

    /// Tear down the compiler, handing back the symbol table and constants
    /// for the next REPL input. Scope entry and exit are always paired, so
    /// the table is back at the root even after a failed compile.
    #[must_use]
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Expression(expression) => {
                self.compile_expression(expression)?;
                self.emit(Op::Pop, &[]);
            }
            Statement::Let { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(name);
                match symbol.scope {
                    SymbolScope::Global => self.emit(Op::SetGlobal, &[symbol.index]),
                    _ => self.emit(Op::SetLocal, &[symbol.index]),
                };
            }
            Statement::Return(expression) => {
                self.compile_expression(expression)?;
                self.emit(Op::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<()> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::Integer(n) => {
                let index = self.add_constant(Value::Integer(*n))?;
                self.emit(Op::Constant, &[index]);
            }
            Expression::Str(s) => {
                let index = self.add_constant(Value::string(s))?;
                self.emit(Op::Constant, &[index]);
            }
            Expression::Boolean(true) => {
                self.emit(Op::True, &[]);
            }
            Expression::Boolean(false) => {
                self.emit(Op::False, &[]);
            }
            Expression::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                self.load_symbol(&symbol);
            }
            Expression::Prefix { op, right } => {
                self.compile_expression(right)?;
                match op {
                    PrefixOp::Bang => self.emit(Op::Bang, &[]),
                    PrefixOp::Neg => self.emit(Op::Minus, &[]),
                };
            }
            Expression::Infix { op, left, right } => {
                // `<` has no opcode: swap the operands and emit GreaterThan.
                if *op == InfixOp::Lt {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(Op::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                match op {
                    InfixOp::Add => self.emit(Op::Add, &[]),
                    InfixOp::Sub => self.emit(Op::Sub, &[]),
                    InfixOp::Mul => self.emit(Op::Mul, &[]),
                    InfixOp::Div => self.emit(Op::Div, &[]),
                    InfixOp::Gt => self.emit(Op::GreaterThan, &[]),
                    InfixOp::Eq => self.emit(Op::Equal, &[]),
                    InfixOp::NotEq => self.emit(Op::NotEqual, &[]),
                    InfixOp::Lt => unreachable!("handled above"),
                };
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                self.compile_expression(condition)?;
                let jump_not_truthy = self.emit(Op::JumpNotTruthy, &[0xFFFF]);

                // Each arm leaves exactly one value: the statement `Pop`
                // after the arm's final expression is stripped.
                self.compile_block(consequence)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_pop();
                }
                let jump = self.emit(Op::Jump, &[0xFFFF]);

                let after_consequence = self.current_position();
                self.change_operand(jump_not_truthy, after_consequence);

                match alternative {
                    Some(alternative) => {
                        self.compile_block(alternative)?;
                        if self.last_instruction_is(Op::Pop) {
                            self.remove_last_pop();
                        }
                    }
                    None => {
                        self.emit(Op::Null, &[]);
                    }
                }
                let after_alternative = self.current_position();
                self.change_operand(jump, after_alternative);
            }
            Expression::Array(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Op::Array, &[elements.len()]);
            }
            Expression::Hash(pairs) => {
                // Entries compile in source-form order of their keys, so
                // output is deterministic. Iteration order is not
                // observable from the language.
                let mut ordered: Vec<&(Expression, Expression)> = pairs.iter().collect();
                ordered.sort_by_key(|(key, _)| key.to_string());
                for (key, value) in ordered {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2]);
            }
            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Op::Index, &[]);
            }
            Expression::Function {
                name,
                parameters,
                body,
            } => {
                self.compile_function_literal(name.as_deref(), parameters, body)?;
            }
            Expression::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Op::Call, &[arguments.len()]);
            }
        }
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        name: Option<&str>,
        parameters: &[String],
        body: &BlockStatement,
    ) -> Result<()> {
        self.enter_scope();
        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in parameters {
            self.symbol_table.define(parameter);
        }

        let compiled_body = self.compile_block(body);
        if compiled_body.is_ok() {
            // An expression-valued body returns its value; anything else
            // returns null.
            if self.last_instruction_is(Op::Pop) {
                self.replace_last_pop_with_return();
            }
            if !self.last_instruction_is(Op::ReturnValue) {
                self.emit(Op::Return, &[]);
            }
        }

        // Leave the scope unconditionally so entry and exit stay paired on
        // error paths too.
        let num_locals = self.symbol_table.num_definitions;
        let (instructions, free_symbols) = self.leave_scope();
        compiled_body?;

        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let function = CompiledFunction {
            instructions: Instructions(instructions),
            num_locals,
            num_parameters: parameters.len(),
        };
        let index = self.add_constant(Value::CompiledFunction(Rc::new(function)))?;
        self.emit(Op::Closure, &[index, free_symbols.len()]);
        Ok(())
    }

    /// Emit the load instruction for a symbol in the current scope.
    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Op::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Op::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Op::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Op::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Op::CurrentClosure, &[]),
        };
    }

    fn add_constant(&mut self, value: Value) -> Result<usize> {
        if self.constants.len() > u16::MAX as usize {
            return Err(CompileError::TooManyConstants);
        }
        self.constants.push(value);
        Ok(self.constants.len() - 1)
    }

    /// Emit an instruction into the current scope; returns its position.
    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let instruction = code::make(op, operands);
        let scope = &mut self.scopes[self.scope_index];
        let position = scope.instructions.len();
        scope.instructions.extend(instruction);
        scope.previous_instruction = scope.last_instruction.take();
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });
        position
    }

    fn current_position(&self) -> usize {
        self.scopes[self.scope_index].instructions.len()
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        self.scopes[self.scope_index]
            .last_instruction
            .map_or(false, |emitted| emitted.opcode == op)
    }

    /// Drop the trailing `Pop` emitted for an expression statement.
    fn remove_last_pop(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        let last = scope
            .last_instruction
            .take()
            .expect("remove_last_pop with no emitted instruction");
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction.take();
    }

    /// Rewrite the trailing `Pop` of a function body into `ReturnValue`.
    fn replace_last_pop_with_return(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        let last = scope
            .last_instruction
            .as_mut()
            .expect("replace_last_pop_with_return with no emitted instruction");
        let position = last.position;
        last.opcode = Op::ReturnValue;
        let replacement = code::make(Op::ReturnValue, &[]);
        self.replace_instruction(position, &replacement);
    }

    /// Overwrite the instruction at `position` in place. The replacement
    /// must have the same width as the original.
    fn replace_instruction(&mut self, position: usize, replacement: &[u8]) {
        let instructions = &mut self.scopes[self.scope_index].instructions;
        instructions[position..position + replacement.len()].copy_from_slice(replacement);
    }

    /// Back-patch the operand of the jump at `position`.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let byte = self.scopes[self.scope_index].instructions[position];
        let op = Op::from_byte(byte).expect("change_operand on a non-instruction byte");
        let replacement = code::make(op, &[operand]);
        self.replace_instruction(position, &replacement);
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.scope_index += 1;
        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    /// Pop the current compilation scope and symbol table, returning the
    /// scope's instructions and capture list.
    fn leave_scope(&mut self) -> (Vec<u8>, Vec<Symbol>) {
        let scope = self
            .scopes
            .pop()
            .expect("leave_scope without matching enter_scope");
        self.scope_index -= 1;
        let free_symbols = self.symbol_table.pop();
        (scope.instructions, free_symbols)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
