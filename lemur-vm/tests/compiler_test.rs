// lemur-vm - Compiler integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the bytecode compiler: source in, exact
//! instruction streams and constants out.

use std::rc::Rc;

use lemur_core::code::{make, Instructions, Op};
use lemur_core::value::{CompiledFunction, Value};
use lemur_parser::Parser;
use lemur_vm::{Bytecode, CompileError, Compiler};

/// Expected constant-pool entry.
enum Constant {
    Int(i64),
    Str(&'static str),
    Function(Vec<Vec<u8>>),
}

fn compile(source: &str) -> Bytecode {
    let program = Parser::parse_source(source)
        .unwrap_or_else(|e| panic!("parse error on {:?}: {}", source, e));
    let mut compiler = Compiler::new();
    compiler
        .compile(&program)
        .unwrap_or_else(|e| panic!("compile error on {:?}: {}", source, e));
    compiler.bytecode()
}

fn compile_err(source: &str) -> CompileError {
    let program = Parser::parse_source(source).expect("parse");
    let mut compiler = Compiler::new();
    compiler
        .compile(&program)
        .expect_err("expected compile error")
}

fn concat(parts: Vec<Vec<u8>>) -> Instructions {
    Instructions(parts.into_iter().flatten().collect())
}

fn check(source: &str, expected_constants: Vec<Constant>, expected_instructions: Vec<Vec<u8>>) {
    let bytecode = compile(source);

    let expected = concat(expected_instructions);
    assert_eq!(
        bytecode.instructions, expected,
        "wrong instructions for {:?}\nwant:\n{}\ngot:\n{}",
        source, expected, bytecode.instructions
    );

    assert_eq!(
        bytecode.constants.len(),
        expected_constants.len(),
        "wrong number of constants for {:?}: {:?}",
        source,
        bytecode.constants
    );
    for (index, expected_constant) in expected_constants.iter().enumerate() {
        let got = &bytecode.constants[index];
        match expected_constant {
            Constant::Int(n) => assert_eq!(got, &Value::Integer(*n), "constant {}", index),
            Constant::Str(s) => assert_eq!(got, &Value::string(s), "constant {}", index),
            Constant::Function(parts) => {
                let func: &Rc<CompiledFunction> = match got {
                    Value::CompiledFunction(func) => func,
                    other => panic!("constant {} is not a function: {:?}", index, other),
                };
                let expected = concat(parts.clone());
                assert_eq!(
                    func.instructions, expected,
                    "wrong function instructions at constant {} for {:?}\nwant:\n{}\ngot:\n{}",
                    index, source, expected, func.instructions
                );
            }
        }
    }
}

// =============================================================================
// Arithmetic and literals
// =============================================================================

#[test]
fn test_integer_arithmetic() {
    check(
        "1 + 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Add, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "1; 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Pop, &[]),
            make(Op::Constant, &[1]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "1 - 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Sub, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "1 * 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Mul, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "2 / 1",
        vec![Constant::Int(2), Constant::Int(1)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Div, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "-1",
        vec![Constant::Int(1)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Minus, &[]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_boolean_expressions() {
    check("true", vec![], vec![make(Op::True, &[]), make(Op::Pop, &[])]);
    check(
        "false",
        vec![],
        vec![make(Op::False, &[]), make(Op::Pop, &[])],
    );
    check(
        "1 > 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::GreaterThan, &[]),
            make(Op::Pop, &[]),
        ],
    );
    // `<` compiles to GreaterThan with the operands swapped.
    check(
        "1 < 2",
        vec![Constant::Int(2), Constant::Int(1)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::GreaterThan, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "1 == 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Equal, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "1 != 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::NotEqual, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "true == false",
        vec![],
        vec![
            make(Op::True, &[]),
            make(Op::False, &[]),
            make(Op::Equal, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "!true",
        vec![],
        vec![make(Op::True, &[]), make(Op::Bang, &[]), make(Op::Pop, &[])],
    );
}

#[test]
fn test_string_expressions() {
    check(
        "\"lemur\"",
        vec![Constant::Str("lemur")],
        vec![make(Op::Constant, &[0]), make(Op::Pop, &[])],
    );
    check(
        "\"le\" + \"mur\"",
        vec![Constant::Str("le"), Constant::Str("mur")],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Add, &[]),
            make(Op::Pop, &[]),
        ],
    );
}

// =============================================================================
// Conditionals and jump back-patching
// =============================================================================

#[test]
fn test_conditional_without_alternative() {
    check(
        "if (true) { 10 }; 3333;",
        vec![Constant::Int(10), Constant::Int(3333)],
        vec![
            // 0000
            make(Op::True, &[]),
            // 0001
            make(Op::JumpNotTruthy, &[10]),
            // 0004
            make(Op::Constant, &[0]),
            // 0007
            make(Op::Jump, &[11]),
            // 0010
            make(Op::Null, &[]),
            // 0011
            make(Op::Pop, &[]),
            // 0012
            make(Op::Constant, &[1]),
            // 0015
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_conditional_with_alternative() {
    check(
        "if (true) { 10 } else { 20 }; 3333;",
        vec![Constant::Int(10), Constant::Int(20), Constant::Int(3333)],
        vec![
            // 0000
            make(Op::True, &[]),
            // 0001
            make(Op::JumpNotTruthy, &[10]),
            // 0004
            make(Op::Constant, &[0]),
            // 0007
            make(Op::Jump, &[13]),
            // 0010
            make(Op::Constant, &[1]),
            // 0013
            make(Op::Pop, &[]),
            // 0014
            make(Op::Constant, &[2]),
            // 0017
            make(Op::Pop, &[]),
        ],
    );
}

// =============================================================================
// Global bindings
// =============================================================================

#[test]
fn test_global_let_statements() {
    check(
        "let one = 1; let two = 2;",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::Constant, &[1]),
            make(Op::SetGlobal, &[1]),
        ],
    );
    check(
        "let one = 1; one;",
        vec![Constant::Int(1)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "let one = 1; let two = one; two;",
        vec![Constant::Int(1)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::SetGlobal, &[1]),
            make(Op::GetGlobal, &[1]),
            make(Op::Pop, &[]),
        ],
    );
}

// =============================================================================
// Composite literals and indexing
// =============================================================================

#[test]
fn test_array_literals() {
    check("[]", vec![], vec![make(Op::Array, &[0]), make(Op::Pop, &[])]);
    check(
        "[1, 2, 3]",
        vec![Constant::Int(1), Constant::Int(2), Constant::Int(3)],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Array, &[3]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "[1 + 2, 3 - 4, 5 * 6]",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Int(3),
            Constant::Int(4),
            Constant::Int(5),
            Constant::Int(6),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Add, &[]),
            make(Op::Constant, &[2]),
            make(Op::Constant, &[3]),
            make(Op::Sub, &[]),
            make(Op::Constant, &[4]),
            make(Op::Constant, &[5]),
            make(Op::Mul, &[]),
            make(Op::Array, &[3]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_hash_literals() {
    check("{}", vec![], vec![make(Op::Hash, &[0]), make(Op::Pop, &[])]);
    check(
        "{1: 2, 3: 4, 5: 6}",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Int(3),
            Constant::Int(4),
            Constant::Int(5),
            Constant::Int(6),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Constant, &[3]),
            make(Op::Constant, &[4]),
            make(Op::Constant, &[5]),
            make(Op::Hash, &[6]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "{1: 2 + 3, 4: 5 * 6}",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Int(3),
            Constant::Int(4),
            Constant::Int(5),
            Constant::Int(6),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Add, &[]),
            make(Op::Constant, &[3]),
            make(Op::Constant, &[4]),
            make(Op::Constant, &[5]),
            make(Op::Mul, &[]),
            make(Op::Hash, &[4]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_hash_literal_entries_are_key_sorted() {
    // Entries compile ordered by the source form of the key, so output is
    // deterministic whatever the source order.
    check(
        "{\"b\": 1, \"a\": 2}",
        vec![
            Constant::Str("a"),
            Constant::Int(2),
            Constant::Str("b"),
            Constant::Int(1),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Constant, &[3]),
            make(Op::Hash, &[4]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_index_expressions() {
    check(
        "[1, 2, 3][1 + 1]",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Int(3),
            Constant::Int(1),
            Constant::Int(1),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Array, &[3]),
            make(Op::Constant, &[3]),
            make(Op::Constant, &[4]),
            make(Op::Add, &[]),
            make(Op::Index, &[]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "{1: 2}[2 - 1]",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Int(2),
            Constant::Int(1),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Hash, &[2]),
            make(Op::Constant, &[2]),
            make(Op::Constant, &[3]),
            make(Op::Sub, &[]),
            make(Op::Index, &[]),
            make(Op::Pop, &[]),
        ],
    );
}

// =============================================================================
// Functions, scopes and calls
// =============================================================================

#[test]
fn test_functions() {
    check(
        "fn() { return 5 + 10 }",
        vec![
            Constant::Int(5),
            Constant::Int(10),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::Constant, &[1]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[2, 0]), make(Op::Pop, &[])],
    );
    // An implicit final expression compiles identically: the trailing Pop
    // is rewritten to ReturnValue.
    check(
        "fn() { 5 + 10 }",
        vec![
            Constant::Int(5),
            Constant::Int(10),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::Constant, &[1]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[2, 0]), make(Op::Pop, &[])],
    );
    check(
        "fn() { 1; 2 }",
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::Pop, &[]),
                make(Op::Constant, &[1]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[2, 0]), make(Op::Pop, &[])],
    );
}

#[test]
fn test_function_without_return_value() {
    check(
        "fn() { }",
        vec![Constant::Function(vec![make(Op::Return, &[])])],
        vec![make(Op::Closure, &[0, 0]), make(Op::Pop, &[])],
    );
    check(
        "fn() { let a = 1; }",
        vec![
            Constant::Int(1),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::SetLocal, &[0]),
                make(Op::Return, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[1, 0]), make(Op::Pop, &[])],
    );
}

#[test]
fn test_function_calls() {
    check(
        "fn() { 24 }();",
        vec![
            Constant::Int(24),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![
            make(Op::Closure, &[1, 0]),
            make(Op::Call, &[0]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "let noArg = fn() { 24 }; noArg();",
        vec![
            Constant::Int(24),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![
            make(Op::Closure, &[1, 0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Call, &[0]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "let oneArg = fn(a) { a }; oneArg(24);",
        vec![
            Constant::Function(vec![
                make(Op::GetLocal, &[0]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Int(24),
        ],
        vec![
            make(Op::Closure, &[0, 0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Call, &[1]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "let manyArg = fn(a, b, c) { a; b; c }; manyArg(24, 25, 26);",
        vec![
            Constant::Function(vec![
                make(Op::GetLocal, &[0]),
                make(Op::Pop, &[]),
                make(Op::GetLocal, &[1]),
                make(Op::Pop, &[]),
                make(Op::GetLocal, &[2]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Int(24),
            Constant::Int(25),
            Constant::Int(26),
        ],
        vec![
            make(Op::Closure, &[0, 0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Constant, &[2]),
            make(Op::Constant, &[3]),
            make(Op::Call, &[3]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_let_statement_scopes() {
    check(
        "let num = 55; fn() { num }",
        vec![
            Constant::Int(55),
            Constant::Function(vec![
                make(Op::GetGlobal, &[0]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::Closure, &[1, 0]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "fn() { let num = 55; num }",
        vec![
            Constant::Int(55),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::SetLocal, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[1, 0]), make(Op::Pop, &[])],
    );
    check(
        "fn() { let a = 55; let b = 77; a + b }",
        vec![
            Constant::Int(55),
            Constant::Int(77),
            Constant::Function(vec![
                make(Op::Constant, &[0]),
                make(Op::SetLocal, &[0]),
                make(Op::Constant, &[1]),
                make(Op::SetLocal, &[1]),
                make(Op::GetLocal, &[0]),
                make(Op::GetLocal, &[1]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[2, 0]), make(Op::Pop, &[])],
    );
}

#[test]
fn test_function_metadata() {
    let bytecode = compile("fn(a, b) { let c = 1; a + b + c }");
    let func = match &bytecode.constants[1] {
        Value::CompiledFunction(func) => func,
        other => panic!("expected function constant, got {:?}", other),
    };
    assert_eq!(func.num_parameters, 2);
    assert_eq!(func.num_locals, 3);
}

#[test]
fn test_builtins() {
    check(
        "len([]); push([], 1);",
        vec![Constant::Int(1)],
        vec![
            make(Op::GetBuiltin, &[0]),
            make(Op::Array, &[0]),
            make(Op::Call, &[1]),
            make(Op::Pop, &[]),
            make(Op::GetBuiltin, &[5]),
            make(Op::Array, &[0]),
            make(Op::Constant, &[0]),
            make(Op::Call, &[2]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "fn() { len([]) }",
        vec![Constant::Function(vec![
            make(Op::GetBuiltin, &[0]),
            make(Op::Array, &[0]),
            make(Op::Call, &[1]),
            make(Op::ReturnValue, &[]),
        ])],
        vec![make(Op::Closure, &[0, 0]), make(Op::Pop, &[])],
    );
}

// =============================================================================
// Closures
// =============================================================================

#[test]
fn test_closures() {
    check(
        "fn(a) { fn(b) { a + b } }",
        vec![
            Constant::Function(vec![
                make(Op::GetFree, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Function(vec![
                make(Op::GetLocal, &[0]),
                make(Op::Closure, &[0, 1]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[1, 0]), make(Op::Pop, &[])],
    );
    check(
        "fn(a) { fn(b) { fn(c) { a + b + c } } }",
        vec![
            Constant::Function(vec![
                make(Op::GetFree, &[0]),
                make(Op::GetFree, &[1]),
                make(Op::Add, &[]),
                make(Op::GetLocal, &[0]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Function(vec![
                make(Op::GetFree, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::Closure, &[0, 2]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Function(vec![
                make(Op::GetLocal, &[0]),
                make(Op::Closure, &[1, 1]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![make(Op::Closure, &[2, 0]), make(Op::Pop, &[])],
    );
}

#[test]
fn test_closures_over_globals_and_locals() {
    check(
        "let global = 55; \
         fn() { let a = 66; fn() { let b = 77; fn() { let c = 88; global + a + b + c; } } }",
        vec![
            Constant::Int(55),
            Constant::Int(66),
            Constant::Int(77),
            Constant::Int(88),
            Constant::Function(vec![
                make(Op::Constant, &[3]),
                make(Op::SetLocal, &[0]),
                make(Op::GetGlobal, &[0]),
                make(Op::GetFree, &[0]),
                make(Op::Add, &[]),
                make(Op::GetFree, &[1]),
                make(Op::Add, &[]),
                make(Op::GetLocal, &[0]),
                make(Op::Add, &[]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Function(vec![
                make(Op::Constant, &[2]),
                make(Op::SetLocal, &[0]),
                make(Op::GetFree, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::Closure, &[4, 2]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Function(vec![
                make(Op::Constant, &[1]),
                make(Op::SetLocal, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::Closure, &[5, 1]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::Closure, &[6, 0]),
            make(Op::Pop, &[]),
        ],
    );
}

#[test]
fn test_recursive_functions() {
    check(
        "let countDown = fn(x) { countDown(x - 1); }; countDown(1);",
        vec![
            Constant::Int(1),
            Constant::Function(vec![
                make(Op::CurrentClosure, &[]),
                make(Op::GetLocal, &[0]),
                make(Op::Constant, &[0]),
                make(Op::Sub, &[]),
                make(Op::Call, &[1]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Int(1),
        ],
        vec![
            make(Op::Closure, &[1, 0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Constant, &[2]),
            make(Op::Call, &[1]),
            make(Op::Pop, &[]),
        ],
    );
    check(
        "let wrapper = fn() { \
           let countDown = fn(x) { countDown(x - 1); }; \
           countDown(1); \
         }; \
         wrapper();",
        vec![
            Constant::Int(1),
            Constant::Function(vec![
                make(Op::CurrentClosure, &[]),
                make(Op::GetLocal, &[0]),
                make(Op::Constant, &[0]),
                make(Op::Sub, &[]),
                make(Op::Call, &[1]),
                make(Op::ReturnValue, &[]),
            ]),
            Constant::Int(1),
            Constant::Function(vec![
                make(Op::Closure, &[1, 0]),
                make(Op::SetLocal, &[0]),
                make(Op::GetLocal, &[0]),
                make(Op::Constant, &[2]),
                make(Op::Call, &[1]),
                make(Op::ReturnValue, &[]),
            ]),
        ],
        vec![
            make(Op::Closure, &[3, 0]),
            make(Op::SetGlobal, &[0]),
            make(Op::GetGlobal, &[0]),
            make(Op::Call, &[0]),
            make(Op::Pop, &[]),
        ],
    );
}

// =============================================================================
// Errors and determinism
// =============================================================================

#[test]
fn test_undefined_variable() {
    assert_eq!(
        compile_err("foobar"),
        CompileError::UndefinedVariable("foobar".to_string())
    );
    assert_eq!(
        compile_err("fn() { undefinedInsideBody }"),
        CompileError::UndefinedVariable("undefinedInsideBody".to_string())
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let sources = [
        "let a = 1; let b = 2; a + b",
        "{\"b\": 1, \"a\": 2, \"c\": 3}",
        "let f = fn(x) { if (x < 2) { x } else { f(x - 1) } }; f(9)",
    ];
    for source in sources {
        let first = compile(source);
        let second = compile(source);
        assert_eq!(first.instructions, second.instructions, "source: {}", source);
        assert_eq!(first.constants, second.constants, "source: {}", source);
    }
}

#[test]
fn test_jump_targets_stay_in_bounds() {
    let sources = [
        "if (true) { 10 }",
        "if (1 < 2) { 10 } else { 20 }",
        "if (true) { if (false) { 1 } else { 2 } } else { 3 }",
        "fn(x) { if (x) { 1 } else { 2 } }",
    ];
    for source in sources {
        let bytecode = compile(source);
        assert_jumps_in_bounds(&bytecode.instructions, source);
        for constant in &bytecode.constants {
            if let Value::CompiledFunction(func) = constant {
                assert_jumps_in_bounds(&func.instructions, source);
            }
        }
    }
}

fn assert_jumps_in_bounds(instructions: &Instructions, source: &str) {
    let bytes: &[u8] = instructions;
    let mut offset = 0;
    while offset < bytes.len() {
        let op = Op::from_byte(bytes[offset]).expect("valid opcode");
        let def = op.definition();
        let (operands, read) = lemur_core::code::read_operands(&def, &bytes[offset + 1..]);
        if matches!(op, Op::Jump | Op::JumpNotTruthy) {
            assert!(
                operands[0] <= bytes.len(),
                "jump target {} out of bounds for {:?}",
                operands[0],
                source
            );
        }
        offset += 1 + read;
    }
}
