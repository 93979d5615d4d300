// lemur-core - Tree-walking evaluator for Lemur
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tree-walking evaluator for Lemur.
//!
//! This is the reference semantics for the language: the bytecode compiler
//! and VM are validated against it. Errors are threaded as `Value::Error`
//! objects and `return` unwinds through blocks as `Value::ReturnValue`,
//! both stripped at the program or function-body boundary.

use std::rc::Rc;

use im::{OrdMap, Vector};
use lemur_parser::ast::{BlockStatement, Expression, InfixOp, PrefixOp, Program, Statement};

use crate::builtins;
use crate::env::Env;
use crate::value::{FunctionObj, HashPair, Value, FALSE, NULL, TRUE};

/// Evaluate a program in the given environment.
///
/// The result is the value of the last statement, with `return` values
/// unwrapped and errors reported as `Value::Error`.
pub fn eval_program(program: &Program, env: &Env) -> Value {
    let mut result = NULL;
    for statement in &program.statements {
        result = eval_statement(statement, env);
        match &result {
            Value::ReturnValue(value) => return value.as_ref().clone(),
            Value::Error(_) => return result,
            _ => {}
        }
    }
    result
}

fn eval_statement(statement: &Statement, env: &Env) -> Value {
    match statement {
        Statement::Expression(expression) => eval_expression(expression, env),
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.set(name.clone(), value);
            NULL
        }
        Statement::Return(expression) => {
            let value = eval_expression(expression, env);
            if value.is_error() {
                return value;
            }
            Value::ReturnValue(Rc::new(value))
        }
    }
}

/// Evaluate a block. Unlike `eval_program`, return values and errors pass
/// through unwrapped so they keep unwinding through enclosing blocks.
fn eval_block(block: &BlockStatement, env: &Env) -> Value {
    let mut result = NULL;
    for statement in &block.statements {
        result = eval_statement(statement, env);
        if matches!(result, Value::ReturnValue(_) | Value::Error(_)) {
            return result;
        }
    }
    result
}

fn eval_expression(expression: &Expression, env: &Env) -> Value {
    match expression {
        Expression::Integer(n) => Value::Integer(*n),
        Expression::Str(s) => Value::string(s),
        Expression::Boolean(b) => {
            if *b {
                TRUE
            } else {
                FALSE
            }
        }
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix { op, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix(*op, &right)
        }
        Expression::Infix { op, left, right } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix(*op, &left, &right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block(consequence, env)
            } else {
                match alternative {
                    Some(alternative) => eval_block(alternative, env),
                    None => NULL,
                }
            }
        }
        Expression::Function {
            parameters, body, ..
        } => Value::Function(Rc::new(FunctionObj {
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        })),
        Expression::Call {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env);
            if function.is_error() {
                return function;
            }
            let arguments = match eval_expressions(arguments, env) {
                Ok(arguments) => arguments,
                Err(error) => return error,
            };
            apply_function(&function, arguments)
        }
        Expression::Array(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Value::Array(elements.into_iter().collect::<Vector<_>>()),
            Err(error) => error,
        },
        Expression::Hash(pairs) => eval_hash_literal(pairs, env),
        Expression::Index { left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index(&left, &index)
        }
    }
}

fn eval_identifier(name: &str, env: &Env) -> Value {
    if let Some(value) = env.get(name) {
        return value;
    }
    if let Some(builtin) = builtins::lookup(name) {
        return Value::Builtin(builtin);
    }
    Value::error(format!("identifier not found: {}", name))
}

fn eval_prefix(op: PrefixOp, right: &Value) -> Value {
    match op {
        PrefixOp::Bang => Value::Boolean(!right.is_truthy()),
        PrefixOp::Neg => match right {
            Value::Integer(n) => Value::Integer(n.wrapping_neg()),
            other => Value::error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(op: InfixOp, left: &Value, right: &Value) -> Value {
    match (op, left, right) {
        (_, Value::Integer(a), Value::Integer(b)) => eval_integer_infix(op, *a, *b),
        (InfixOp::Add, Value::Str(a), Value::Str(b)) => Value::string(format!("{}{}", a, b)),
        (InfixOp::Eq, _, _) => Value::Boolean(left.runtime_eq(right)),
        (InfixOp::NotEq, _, _) => Value::Boolean(!left.runtime_eq(right)),
        _ => {
            if left.type_name() != right.type_name() {
                Value::error(format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                ))
            } else {
                Value::error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                ))
            }
        }
    }
}

/// Integer arithmetic wraps on overflow (two's-complement).
fn eval_integer_infix(op: InfixOp, a: i64, b: i64) -> Value {
    match op {
        InfixOp::Add => Value::Integer(a.wrapping_add(b)),
        InfixOp::Sub => Value::Integer(a.wrapping_sub(b)),
        InfixOp::Mul => Value::Integer(a.wrapping_mul(b)),
        InfixOp::Div => {
            if b == 0 {
                Value::error("division by zero")
            } else {
                Value::Integer(a.wrapping_div(b))
            }
        }
        InfixOp::Lt => Value::Boolean(a < b),
        InfixOp::Gt => Value::Boolean(a > b),
        InfixOp::Eq => Value::Boolean(a == b),
        InfixOp::NotEq => Value::Boolean(a != b),
    }
}

fn eval_expressions(
    expressions: &[Expression],
    env: &Env,
) -> std::result::Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let value = eval_expression(expression, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

/// Call a function value with already-evaluated arguments.
pub fn apply_function(function: &Value, arguments: Vec<Value>) -> Value {
    match function {
        Value::Function(func) => {
            if arguments.len() != func.parameters.len() {
                return Value::error(format!(
                    "wrong number of arguments: want={}, got={}",
                    func.parameters.len(),
                    arguments.len()
                ));
            }
            let env = Env::new_enclosed(&func.env);
            for (parameter, argument) in func.parameters.iter().zip(arguments) {
                env.set(parameter.clone(), argument);
            }
            match eval_block(&func.body, &env) {
                Value::ReturnValue(value) => value.as_ref().clone(),
                other => other,
            }
        }
        Value::Builtin(builtin) => (builtin.func)(&arguments),
        other => Value::error(format!("not a function: {}", other.type_name())),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Env) -> Value {
    let mut entries = OrdMap::new();
    for (key_expression, value_expression) in pairs {
        let key = eval_expression(key_expression, env);
        if key.is_error() {
            return key;
        }
        let hash_key = match key.hash_key() {
            Some(hash_key) => hash_key,
            None => {
                return Value::error(format!("unusable as hash key: {}", key.type_name()));
            }
        };
        let value = eval_expression(value_expression, env);
        if value.is_error() {
            return value;
        }
        entries.insert(hash_key, HashPair { key, value });
    }
    Value::Hash(entries)
}

fn eval_index(left: &Value, index: &Value) -> Value {
    match (left, index) {
        (Value::Array(elements), Value::Integer(i)) => {
            if *i < 0 {
                return NULL;
            }
            elements.get(*i as usize).cloned().unwrap_or(NULL)
        }
        (Value::Hash(entries), _) => match index.hash_key() {
            Some(hash_key) => entries
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(NULL),
            None => Value::error(format!("unusable as hash key: {}", index.type_name())),
        },
        _ => Value::error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}
