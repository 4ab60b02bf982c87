//! Tree-walking interpreter for QBET
//!
//! Statements evaluate to a [`Flow`]: either a plain value or a `return`
//! travelling outwards to the nearest call boundary. Errors use the separate
//! `Err` channel, so a return can never be mistaken for a failure.

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::console::{Console, StdConsole};
use crate::environment::{EnvRef, Environment};
use crate::error::{ErrorKind, QbetError, Result};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::stack::ensure_sufficient_stack;
use crate::stdlib::{self, NativeRegistry};
use crate::token::Span;
use crate::value::{format_number, Closure, Value};

/// Default limit on nested user-function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Tunables for an interpreter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Calls nested deeper than this fail with a runtime error.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Result of executing a statement
#[derive(Debug)]
enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    console: Box<dyn Console>,
    config: InterpreterConfig,
    depth: usize,
}

impl Interpreter {
    /// Interpreter with the full standard library printing to stdout
    pub fn new() -> Self {
        Self::with_registry(
            stdlib::default_registry(),
            Box::new(StdConsole),
            InterpreterConfig::default(),
        )
    }

    pub fn with_console(console: Box<dyn Console>) -> Self {
        Self::with_registry(stdlib::default_registry(), console, InterpreterConfig::default())
    }

    /// Build an interpreter whose root scope holds every native in `registry`.
    pub fn with_registry(
        registry: NativeRegistry,
        console: Box<dyn Console>,
        config: InterpreterConfig,
    ) -> Self {
        let globals = Environment::new_ref();
        {
            let mut scope = globals.borrow_mut();
            for native in registry.iter() {
                scope.define(native.name.clone(), Value::NativeFunction(native.clone()));
            }
        }
        tracing::debug!(natives = registry.len(), ?config, "interpreter ready");

        Self {
            globals,
            console,
            config,
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    pub fn config(&self) -> InterpreterConfig {
        self.config
    }

    /// Lex, parse and run `source` in this interpreter's global scope.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let tokens = Lexer::new(source).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        self.interpret(&program)
    }

    /// Run a program; yields the value of the last top-level statement.
    pub fn interpret(&mut self, program: &Program) -> Result<Value> {
        self.depth = 0;
        let globals = Rc::clone(&self.globals);
        let mut last = Value::Null;

        for stmt in &program.statements {
            match self.execute(stmt, &globals)? {
                Flow::Normal(value) => last = value,
                Flow::Return(_) => {
                    return Err(QbetError::new(ErrorKind::ReturnOutsideFunction, Some(stmt.span())));
                }
            }
        }

        Ok(last)
    }

    // ==================== Statements ====================

    fn execute(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt, env))
    }

    fn execute_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Flow> {
        match stmt {
            Stmt::Expr { expr } => Ok(Flow::Normal(self.evaluate(expr, env)?)),

            Stmt::Block { stmts, .. } => {
                let scope = Environment::child(env);
                self.execute_block(stmts, &scope)
            }

            Stmt::If { condition, then_branch, else_branch, .. } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }

            Stmt::While { condition, body, .. } => {
                let mut last = Value::Null;
                while self.evaluate(condition, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Flow::Normal(value) => last = value,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(last))
            }

            Stmt::For { var, iterable, body, span } => {
                let items = match self.evaluate(iterable, env)? {
                    Value::Array(items) => {
                        let snapshot = items.borrow().clone();
                        snapshot
                    }
                    other => {
                        return Err(QbetError::new(
                            ErrorKind::type_mismatch(
                                "for loop target must be an array",
                                "array",
                                other.type_name(),
                            ),
                            Some(*span),
                        ));
                    }
                };

                let mut last = Value::Null;
                for item in items {
                    let scope = Environment::child(env);
                    scope.borrow_mut().define(var.clone(), item);
                    match self.execute(body, &scope)? {
                        Flow::Normal(value) => last = value,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(last))
            }

            Stmt::Function(decl) => {
                let function = Value::Function(Rc::new(Closure::new(Rc::clone(decl), Rc::clone(env))));
                env.borrow_mut().define(decl.name.clone(), function.clone());
                Ok(Flow::Normal(function))
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Import { module, alias, .. } => {
                // Imports are acknowledged only; nothing is loaded.
                tracing::debug!(module = %module, alias = ?alias, "import ignored");
                Ok(Flow::Normal(Value::Null))
            }
        }
    }

    fn execute_block(&mut self, stmts: &[Stmt], env: &EnvRef) -> Result<Flow> {
        let mut last = Value::Null;
        for stmt in stmts {
            match self.execute(stmt, env)? {
                Flow::Normal(value) => last = value,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    // ==================== Expressions ====================

    fn evaluate(&mut self, expr: &Expr, env: &EnvRef) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr, env))
    }

    fn evaluate_expr(&mut self, expr: &Expr, env: &EnvRef) -> Result<Value> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Number(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Null { .. } => Ok(Value::Null),

            Expr::Ident { name, span } => env.borrow().get(name).map_err(|e| e.or_span(*span)),

            Expr::Assign { name, value, .. } => {
                let value = self.evaluate(value, env)?;
                let exists = env.borrow().exists(name);
                if exists {
                    env.borrow_mut().set(name, value.clone())?;
                } else {
                    env.borrow_mut().define(name.clone(), value.clone());
                }
                Ok(value)
            }

            Expr::Binary { left, op, right, span } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary_op(*op, left, right).map_err(|e| e.or_span(*span))
            }

            Expr::Logical { left, op, right, .. } => {
                let left = self.evaluate(left, env)?;
                match op {
                    LogicalOp::And if !left.is_truthy() => Ok(left),
                    LogicalOp::Or if left.is_truthy() => Ok(left),
                    _ => self.evaluate(right, env),
                }
            }

            Expr::Unary { op, operand, span } => {
                let operand = self.evaluate(operand, env)?;
                match op {
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(QbetError::new(
                            ErrorKind::type_mismatch("unary '-' requires a number", "number", other.type_name()),
                            Some(*span),
                        )),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }

            Expr::Call { callee, args, span } => {
                let callee = self.evaluate(callee, env)?;
                let args = self.evaluate_all(args, env)?;
                self.call_value(callee, args, *span)
            }

            Expr::MethodCall { object, method, args, span } => {
                let object = self.evaluate(object, env)?;
                let args = self.evaluate_all(args, env)?;
                call_method(&object, method, &args).map_err(|e| e.or_span(*span))
            }

            Expr::Member { object, name, span } => {
                let object = self.evaluate(object, env)?;
                member(&object, name).map_err(|e| e.or_span(*span))
            }

            Expr::Array { elements, .. } => Ok(Value::array(self.evaluate_all(elements, env)?)),

            Expr::Index { object, index, span } => {
                let object = self.evaluate(object, env)?;
                let index = self.evaluate(index, env)?;
                index_value(&object, &index).map_err(|e| e.or_span(*span))
            }
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr], env: &EnvRef) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.evaluate(expr, env)).collect()
    }

    // ==================== Calls ====================

    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                tracing::trace!(name = %native.name, args = args.len(), "native call");
                native
                    .call(self.console.as_mut(), &args)
                    .map_err(|e| e.or_span(span))
            }
            Value::Function(closure) => self.call_function(&closure, args, span),
            other => Err(QbetError::new(
                ErrorKind::NotCallable(other.type_name().to_string()),
                Some(span),
            )),
        }
    }

    fn call_function(&mut self, closure: &Closure, args: Vec<Value>, span: Span) -> Result<Value> {
        let decl = &closure.decl;
        if args.len() != closure.arity() {
            return Err(QbetError::new(
                ErrorKind::WrongArity {
                    name: decl.name.clone(),
                    expected: closure.arity().to_string(),
                    got: args.len(),
                },
                Some(span),
            ));
        }

        if self.depth >= self.config.max_call_depth {
            return Err(QbetError::new(
                ErrorKind::CallDepthExceeded(self.config.max_call_depth),
                Some(span),
            ));
        }

        // Parent is the defining scope, not the caller's.
        let scope = Environment::child(&closure.env);
        {
            let mut frame = scope.borrow_mut();
            for (param, arg) in decl.params.iter().zip(args) {
                frame.define(param.clone(), arg);
            }
        }

        tracing::trace!(name = %decl.name, depth = self.depth, "call");
        self.depth += 1;
        let result = self.execute_block(&decl.body, &scope);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Operators ====================

fn binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (left @ Value::String(_), right) | (left, right @ Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            (left, right) => Err(operand_error(op, &left, &right)),
        },
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        _ => {
            let (a, b) = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => (*a, *b),
                _ => return Err(operand_error(op, &left, &right)),
            };
            let value = match op {
                BinaryOp::Sub => Value::Number(a - b),
                BinaryOp::Mul => Value::Number(a * b),
                BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
                    return Err(ErrorKind::DivisionByZero.into());
                }
                BinaryOp::Div => Value::Number(a / b),
                BinaryOp::Mod => Value::Number(a % b),
                BinaryOp::Pow => Value::Number(a.powf(b)),
                BinaryOp::Lt => Value::Bool(a < b),
                BinaryOp::Le => Value::Bool(a <= b),
                BinaryOp::Gt => Value::Bool(a > b),
                BinaryOp::Ge => Value::Bool(a >= b),
                BinaryOp::Add | BinaryOp::Eq | BinaryOp::Ne => return Err(operand_error(op, &left, &right)),
            };
            Ok(value)
        }
    }
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value) -> QbetError {
    let expected = if op == BinaryOp::Add { "numbers or a string" } else { "numbers" };
    ErrorKind::TypeMismatch {
        message: format!("invalid operands for '{}'", op),
        expected: Some(expected.to_string()),
        got: Some(format!("{} and {}", left.type_name(), right.type_name())),
    }
    .into()
}

fn index_value(object: &Value, index: &Value) -> Result<Value> {
    let items = match object {
        Value::Array(items) => items,
        other => {
            return Err(ErrorKind::type_mismatch("index access requires an array", "array", other.type_name()).into());
        }
    };
    let index = index.as_number("array index must be a number")?;
    if !index.is_finite() {
        return Err(ErrorKind::type_mismatch("array index must be finite", "finite number", &format_number(index)).into());
    }
    let index = index.trunc() as i64;
    let items = items.borrow();

    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .ok_or_else(|| ErrorKind::IndexOutOfRange { index, len: items.len() }.into())
}

fn member(object: &Value, name: &str) -> Result<Value> {
    let found = match (object, name) {
        (Value::Array(items), "length") => Some(Value::Number(items.borrow().len() as f64)),
        (Value::String(s), "length") => Some(Value::Number(s.chars().count() as f64)),
        (Value::Object(object), _) => object.member(name),
        _ => None,
    };
    found.ok_or_else(|| undefined_member(object, name))
}

fn call_method(object: &Value, method: &str, args: &[Value]) -> Result<Value> {
    match (object, method) {
        (Value::Array(items), "push") => {
            expect_args(method, args, 1)?;
            items.borrow_mut().push(args[0].clone());
            Ok(object.clone())
        }
        (Value::Array(items), "pop") => {
            expect_args(method, args, 0)?;
            Ok(items.borrow_mut().pop().unwrap_or(Value::Null))
        }
        (Value::Array(items), "contains") => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(items.borrow().contains(&args[0])))
        }
        (Value::String(s), "upper") => {
            expect_args(method, args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        (Value::String(s), "lower") => {
            expect_args(method, args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        (Value::Object(object), _) => Rc::clone(object).call_method(method, args),
        _ => Err(undefined_member(object, method)),
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ErrorKind::WrongArity {
            name: method.to_string(),
            expected: expected.to_string(),
            got: args.len(),
        }
        .into())
    }
}

fn undefined_member(object: &Value, name: &str) -> QbetError {
    ErrorKind::UndefinedMember {
        type_name: object.type_name().to_string(),
        member: name.to_string(),
    }
    .into()
}
