//! Runtime values for QBET

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::console::Console;
use crate::environment::EnvRef;
use crate::error::{ErrorKind, QbetError, Result};

/// Runtime values in QBET
#[derive(Clone)]
pub enum Value {
    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Boolean value
    Bool(bool),

    /// Null value
    Null,

    /// Mutable, shared array
    Array(Rc<RefCell<Vec<Value>>>),

    /// User-defined function together with its defining scope
    Function(Rc<Closure>),

    /// Built-in function
    NativeFunction(NativeFn),

    /// Opaque value supplied by a native library
    Object(Rc<dyn Object>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: impl Object + 'static) -> Value {
        Value::Object(Rc::new(object))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::NativeFunction(_) => "native function",
            Value::Object(object) => object.type_name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Borrow the payload of a number or report a type error.
    pub fn as_number(&self, context: &str) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(ErrorKind::type_mismatch(context, "number", other.type_name()).into()),
        }
    }

    /// Downcast an object value to a concrete native type.
    pub fn downcast<T: Object + 'static>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Write the display form, quoting strings nested in arrays. An array
    /// already on `path` prints as `[...]`.
    fn write_to(&self, f: &mut fmt::Formatter<'_>, path: &mut Vec<ArrayPtr>, nested: bool) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) if nested => write!(f, "{:?}", s),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if path.contains(&ptr) {
                    return write!(f, "[...]");
                }

                path.push(ptr);
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_to(f, path, true)?;
                }
                path.pop();
                write!(f, "]")
            }
            Value::Function(closure) => write!(f, "<function {}>", closure.decl.name),
            Value::NativeFunction(nf) => write!(f, "<native fn {}>", nf.name),
            Value::Object(object) => write!(f, "{}", object),
        }
    }

    fn equals(&self, other: &Value, path: &mut Vec<ArrayPtr>) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (pa, pb) = (Rc::as_ptr(a), Rc::as_ptr(b));
                // Re-entered through a cycle; identity already failed above.
                if path.contains(&pa) || path.contains(&pb) {
                    return false;
                }

                let (xs, ys) = (a.borrow(), b.borrow());
                if xs.len() != ys.len() {
                    return false;
                }
                path.extend([pa, pb]);
                let equal = xs.iter().zip(ys.iter()).all(|(x, y)| x.equals(y, path));
                path.truncate(path.len() - 2);
                equal
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type ArrayPtr = *const RefCell<Vec<Value>>;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new(), false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new(), true)
    }
}

/// Values of different kinds are never equal. Arrays compare element-wise,
/// except that an array reached again through a cycle compares by identity.
/// Functions and objects compare by identity; natives by registered name.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

/// Integral numbers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A function value: its declaration plus the scope it was defined in.
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub env: EnvRef,
}

impl Closure {
    pub fn new(decl: Rc<FunctionDecl>, env: EnvRef) -> Self {
        Self { decl, env }
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.decl.name)
    }
}

/// How many arguments a native function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::Range(min, max) => (*min..=*max).contains(&count),
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// Native function type
pub type NativeFnPtr = fn(&mut dyn Console, &[Value]) -> Result<Value>;

/// Native/built-in function
#[derive(Clone)]
pub struct NativeFn {
    pub name: String,
    pub arity: Arity,
    pub func: NativeFnPtr,
}

impl NativeFn {
    pub fn new(name: &str, arity: Arity, func: NativeFnPtr) -> Self {
        Self {
            name: name.to_string(),
            arity,
            func,
        }
    }

    pub fn call(&self, console: &mut dyn Console, args: &[Value]) -> Result<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(QbetError::from(ErrorKind::WrongArity {
                name: self.name.clone(),
                expected: self.arity.to_string(),
                got: args.len(),
            }));
        }
        (self.func)(console, args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// Capabilities an opaque native value exposes to scripts.
///
/// The interpreter never inspects concrete object types: member access and
/// method calls on an object go through this trait.
pub trait Object: fmt::Display {
    fn type_name(&self) -> &'static str;

    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Methods take the shared handle so they can hand the object back.
    fn call_method(self: Rc<Self>, name: &str, _args: &[Value]) -> Result<Value> {
        Err(ErrorKind::UndefinedMember {
            type_name: self.type_name().to_string(),
            member: name.to_string(),
        }
        .into())
    }

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("0".into()).is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_equality_never_crosses_kinds() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_ne!(Value::Bool(false), Value::Null);
        assert_ne!(Value::Number(0.0), Value::Bool(false));
    }

    #[test]
    fn test_array_equality_is_structural() {
        let a = Value::array(vec![Value::Number(1.0), Value::String("x".into())]);
        let b = Value::array(vec![Value::Number(1.0), Value::String("x".into())]);
        assert_eq!(a, b);
        assert_ne!(a, Value::array(vec![Value::Number(1.0)]));
    }

    #[test]
    fn test_cyclic_arrays() {
        let a = Value::array(vec![]);
        let b = Value::array(vec![]);
        for array in [&a, &b] {
            if let Value::Array(items) = array {
                items.borrow_mut().push(array.clone());
            }
        }

        assert_eq!(a.to_string(), "[[...]]");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, Value::array(vec![Value::array(vec![])]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Null.to_string(), "null");
        let items = Value::array(vec![
            Value::Number(1.0),
            Value::String("a".into()),
            Value::Bool(true),
        ]);
        assert_eq!(items.to_string(), "[1, \"a\", true]");
    }

    #[test]
    fn test_arity() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
        assert!(Arity::Range(1, 3).accepts(3));
        assert!(!Arity::Range(1, 3).accepts(0));
        assert!(Arity::Variadic.accepts(10));
    }
}
