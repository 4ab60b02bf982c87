//! Toy quantum natives over real-amplitude qubits

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::error::{ErrorKind, Result};
use crate::value::{format_number, Arity, NativeFn, Object, Value};

use super::{number_arg, opt_number_arg, type_error};

/// A single qubit `alpha|0> + beta|1>` with real amplitudes.
#[derive(Debug)]
pub struct Qubit {
    alpha: Cell<f64>,
    beta: Cell<f64>,
}

impl Qubit {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha: Cell::new(alpha),
            beta: Cell::new(beta),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha.get()
    }

    pub fn beta(&self) -> f64 {
        self.beta.get()
    }

    fn set(&self, alpha: f64, beta: f64) {
        self.alpha.set(alpha);
        self.beta.set(beta);
    }

    pub fn prob_zero(&self) -> f64 {
        self.alpha().powi(2)
    }

    pub fn prob_one(&self) -> f64 {
        self.beta().powi(2)
    }

    pub fn hadamard(&self) {
        let (a, b) = (self.alpha(), self.beta());
        let root2 = std::f64::consts::SQRT_2;
        self.set((a + b) / root2, (a - b) / root2);
    }

    pub fn pauli_x(&self) {
        self.set(self.beta(), self.alpha());
    }

    pub fn pauli_y(&self) {
        self.set(-self.beta(), self.alpha());
    }

    pub fn pauli_z(&self) {
        self.beta.set(-self.beta());
    }

    /// Collapse to a basis state and return the observed bit.
    pub fn measure(&self) -> u8 {
        let bit = if rand::thread_rng().gen::<f64>() < self.prob_zero() { 0 } else { 1 };
        if bit == 0 {
            self.set(1.0, 0.0);
        } else {
            self.set(0.0, 1.0);
        }
        tracing::trace!(bit, "qubit measured");
        bit
    }

    /// Set amplitudes proportional to `alpha` and `beta`; a zero vector is ignored.
    pub fn superpose(&self, alpha: f64, beta: f64) {
        let norm = alpha.hypot(beta);
        if norm > 0.0 {
            self.set(alpha / norm, beta / norm);
        }
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "qubit({}|0> + {}|1>)",
            format_number(self.alpha()),
            format_number(self.beta())
        )
    }
}

impl Object for Qubit {
    fn type_name(&self) -> &'static str {
        "qubit"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "alpha" => Some(Value::Number(self.alpha())),
            "beta" => Some(Value::Number(self.beta())),
            _ => None,
        }
    }

    fn call_method(self: Rc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            "measure" if args.is_empty() => Ok(Value::Number(self.measure() as f64)),
            "hadamard" if args.is_empty() => {
                self.hadamard();
                Ok(Value::Object(self))
            }
            "measure" | "hadamard" => Err(ErrorKind::WrongArity {
                name: name.to_string(),
                expected: "0".to_string(),
                got: args.len(),
            }
            .into()),
            _ => Err(ErrorKind::UndefinedMember {
                type_name: "qubit".to_string(),
                member: name.to_string(),
            }
            .into()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn qubit_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a Qubit> {
    args[index]
        .downcast::<Qubit>()
        .ok_or_else(|| type_error(name, "a qubit", &args[index]))
}

macro_rules! gate {
    ($name:literal, $gate:ident) => {
        NativeFn::new($name, Arity::Exact(1), |_, args| {
            qubit_arg($name, args, 0)?.$gate();
            Ok(args[0].clone())
        })
    };
}

pub fn natives() -> Vec<NativeFn> {
    vec![
        // qubit(alpha?, beta?)
        NativeFn::new("qubit", Arity::Range(0, 2), |_, args| {
            let alpha = opt_number_arg("qubit", args, 0, 1.0)?;
            let beta = opt_number_arg("qubit", args, 1, 0.0)?;
            Ok(Value::object(Qubit::new(alpha, beta)))
        }),
        gate!("hadamard", hadamard),
        gate!("pauli_x", pauli_x),
        gate!("pauli_y", pauli_y),
        gate!("pauli_z", pauli_z),
        // measure(q)
        NativeFn::new("measure", Arity::Exact(1), |_, args| {
            let bit = qubit_arg("measure", args, 0)?.measure();
            Ok(Value::Number(bit as f64))
        }),
        // entangle(q1, q2)
        NativeFn::new("entangle", Arity::Exact(2), |_, args| {
            let first = qubit_arg("entangle", args, 0)?;
            let second = qubit_arg("entangle", args, 1)?;
            let alpha = (first.alpha() + second.alpha()) / 2.0;
            let beta = (first.beta() + second.beta()) / 2.0;
            first.set(alpha, beta);
            second.set(alpha, beta);
            Ok(Value::Bool(true))
        }),
        // superpose(q, alpha, beta)
        NativeFn::new("superpose", Arity::Exact(3), |_, args| {
            let qubit = qubit_arg("superpose", args, 0)?;
            qubit.superpose(number_arg("superpose", args, 1)?, number_arg("superpose", args, 2)?);
            Ok(args[0].clone())
        }),
        // prob_zero(q)
        NativeFn::new("prob_zero", Arity::Exact(1), |_, args| {
            Ok(Value::Number(qubit_arg("prob_zero", args, 0)?.prob_zero()))
        }),
        // prob_one(q)
        NativeFn::new("prob_one", Arity::Exact(1), |_, args| {
            Ok(Value::Number(qubit_arg("prob_one", args, 0)?.prob_one()))
        }),
        // create_matrix(rows, cols, default?)
        NativeFn::new("create_matrix", Arity::Range(2, 3), |_, args| {
            let rows = number_arg("create_matrix", args, 0)?.max(0.0) as usize;
            let cols = number_arg("create_matrix", args, 1)?.max(0.0) as usize;
            let fill = args.get(2).cloned().unwrap_or(Value::Number(0.0));
            let matrix = (0..rows)
                .map(|_| Value::array(vec![fill.clone(); cols]))
                .collect();
            Ok(Value::array(matrix))
        }),
    ]
}
