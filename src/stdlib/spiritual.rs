//! Spiritual natives: chakras, energy and guidance helpers

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rand::seq::SliceRandom;

use crate::error::{ErrorKind, Result};
use crate::value::{format_number, Arity, NativeFn, Object, Value};

use super::{number_arg, opt_number_arg, type_error};

pub const GOLDEN_RATIO: f64 = 1.618033988749895;

const CHAKRA_COUNT: usize = 7;

const GUIDANCE: [&str; 5] = [
    "Trust your intuition",
    "Follow the path of love",
    "Seek balance and harmony",
    "Embrace your divine purpose",
    "Connect with universal consciousness",
];

/// An energy center with a level between 0 and 100.
#[derive(Debug)]
pub struct Chakra {
    name: String,
    level: Cell<f64>,
}

impl Chakra {
    pub fn new(name: impl Into<String>, level: f64) -> Self {
        Self {
            name: name.into(),
            level: Cell::new(level),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> f64 {
        self.level.get()
    }

    /// Shift the level by `amount`, clamped to 0..=100. Without an amount the
    /// level resets to 50.
    pub fn balance(&self, amount: Option<f64>) {
        let level = match amount {
            Some(amount) => (self.level() + amount).clamp(0.0, 100.0),
            None => 50.0,
        };
        self.level.set(level);
    }
}

impl fmt::Display for Chakra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chakra({}, level {})", self.name, format_number(self.level()))
    }
}

impl Object for Chakra {
    fn type_name(&self) -> &'static str {
        "chakra"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name.clone())),
            "level" => Some(Value::Number(self.level())),
            _ => None,
        }
    }

    fn call_method(self: Rc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            "balance" => {
                if args.len() > 1 {
                    return Err(ErrorKind::WrongArity {
                        name: "balance".to_string(),
                        expected: "0 to 1".to_string(),
                        got: args.len(),
                    }
                    .into());
                }
                self.balance(balance_amount("balance", args, 0)?);
                Ok(Value::Object(self))
            }
            _ => Err(ErrorKind::UndefinedMember {
                type_name: "chakra".to_string(),
                member: name.to_string(),
            }
            .into()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Energy {
    amount: Cell<f64>,
    frequency: Cell<f64>,
    vibration: Cell<f64>,
}

impl Energy {
    pub fn new(amount: f64, frequency: f64, vibration: f64) -> Self {
        Self {
            amount: Cell::new(amount),
            frequency: Cell::new(frequency),
            vibration: Cell::new(vibration),
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount.get()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency.get()
    }

    pub fn vibration(&self) -> f64 {
        self.vibration.get()
    }

    pub fn charge(&self, amount: f64) {
        self.amount.set(self.amount() + amount);
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "energy({} @ {}Hz, vibration {})",
            format_number(self.amount()),
            format_number(self.frequency()),
            format_number(self.vibration())
        )
    }
}

impl Object for Energy {
    fn type_name(&self) -> &'static str {
        "energy"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "amount" => Some(Value::Number(self.amount())),
            "frequency" => Some(Value::Number(self.frequency())),
            "vibration" => Some(Value::Number(self.vibration())),
            _ => None,
        }
    }

    fn call_method(self: Rc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            "charge" if args.len() == 1 => {
                self.charge(number_arg("charge", args, 0)?);
                Ok(Value::Object(self))
            }
            "charge" => Err(ErrorKind::WrongArity {
                name: "charge".to_string(),
                expected: "1".to_string(),
                got: args.len(),
            }
            .into()),
            _ => Err(ErrorKind::UndefinedMember {
                type_name: "energy".to_string(),
                member: name.to_string(),
            }
            .into()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn balance_amount(name: &str, args: &[Value], index: usize) -> Result<Option<f64>> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => number_arg(name, args, index).map(Some),
    }
}

fn chakra_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a Chakra> {
    args[index]
        .downcast::<Chakra>()
        .ok_or_else(|| type_error(name, "a chakra", &args[index]))
}

fn energy_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a Energy> {
    args[index]
        .downcast::<Energy>()
        .ok_or_else(|| type_error(name, "an energy", &args[index]))
}

/// The n-th Fibonacci number; anything below 1 yields 0.
pub fn fibonacci(n: i64) -> f64 {
    let (mut a, mut b) = (0.0_f64, 1.0_f64);
    if n <= 0 {
        return a;
    }
    for _ in 1..n {
        if b.is_infinite() {
            break;
        }
        (a, b) = (b, a + b);
    }
    b
}

fn element(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "earth" => "Stability and grounding",
        "water" => "Flow and emotion",
        "fire" => "Transformation and energy",
        "air" => "Intellect and movement",
        "ether" => "Spirit and connection",
        _ => "Unknown element",
    }
}

pub fn natives() -> Vec<NativeFn> {
    vec![
        // chakra(kind?, level?)
        NativeFn::new("chakra", Arity::Range(0, 2), |_, args| {
            let kind = match args.first() {
                None | Some(Value::Null) => "root".to_string(),
                Some(kind) => kind.to_string(),
            };
            let level = opt_number_arg("chakra", args, 1, 50.0)?;
            Ok(Value::object(Chakra::new(kind, level)))
        }),
        // energy(amount?, frequency?, vibration?)
        NativeFn::new("energy", Arity::Range(0, 3), |_, args| {
            Ok(Value::object(Energy::new(
                opt_number_arg("energy", args, 0, 100.0)?,
                opt_number_arg("energy", args, 1, 1.0)?,
                opt_number_arg("energy", args, 2, 1.0)?,
            )))
        }),
        // balance_chakra(c, amount?)
        NativeFn::new("balance_chakra", Arity::Range(1, 2), |_, args| {
            let chakra = chakra_arg("balance_chakra", args, 0)?;
            chakra.balance(balance_amount("balance_chakra", args, 1)?);
            Ok(args[0].clone())
        }),
        // charge_energy(e, amount)
        NativeFn::new("charge_energy", Arity::Exact(2), |_, args| {
            energy_arg("charge_energy", args, 0)?.charge(number_arg("charge_energy", args, 1)?);
            Ok(args[0].clone())
        }),
        // set_frequency(e, f)
        NativeFn::new("set_frequency", Arity::Exact(2), |_, args| {
            let energy = energy_arg("set_frequency", args, 0)?;
            energy.frequency.set(number_arg("set_frequency", args, 1)?);
            Ok(args[0].clone())
        }),
        // set_vibration(e, v)
        NativeFn::new("set_vibration", Arity::Exact(2), |_, args| {
            let energy = energy_arg("set_vibration", args, 0)?;
            energy.vibration.set(number_arg("set_vibration", args, 1)?);
            Ok(args[0].clone())
        }),
        NativeFn::new("karma", Arity::Exact(2), |_, args| {
            Ok(Value::String(format!("Karma: {} -> {}", args[0], args[1])))
        }),
        NativeFn::new("dharma", Arity::Exact(2), |_, args| {
            Ok(Value::String(format!("Dharma: {} serves {}", args[0], args[1])))
        }),
        NativeFn::new("manifest", Arity::Exact(1), |_, args| {
            Ok(Value::String(format!("Manifesting: {}", args[0])))
        }),
        NativeFn::new("meditate", Arity::Exact(1), |_, args| {
            let minutes = opt_number_arg("meditate", args, 0, 5.0)?;
            Ok(Value::String(format!(
                "Meditated for {} minutes. Inner peace achieved.",
                format_number(minutes)
            )))
        }),
        NativeFn::new("align_chakras", Arity::Exact(0), |_, _| {
            Ok(Value::String(format!("All {} chakras aligned", CHAKRA_COUNT)))
        }),
        NativeFn::new("invoke_element", Arity::Exact(1), |_, args| {
            Ok(Value::String(element(&args[0].to_string()).to_string()))
        }),
        NativeFn::new("golden_ratio", Arity::Exact(0), |_, _| Ok(Value::Number(GOLDEN_RATIO))),
        NativeFn::new("fibonacci", Arity::Exact(1), |_, args| {
            let n = number_arg("fibonacci", args, 0)?.trunc() as i64;
            Ok(Value::Number(fibonacci(n)))
        }),
        // higher_self_guide(task)
        NativeFn::new("higher_self_guide", Arity::Exact(1), |_, _| {
            let guidance = GUIDANCE
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(GUIDANCE[0]);
            Ok(Value::String(guidance.to_string()))
        }),
    ]
}
