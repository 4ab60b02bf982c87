//! Core natives: I/O, conversions, math and array helpers

use crate::console::Console;
use crate::error::{ErrorKind, Result};
use crate::value::{Arity, NativeFn, Value};

use super::{number_arg, type_error};

macro_rules! math {
    ($name:literal, $op:path) => {
        NativeFn::new($name, Arity::Exact(1), |_, args| {
            Ok(Value::Number($op(number_arg($name, args, 0)?)))
        })
    };
}

pub fn natives() -> Vec<NativeFn> {
    vec![
        // print(...)
        NativeFn::new("print", Arity::Variadic, |console, args| {
            let parts: Vec<String> = args.iter().map(Value::to_string).collect();
            console.write_line(&parts.join(" "));
            Ok(Value::Null)
        }),
        // input(prompt?)
        NativeFn::new("input", Arity::Range(0, 1), |console, args| {
            let prompt = args.first().map(Value::to_string).unwrap_or_default();
            Ok(console.read_line(&prompt).map_or(Value::Null, Value::String))
        }),
        // number(val)
        NativeFn::new("number", Arity::Exact(1), |_, args| {
            Ok(match &args[0] {
                Value::Number(n) => Value::Number(*n),
                Value::String(s) => s.trim().parse::<f64>().map_or(Value::Null, Value::Number),
                Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
                _ => Value::Null,
            })
        }),
        // string(val)
        NativeFn::new("string", Arity::Exact(1), |_, args| {
            Ok(Value::String(args[0].to_string()))
        }),
        // boolean(val)
        NativeFn::new("boolean", Arity::Exact(1), |_, args| {
            Ok(Value::Bool(args[0].is_truthy()))
        }),
        math!("abs", f64::abs),
        math!("sqrt", f64::sqrt),
        math!("sin", f64::sin),
        math!("cos", f64::cos),
        math!("floor", f64::floor),
        math!("ceil", f64::ceil),
        math!("round", f64::round),
        // len(val)
        NativeFn::new("len", Arity::Exact(1), |_, args| match &args[0] {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.borrow().len() as f64)),
            other => Err(type_error("len", "a string or array", other)),
        }),
        // push(arr, val)
        NativeFn::new("push", Arity::Exact(2), |_, args| match &args[0] {
            Value::Array(items) => {
                items.borrow_mut().push(args[1].clone());
                Ok(args[0].clone())
            }
            other => Err(type_error("push", "an array", other)),
        }),
        // pop(arr)
        NativeFn::new("pop", Arity::Exact(1), |_, args| match &args[0] {
            Value::Array(items) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
            other => Err(type_error("pop", "an array", other)),
        }),
        // type(val)
        NativeFn::new("type", Arity::Exact(1), |_, args| {
            Ok(Value::String(args[0].type_name().to_string()))
        }),
        // range(end) or range(start, end, step?)
        NativeFn::new("range", Arity::Range(1, 3), range),
    ]
}

/// Longest array `range` will build.
pub const MAX_RANGE_LEN: usize = 1_000_000;

fn range(_: &mut dyn Console, args: &[Value]) -> Result<Value> {
    let (start, end, step) = match args.len() {
        1 => (0.0, number_arg("range", args, 0)?, 1.0),
        2 => (number_arg("range", args, 0)?, number_arg("range", args, 1)?, 1.0),
        _ => (
            number_arg("range", args, 0)?,
            number_arg("range", args, 1)?,
            number_arg("range", args, 2)?,
        ),
    };
    let (start, end, step) = (start.trunc() as i64, end.trunc() as i64, step.trunc() as i64);
    if step == 0 {
        return Err(ErrorKind::Runtime("range() step cannot be zero".to_string()).into());
    }

    let mut values = Vec::new();
    let mut next = Some(start);
    while let Some(i) = next.filter(|&i| (step > 0 && i < end) || (step < 0 && i > end)) {
        if values.len() == MAX_RANGE_LEN {
            return Err(ErrorKind::Runtime(format!(
                "range() cannot produce more than {} items",
                MAX_RANGE_LEN
            ))
            .into());
        }
        values.push(Value::Number(i as f64));
        next = i.checked_add(step);
    }
    Ok(Value::array(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CaptureConsole;
    use crate::error::ErrorCategory;

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        let native = natives()
            .into_iter()
            .find(|native| native.name == name)
            .expect("native not registered");
        native.call(&mut CaptureConsole::new(), args)
    }

    fn numbers(value: &Value) -> Vec<f64> {
        match value {
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|item| item.as_number("test").unwrap())
                .collect(),
            other => panic!("expected array, got {}", other),
        }
    }

    #[test]
    fn test_print_joins_with_spaces() {
        let console = CaptureConsole::new();
        let print = natives().into_iter().find(|n| n.name == "print").unwrap();
        print
            .call(
                &mut console.clone(),
                &[Value::String("x =".into()), Value::Number(3.0), Value::Null],
            )
            .unwrap();
        print.call(&mut console.clone(), &[]).unwrap();
        assert_eq!(console.lines(), vec!["x = 3 null".to_string(), String::new()]);
    }

    #[test]
    fn test_input_reads_from_console() {
        let input = natives().into_iter().find(|n| n.name == "input").unwrap();
        let mut console = CaptureConsole::with_input(&["Ada"]);
        let name = input.call(&mut console, &[Value::String("name? ".into())]).unwrap();
        assert_eq!(name, Value::String("Ada".into()));
        assert_eq!(input.call(&mut console, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("number", &[Value::String(" 2.5 ".into())]).unwrap(), Value::Number(2.5));
        assert_eq!(call("number", &[Value::String("abc".into())]).unwrap(), Value::Null);
        assert_eq!(call("number", &[Value::Bool(true)]).unwrap(), Value::Number(1.0));
        assert_eq!(call("string", &[Value::Number(4.0)]).unwrap(), Value::String("4".into()));
        assert_eq!(call("boolean", &[Value::String(String::new())]).unwrap(), Value::Bool(false));
        assert_eq!(call("type", &[Value::array(vec![])]).unwrap(), Value::String("array".into()));
    }

    #[test]
    fn test_math() {
        assert_eq!(call("abs", &[Value::Number(-3.0)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("sqrt", &[Value::Number(16.0)]).unwrap(), Value::Number(4.0));
        assert_eq!(call("floor", &[Value::Number(2.7)]).unwrap(), Value::Number(2.0));
        assert_eq!(call("ceil", &[Value::Number(2.1)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("round", &[Value::Number(2.5)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("cos", &[Value::Number(0.0)]).unwrap(), Value::Number(1.0));

        let err = call("sqrt", &[Value::String("4".into())]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeError);
    }

    #[test]
    fn test_len_push_pop() {
        let items = Value::array(vec![Value::Number(1.0)]);
        let pushed = call("push", &[items.clone(), Value::Number(2.0)]).unwrap();
        assert_eq!(pushed, items);
        assert_eq!(call("len", &[items.clone()]).unwrap(), Value::Number(2.0));
        assert_eq!(call("pop", &[items.clone()]).unwrap(), Value::Number(2.0));
        assert_eq!(call("pop", &[Value::array(vec![])]).unwrap(), Value::Null);
        assert_eq!(call("len", &[Value::String("héllo".into())]).unwrap(), Value::Number(5.0));
        assert_eq!(call("len", &[Value::Number(1.0)]).unwrap_err().category(), ErrorCategory::TypeError);
    }

    #[test]
    fn test_range() {
        assert_eq!(numbers(&call("range", &[Value::Number(4.0)]).unwrap()), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            numbers(&call("range", &[Value::Number(2.0), Value::Number(5.0)]).unwrap()),
            vec![2.0, 3.0, 4.0]
        );
        assert_eq!(
            numbers(&call("range", &[Value::Number(5.0), Value::Number(0.0), Value::Number(-2.0)]).unwrap()),
            vec![5.0, 3.0, 1.0]
        );
        assert!(numbers(&call("range", &[Value::Number(-1.0)]).unwrap()).is_empty());

        // Stepping past i64::MAX ends the range instead of wrapping.
        let huge = call("range", &[Value::Number(1.0), Value::Number(1e20), Value::Number(i64::MAX as f64)]);
        assert_eq!(numbers(&huge.unwrap()), vec![1.0]);
        let err = call("range", &[Value::Number(0.0), Value::Number(1e18)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RuntimeError);

        let err = call("range", &[Value::Number(0.0), Value::Number(3.0), Value::Number(0.0)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RuntimeError);
    }

    #[test]
    fn test_arity_is_checked() {
        let err = call("len", &[]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::WrongArity { got: 0, .. }));
    }
}
