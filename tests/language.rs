use pretty_assertions::assert_eq;

use qbet::lexer::Lexer;
use qbet::token::TokenKind;
use qbet::{
    default_registry, run, CaptureConsole, ErrorCategory, Interpreter, InterpreterConfig, Value,
};

fn category(source: &str) -> ErrorCategory {
    run(source).expect_err("expected an error").category()
}

fn eval_with_output(source: &str) -> (Value, Vec<String>) {
    let console = CaptureConsole::new();
    let mut interpreter = Interpreter::with_console(Box::new(console.clone()));
    let value = interpreter.eval_source(source).expect("Execution failed");
    (value, console.lines())
}

#[test]
fn test_number_lexing() {
    let tokens = Lexer::new("3.25").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Number(3.25));
    assert_eq!(tokens[1].kind, TokenKind::Eof);

    assert_eq!(category("1.2.3"), ErrorCategory::LexError);
}

#[test]
fn test_escaped_newline_in_string() {
    let tokens = Lexer::new(r#""a\nb""#).tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::String("a\nb".to_string()));
}

#[test]
fn test_arithmetic() {
    assert_eq!(run("1 + 2 * 3").unwrap(), Value::Number(7.0));
    assert_eq!(run("2 ** 3 ** 2").unwrap(), Value::Number(512.0));
    assert_eq!(run("(10 - 4) / 4").unwrap(), Value::Number(1.5));
}

#[test]
fn test_block_assignment_mutates_outer_binding() {
    assert_eq!(run("x = 5; { x = 6 }; x").unwrap(), Value::Number(6.0));
    assert_eq!(category("x = 5; { y = 6 }; y"), ErrorCategory::NameError);
}

#[test]
fn test_first_return_wins() {
    assert_eq!(run("function f() { return 1; return 2 } f()").unwrap(), Value::Number(1.0));
}

#[test]
fn test_error_categories() {
    assert_eq!(category("1 / 0"), ErrorCategory::DivisionByZeroError);
    assert_eq!(category("5 % 0"), ErrorCategory::DivisionByZeroError);
    assert_eq!(category("[1, 2, 3][5]"), ErrorCategory::RuntimeError);
    assert_eq!(category("[1, 2, 3][-1]"), ErrorCategory::RuntimeError);
    assert_eq!(category("missing"), ErrorCategory::NameError);
    assert_eq!(category("true + 1"), ErrorCategory::TypeError);
    assert_eq!(category("x = (1 + 2"), ErrorCategory::SyntaxError);
    assert_eq!(category("1 = 2"), ErrorCategory::SyntaxError);
    assert_eq!(category("\"open"), ErrorCategory::LexError);
    assert_eq!(category("return 5"), ErrorCategory::RuntimeError);
    assert_eq!(category("x = 1\nx(2)"), ErrorCategory::RuntimeError);
    assert_eq!(category("for (i in \"abc\") { i }"), ErrorCategory::TypeError);
}

#[test]
fn test_equality_without_coercion() {
    assert_eq!(run("null == null").unwrap(), Value::Bool(true));
    assert_eq!(run("1 == \"1\"").unwrap(), Value::Bool(false));
    assert_eq!(run("false == 0").unwrap(), Value::Bool(false));
    assert_eq!(run("[1, [2]] == [1, [2]]").unwrap(), Value::Bool(true));
}

#[test]
fn test_short_circuit() {
    // The right operand is never evaluated, so the undefined name is harmless.
    assert_eq!(run("false and undefined_name").unwrap(), Value::Bool(false));
    assert_eq!(run("\"ok\" or undefined_name").unwrap(), Value::String("ok".into()));
    assert_eq!(run("null or 0").unwrap(), Value::Number(0.0));
}

#[test]
fn test_program_value_is_last_statement() {
    assert_eq!(run("").unwrap(), Value::Null);
    assert_eq!(run("1\n2\n3").unwrap(), Value::Number(3.0));
    assert_eq!(run("x = 4").unwrap(), Value::Number(4.0));
}

#[test]
fn test_print_goes_through_console() {
    let (value, lines) = eval_with_output(
        r#"
        function greet(name) {
            print("hello", name)
        }
        greet("world")
        print([1, "two", null], 2.5, true)
    "#,
    );
    assert_eq!(value, Value::Null);
    assert_eq!(lines, vec!["hello world", "[1, \"two\", null] 2.5 true"]);
}

#[test]
fn test_loops_and_control_flow() {
    let (_, lines) = eval_with_output(
        r#"
        i = 0
        while (i < 3) {
            if (i % 2 == 0) { print("even", i) } else { print("odd", i) }
            i = i + 1
        }
        for (word in ["a", "b"]) { print(word.upper()) }
    "#,
    );
    assert_eq!(lines, vec!["even 0", "odd 1", "even 2", "A", "B"]);
}

#[test]
fn test_fizzbuzz() {
    let source = r#"
        function label(n) {
            if (n % 15 == 0) { return "FizzBuzz" }
            else if (n % 3 == 0) { return "Fizz" }
            else if (n % 5 == 0) { return "Buzz" }
            return string(n)
        }
        out = []
        for (n in range(1, 16)) { push(out, label(n)) }
        out[2] + " " + out[4] + " " + out[14] + " " + len(out)
    "#;
    assert_eq!(run(source).unwrap(), Value::String("Fizz Buzz FizzBuzz 15".into()));
}

#[test]
fn test_recursion_limit_is_configurable() {
    let mut interpreter = Interpreter::with_registry(
        default_registry(),
        Box::new(CaptureConsole::new()),
        InterpreterConfig { max_call_depth: 32 },
    );
    let source = "function depth(n) { if (n == 0) { return 0 } return 1 + depth(n - 1) }\n";

    assert_eq!(
        interpreter.eval_source(&format!("{}depth(20)", source)).unwrap(),
        Value::Number(20.0)
    );
    let err = interpreter.eval_source("depth(40)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::RuntimeError);
}

#[test]
fn test_interpreter_keeps_globals_between_runs() {
    let mut interpreter = Interpreter::with_console(Box::new(CaptureConsole::new()));
    interpreter.eval_source("total = 10").unwrap();
    interpreter.eval_source("function bump() { total = total + 1 }").unwrap();
    interpreter.eval_source("bump(); bump()").unwrap();
    assert_eq!(interpreter.eval_source("total").unwrap(), Value::Number(12.0));
}

#[test]
fn test_error_display_points_at_source() {
    let source = "x = 1\ny = x / 0";
    let err = run(source).unwrap_err().with_source(source);
    let text = err.to_string();
    assert!(text.starts_with("[line 2:5] DivisionByZeroError: division by zero"), "{}", text);
    assert!(text.contains("  | y = x / 0"));
}
