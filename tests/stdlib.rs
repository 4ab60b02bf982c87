use qbet::stdlib::quantum::Qubit;
use qbet::stdlib::spiritual::{Chakra, GOLDEN_RATIO};
use qbet::{run, CaptureConsole, ErrorCategory, Interpreter, Value};

fn number(source: &str) -> f64 {
    match run(source).expect("Execution failed") {
        Value::Number(n) => n,
        other => panic!("Expected number, got {:?}", other),
    }
}

#[test]
fn test_core_helpers_from_scripts() {
    assert_eq!(run("type(1) + type(\"s\") + type(null)").unwrap(), Value::String("numberstringnull".into()));
    assert_eq!(run("len(range(2, 10, 3))").unwrap(), Value::Number(3.0));
    assert_eq!(run("number(\"12\") + 1").unwrap(), Value::Number(13.0));
    assert_eq!(run("string(1.5) + \"!\"").unwrap(), Value::String("1.5!".into()));
    assert_eq!(run("items = [3]\npush(items, 4)\npop(items) + len(items)").unwrap(), Value::Number(5.0));
    assert_eq!(run("floor(sqrt(17)) + abs(-1)").unwrap(), Value::Number(5.0));
    assert_eq!(run("type(print)").unwrap(), Value::String("native function".into()));
}

#[test]
fn test_native_errors() {
    assert_eq!(run("sqrt(\"nine\")").unwrap_err().category(), ErrorCategory::TypeError);
    assert_eq!(run("range(1, 5, 0)").unwrap_err().category(), ErrorCategory::RuntimeError);
    assert_eq!(run("len()").unwrap_err().category(), ErrorCategory::RuntimeError);
}

#[test]
fn test_input_uses_console() {
    let console = CaptureConsole::with_input(&["21"]);
    let mut interpreter = Interpreter::with_console(Box::new(console));
    let value = interpreter.eval_source("number(input(\"age? \")) * 2").unwrap();
    assert_eq!(value, Value::Number(42.0));
}

#[test]
fn test_qubit_lifecycle() {
    let source = r#"
        q = qubit()
        hadamard(q)
        hadamard(q)
        measure(q)
    "#;
    assert_eq!(run(source).unwrap(), Value::Number(0.0));

    let value = run("q = qubit()\npauli_x(q)").unwrap();
    let qubit = value.downcast::<Qubit>().expect("not a qubit");
    assert_eq!((qubit.alpha(), qubit.beta()), (0.0, 1.0));
}

#[test]
fn test_qubit_members_and_methods() {
    assert!((number("q = qubit()\nq.hadamard().beta") - 0.5f64.sqrt()).abs() < 1e-9);
    assert!((number("q = qubit()\nsuperpose(q, 1, 1)\nprob_one(q)") - 0.5).abs() < 1e-9);
    assert_eq!(number("qubit(0, 1).measure()"), 1.0);
    assert_eq!(run("type(qubit())").unwrap(), Value::String("qubit".into()));
    assert_eq!(run("qubit().spin").unwrap_err().category(), ErrorCategory::RuntimeError);
}

#[test]
fn test_entangle_from_script() {
    let source = r#"
        a = qubit(1, 0)
        b = qubit(0, 1)
        entangle(a, b)
        a.alpha + b.beta
    "#;
    assert_eq!(number(source), 1.0);
}

#[test]
fn test_matrix() {
    // Index targets are not assignable.
    let err = run("m = create_matrix(2, 2, 1)\nm[1][0] = 5").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::SyntaxError);
    assert_eq!(run("create_matrix(2, 2, 1)").unwrap().to_string(), "[[1, 1], [1, 1]]");
}

#[test]
fn test_chakra_and_energy() {
    let source = r#"
        heart = chakra("heart", 95)
        heart.balance(20)
        heart.level
    "#;
    assert_eq!(number(source), 100.0);

    let value = run("c = chakra()\nbalance_chakra(c, -10)").unwrap();
    let chakra = value.downcast::<Chakra>().expect("not a chakra");
    assert_eq!((chakra.name(), chakra.level()), ("root", 40.0));

    let source = r#"
        e = energy()
        e.charge(5)
        charge_energy(e, 10)
        set_frequency(e, 528)
        e.amount + e.frequency + e.vibration
    "#;
    assert_eq!(number(source), 644.0);
}

#[test]
fn test_spiritual_text() {
    let console = CaptureConsole::new();
    let mut interpreter = Interpreter::with_console(Box::new(console.clone()));
    interpreter
        .eval_source(
            r#"
            print(karma("kindness", "joy"))
            print(manifest("abundance"))
            print(meditate(20))
            print(align_chakras())
            print(invoke_element("water"))
        "#,
        )
        .unwrap();
    let lines = console.lines();
    assert_eq!(
        lines,
        vec![
            "Karma: kindness -> joy",
            "Manifesting: abundance",
            "Meditated for 20 minutes. Inner peace achieved.",
            "All 7 chakras aligned",
            "Flow and emotion",
        ]
    );
    console.clear();
    assert!(console.lines().is_empty());

    assert_eq!(number("fibonacci(10)"), 55.0);
    assert_eq!(number("golden_ratio()"), GOLDEN_RATIO);
    assert_eq!(run("type(higher_self_guide(\"x\"))").unwrap(), Value::String("string".into()));
}
