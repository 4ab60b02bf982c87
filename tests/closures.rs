use qbet::run;
use qbet::value::Value;

#[test]
fn test_basic_closure() {
    let source = r#"
        x = "global"
        function makeClosure() {
            y = "captured"
            function inner() {
                return x + " " + y
            }
            return inner
        }
        closure = makeClosure()
        result = closure()
        result
    "#;
    let result = run(source).expect("Execution failed");
    match result {
        Value::String(s) => assert_eq!(s, "global captured"),
        _ => panic!("Expected string, got {:?}", result),
    }
}

#[test]
fn test_counter_state() {
    let source = r#"
        function makeCounter() {
            i = 0
            function count() {
                i = i + 1
                return i
            }
            return count
        }
        c1 = makeCounter()
        c2 = makeCounter()
        r1 = c1()
        r2 = c1()
        r3 = c2()

        "" + r1 + "," + r2 + "," + r3
    "#;
    let result = run(source).expect("Execution failed");
    match result {
        Value::String(s) => assert_eq!(s, "1,2,1"),
        _ => panic!("Expected string, got {:?}", result),
    }
}

#[test]
fn test_captured_scope_not_callers() {
    // `name` at the call site must not leak into the closure.
    let source = r#"
        function maker() {
            name = "inner"
            function get() { return name }
            return get
        }
        getter = maker()
        function caller() {
            name = "caller"
            return getter()
        }
        caller()
    "#;
    let result = run(source).expect("Execution failed");
    assert_eq!(result, Value::String("inner".into()));
}

#[test]
fn test_closure_sees_later_changes() {
    // Scopes are shared, not copied, when a function is created.
    let source = r#"
        level = 1
        function read() { return level }
        level = 2
        read()
    "#;
    let result = run(source).expect("Execution failed");
    assert_eq!(result, Value::Number(2.0));
}

#[test]
fn test_chained_call() {
    let source = r#"
        function adder(a) {
            function add(b) { return a + b }
            return add
        }
        adder(3)(4)
    "#;
    let result = run(source).expect("Execution failed");
    assert_eq!(result, Value::Number(7.0));
}

#[test]
fn test_parameters_shadow_globals() {
    let source = r#"
        n = 100
        function twice(n) { return n * 2 }
        "" + twice(4) + " " + n
    "#;
    let result = run(source).expect("Execution failed");
    assert_eq!(result, Value::String("8 100".into()));
}

#[test]
fn test_closures_in_array() {
    let source = r#"
        function make(k) {
            function get() { return k * 10 }
            return get
        }
        fns = []
        for (k in range(3)) { fns.push(make(k)) }
        fns[0]() + fns[1]() + fns[2]()
    "#;
    let result = run(source).expect("Execution failed");
    assert_eq!(result, Value::Number(30.0));
}
