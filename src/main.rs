//! QBET CLI and REPL
//!
//! Usage:
//!   qbet run <file.qbet>     - Execute a QBET file
//!   qbet manifest <file>     - Alias for run
//!   qbet build <file.qbet>   - Lower a creation file to JSON (.qb)
//!   qbet repl                - Start interactive REPL
//!   qbet help                - Show help message

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use qbet::lower::{LoweredModule, Lowerer};
use qbet::{default_registry, Interpreter, InterpreterConfig, StdConsole, Value, VERSION};

/// Flags accepted after `run`, `manifest` and `build`
#[derive(Debug, Default)]
struct Options {
    no_banner: bool,
    max_depth: Option<usize>,
    out: Option<String>,
}

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "run" | "manifest" => {
            let path = file_argument(&args, "run");
            run_file(path, &parse_options(&args[3..]));
        }
        "build" => {
            let path = file_argument(&args, "build");
            build_file(path, &parse_options(&args[3..]));
        }
        "repl" => run_repl(&parse_options(&args[2..])),
        "help" | "--help" | "-h" => print_help(),
        "version" | "--version" | "-v" => println!("QBET {}", VERSION),
        _ => {
            // Assume it's a file
            if args[1].ends_with(".qbet") {
                run_file(&args[1], &parse_options(&args[2..]));
            } else {
                eprintln!("{}: unknown command '{}'", "error".red(), args[1]);
                print_help();
                process::exit(1);
            }
        }
    }
}

/// Log to stderr when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn file_argument<'a>(args: &'a [String], command: &str) -> &'a str {
    match args.get(2) {
        Some(path) if !path.starts_with("--") => path,
        _ => {
            eprintln!("{}: missing file argument", "error".red());
            eprintln!("Usage: qbet {} <file.qbet>", command);
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-banner" => options.no_banner = true,
            "--max-depth" => match iter.next().and_then(|n| n.parse().ok()) {
                Some(depth) => options.max_depth = Some(depth),
                None => fail("--max-depth expects a positive number"),
            },
            "--out" => match iter.next() {
                Some(path) => options.out = Some(path.clone()),
                None => fail("--out expects a path"),
            },
            other => fail(&format!("unknown option '{}'", other)),
        }
    }

    options
}

/// Flag first, then `QBET_MAX_DEPTH`, then the built-in default.
fn config(options: &Options) -> InterpreterConfig {
    let mut config = InterpreterConfig::default();

    if let Some(depth) = options.max_depth {
        config.max_call_depth = depth;
    } else if let Ok(value) = env::var("QBET_MAX_DEPTH") {
        match value.parse() {
            Ok(depth) => config.max_call_depth = depth,
            Err(_) => fail(&format!("QBET_MAX_DEPTH must be a number, got '{}'", value)),
        }
    }

    tracing::debug!(?config, "configuration resolved");
    config
}

fn fail(message: &str) -> ! {
    eprintln!("{}: {}", "error".red(), message);
    process::exit(1);
}

fn read_source(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail(&format!("cannot read file '{}': {}", path, e)),
    }
}

fn print_banner() {
    println!("{}", "  ____  ____  ______ ______".green());
    println!("{}", " / __ \\/ __ )/ ____//_  __/".green());
    println!("{}", "/ /_/ / __  / __/    / /".green());
    println!("{}", "\\___\\_\\____/_____/  /_/".green());
    println!(
        "{} {}\n",
        "QBET quantum-spiritual runtime".cyan(),
        format!("v{}", VERSION).dimmed()
    );
}

fn print_help() {
    println!("{}", "QBET".cyan().bold());
    println!("A quantum-spiritual scripting language");
    println!("{} {}\n", "Version".cyan(), VERSION);
    println!("{}", "USAGE:".yellow());
    println!("  qbet run <file.qbet>      Execute a QBET file");
    println!("  qbet manifest <file.qbet> Same as run");
    println!("  qbet build <file.qbet>    Lower a creation file to JSON");
    println!("  qbet repl                 Start interactive REPL");
    println!("  qbet help                 Show this help message");
    println!("  qbet version              Show version\n");
    println!("{}", "OPTIONS:".yellow());
    println!("  --no-banner               Do not print the banner");
    println!("  --max-depth <n>           Limit nested function calls (env: QBET_MAX_DEPTH)");
    println!("  --out <path>              Output file for build (default: <file>.qb)\n");
    println!("{}", "LANGUAGE FEATURES:".yellow());
    println!("  x = 10                    Assignment");
    println!("  function f(a) {{ return a }} Function definition");
    println!("  for (n in range(3)) {{ }}   Iterate an array");
    println!("  q = hadamard(qubit())     Quantum helpers");
    println!("  balance_chakra(chakra())  Spiritual helpers");
}

fn run_file(path: &str, options: &Options) {
    let source = read_source(path);
    if !options.no_banner {
        print_banner();
    }

    let mut interpreter = new_interpreter(options);

    if let Err(e) = interpreter.eval_source(&source) {
        let err = e.with_source(&source);
        eprintln!("{}", format!("{}", err).red());
        process::exit(1);
    }
}

fn build_file(path: &str, options: &Options) {
    let source = read_source(path);
    let out = options
        .out
        .clone()
        .unwrap_or_else(|| Path::new(path).with_extension("qb").to_string_lossy().into_owned());

    let json = Lowerer::new(&source)
        .and_then(|mut lowerer| lowerer.lower())
        .and_then(|instructions| LoweredModule::new(path, instructions).to_json());

    match json {
        Ok(json) => {
            if let Err(e) = fs::write(&out, json) {
                fail(&format!("cannot write '{}': {}", out, e));
            }
            println!("{} {}", "Lowered".green(), out);
        }
        Err(e) => {
            let err = e.with_source(&source);
            eprintln!("{}", format!("{}", err).red());
            process::exit(1);
        }
    }
}

fn new_interpreter(options: &Options) -> Interpreter {
    Interpreter::with_registry(default_registry(), Box::new(StdConsole), config(options))
}

fn run_repl(options: &Options) {
    if !options.no_banner {
        print_banner();
    }
    println!("Type {} to exit, {} for help\n", "exit".yellow(), "help".yellow());

    let mut rl = DefaultEditor::new().expect("Failed to create REPL");

    // Globals persist across lines
    let mut interpreter = new_interpreter(options);

    loop {
        match rl.readline(&format!("{} ", "qbet>".green().bold())) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    "exit" | "quit" => {
                        println!("{}", "Goodbye!".cyan());
                        break;
                    }
                    "help" => {
                        print_repl_help();
                        continue;
                    }
                    "clear" => {
                        interpreter = new_interpreter(options);
                        println!("{}", "State cleared.".dimmed());
                        continue;
                    }
                    "env" => {
                        print_bindings(&interpreter);
                        continue;
                    }
                    _ => {}
                }

                match interpreter.eval_source(line) {
                    Ok(Value::Null) => {}
                    Ok(value) => println!("{} {}", "=>".dimmed(), format!("{}", value).cyan()),
                    Err(e) => {
                        let err = e.with_source(line);
                        eprintln!("{}", format!("{}", err).red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".cyan());
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "error".red(), err);
                break;
            }
        }
    }
}

/// Print user bindings of the global scope; natives are left out.
fn print_bindings(interpreter: &Interpreter) {
    let globals = interpreter.globals().borrow();
    let mut shown = 0;

    for name in globals.names() {
        match globals.get(&name) {
            Ok(Value::NativeFunction(_)) | Err(_) => {}
            Ok(value) => {
                println!("  {} = {}", name.yellow(), value);
                shown += 1;
            }
        }
    }

    if shown == 0 {
        println!("{}", "No bindings yet.".dimmed());
    }
}

fn print_repl_help() {
    println!("{}", "REPL Commands:".yellow());
    println!("  exit, quit   Exit the REPL");
    println!("  clear        Reset all bindings");
    println!("  env          Show global bindings");
    println!("  help         Show this help\n");
    println!("{}", "Language Examples:".yellow());
    println!("  x = 10");
    println!("  function double(n) {{ return n * 2 }}");
    println!("  print(double(x))");
    println!("  q = qubit(); hadamard(q); measure(q)");
    println!("  c = chakra(\"heart\"); c.balance(10)");
}
