//! QBET - A quantum-spiritual scripting language
//!
//! Source text flows through the [`Lexer`], the [`Parser`] and finally the
//! tree-walking [`Interpreter`], which evaluates against a scope chain
//! pre-populated from a [`NativeRegistry`].

pub mod token;
pub mod lexer;
pub mod parser;
pub mod ast;
pub mod value;
pub mod environment;
pub mod console;
pub mod interpreter;
pub mod stdlib;
pub mod lower;
pub mod error;
mod stack;

pub use console::{CaptureConsole, Console, StdConsole};
pub use error::{ErrorCategory, ErrorKind, QbetError, Result};
pub use interpreter::{Interpreter, InterpreterConfig};
pub use lexer::Lexer;
pub use parser::Parser;
pub use stdlib::{default_registry, NativeRegistry};
pub use value::Value;

/// Convenience function to run QBET code with the standard library
pub fn run(source: &str) -> Result<Value> {
    Interpreter::new().eval_source(source)
}

/// Version of the QBET language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
