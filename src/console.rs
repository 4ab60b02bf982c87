//! Output sink used by native functions.
//!
//! The interpreter itself never prints; `print` and `input` go through a
//! [`Console`] supplied by the host.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

pub trait Console {
    fn write_line(&mut self, text: &str);

    /// Read one line of input, without the trailing newline. `None` on EOF.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Console backed by the process stdout/stdin
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }
}

/// Console that records output in memory and serves scripted input.
///
/// Clones share the same buffers, so a host can keep one handle and give the
/// other to the interpreter.
#[derive(Debug, Default, Clone)]
pub struct CaptureConsole {
    output: Rc<RefCell<Vec<String>>>,
    input: Rc<RefCell<Vec<String>>>,
}

impl CaptureConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue lines to be returned by `read_line`, in order.
    pub fn with_input(lines: &[&str]) -> Self {
        let console = Self::default();
        console
            .input
            .borrow_mut()
            .extend(lines.iter().rev().map(|line| line.to_string()));
        console
    }

    pub fn lines(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn clear(&self) {
        self.output.borrow_mut().clear();
    }
}

impl Console for CaptureConsole {
    fn write_line(&mut self, text: &str) {
        self.output.borrow_mut().push(text.to_string());
    }

    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.input.borrow_mut().pop()
    }
}
