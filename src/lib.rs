//! Braid is a small dynamically typed, lexically scoped, class-based
//! scripting language, implemented here as a tree-walking interpreter.
//!
//! A program runs through four stages, each handing its output to the
//! next:
//!
//! ## Scanning
//! The [`scanner`] module turns source text into a flat token stream.
//! Lexical errors (an unterminated string, a stray character) are reported
//! immediately and scanning continues past them, so a single run can
//! surface more than one mistake.
//!
//! ## Parsing
//! The [`parser`] module is a recursive-descent parser producing a tree of
//! [`stmt::Stmt`]/[`expr::Expr`] nodes. A parse error triggers panic-mode
//! recovery: the parser discards tokens up to the next likely statement
//! boundary and keeps going, rather than giving up on the whole file.
//!
//! ## Resolving
//! The [`resolver`] module walks the parsed tree once before it is ever
//! run, computing how many lexical scopes out each variable reference's
//! declaration sits. This side-table is what lets closures see a stable
//! binding even as later code defines new variables in an enclosing scope,
//! and it is also where purely static mistakes — `return` outside a
//! function, `this` outside a class, a class inheriting from itself — get
//! caught before any code executes.
//!
//! ## Interpreting
//! The [`interpreter`] module walks the same tree again, this time
//! evaluating it: [`environment`] holds the chained scopes, [`function`]
//! and [`class`] implement closures and single-inheritance classes, and
//! [`value::Value`] is the universe of values a Braid expression can
//! produce.
//!
//! Errors at every stage are collected on a single [`error::Diagnostics`]
//! value owned by the caller, rather than on process-wide state, so a REPL
//! can clear it between lines and a library embedder can run many
//! independent programs without stepping on shared globals.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process;

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// The driver: owns the interpreter's persistent state (globals,
/// closures — everything that must survive across REPL lines) and the
/// diagnostics context for the run currently in progress.
pub struct Braid {
    interpreter: Interpreter,
}

impl Braid {
    pub fn new() -> Self {
        Braid { interpreter: Interpreter::new() }
    }

    /// Builds a driver that sends `print` output to `output` instead of
    /// stdout, so embedders and tests can capture it.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Braid { interpreter: Interpreter::with_output(output) }
    }

    /// Runs a script file to completion and exits the process with the
    /// conventional `sysexits.h`-derived codes: 65 for a scan/parse/resolve
    /// error, 70 for an uncaught runtime error, 0 otherwise.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> ! {
        let contents = fs::read_to_string(path.as_ref()).unwrap_or_else(|error| {
            eprintln!("Could not read file '{}': {error}", path.as_ref().display());
            process::exit(66);
        });

        let diagnostics = self.eval(contents);

        if diagnostics.had_error() {
            process::exit(65);
        }
        if diagnostics.had_runtime_error() {
            process::exit(70);
        }
        process::exit(0);
    }

    /// Runs an interactive prompt, one line at a time, persisting
    /// variables and functions declared in earlier lines. Line history is
    /// kept in `~/.braid_history`; a REPL with no usable home directory
    /// (or history file) just runs without persistence.
    pub fn run_prompt(&mut self) {
        let mut editor = rustyline::Editor::<()>::new().expect("line editor to initialize");
        let history_path = home::home_dir().map(|home| home.join(".braid_history"));
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    self.eval(line);
                }
                Err(rustyline::error::ReadlineError::Interrupted | rustyline::error::ReadlineError::Eof) => break,
                Err(error) => {
                    eprintln!("Error reading input: {error}");
                    break;
                }
            }
        }

        if let Some(path) = &history_path {
            let _ = editor.save_history(path);
        }
    }

    /// Runs one batch of source through the full pipeline and returns the
    /// diagnostics collected along the way, without touching the process.
    /// `run_file`/`run_prompt` are thin wrappers around this; embedders and
    /// tests that need to inspect errors or capture output call it
    /// directly.
    pub fn eval(&mut self, source: impl Into<String>) -> Diagnostics {
        let source = source.into();
        let mut diagnostics = Diagnostics::new();

        let tokens = Scanner::new(&source).scan_tokens(&mut diagnostics);
        if diagnostics.had_error() {
            return diagnostics;
        }

        let statements = Parser::new(tokens).parse(&mut diagnostics);
        if diagnostics.had_error() {
            return diagnostics;
        }

        Resolver::new(&mut self.interpreter, &mut diagnostics).resolve(&statements);
        if diagnostics.had_error() {
            return diagnostics;
        }

        self.interpreter.interpret(&statements, &mut diagnostics);
        diagnostics
    }
}

impl Default for Braid {
    fn default() -> Self {
        Self::new()
    }
}
