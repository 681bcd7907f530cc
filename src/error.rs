//! Diagnostics context shared by every pipeline stage.
//!
//! The classic Lox reference keeps `hadError`/`hadRuntimeError` as process
//! globals. Per the design note that every stage's errors should belong to
//! "a per-run context object owned by the driver", `Diagnostics` is that
//! object: scanner, parser, resolver and interpreter all take `&mut
//! Diagnostics` instead of reaching for statics, and the driver builds a
//! fresh one per `eval` call so a mistake on one REPL line can't poison
//! the next, without `unsafe`.

use crate::token::{Token, TokenKind};

/// A runtime error: carries the token nearest the failure (for its line
/// number) and a human-readable message. Propagated as `Err` up to the
/// top of the current top-level statement batch, where the driver reports
/// it and moves on (REPL) or exits with code 70 (script).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError { token, message: message.into() }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Reports a lexical error. WHERE is always empty for scan errors —
    /// the scanner only ever knows "something odd happened on this line".
    pub fn scan_error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
        self.had_error = true;
    }

    /// Reports a parse or a static-resolution error, both of which point
    /// at an offending token rather than a bare line.
    pub fn token_error(&mut self, token: &Token, message: &str) {
        let location = if token.kind == TokenKind::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        self.report(token.line, &location, message);
        self.had_error = true;
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}\n[line {}]", error.message, error.token.line);
        self.had_runtime_error = true;
    }

    fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {line}] Error{location}: {message}");
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }
}
