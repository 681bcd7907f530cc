//! Shared test plumbing: a `Write` sink that can be read back after the
//! `Braid` it was handed to is done with it, plus a small DSL on top of it
//! for the common "run this source, expect this stdout" shape.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("program output to be valid utf-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `source` and asserts the printed lines match `expected` exactly
/// and that neither a compile-time nor a runtime error occurred.
#[macro_export]
macro_rules! assert_prints {
    ($source:expr, [$($line:expr),* $(,)?]) => {{
        let buffer = $crate::common::SharedBuffer::default();
        let mut braid = braid::Braid::with_output(Box::new(buffer.clone()));
        let diagnostics = braid.eval($source);
        assert!(!diagnostics.had_error(), "unexpected compile-time error for: {}", $source);
        assert!(!diagnostics.had_runtime_error(), "unexpected runtime error for: {}", $source);

        let mut expected_lines: Vec<&str> = vec![$($line),*];
        let expected = if expected_lines.is_empty() {
            String::new()
        } else {
            expected_lines.push("");
            expected_lines.join("\n")
        };
        assert_eq!(buffer.contents(), expected);
    }};
}

/// Runs `source` and asserts it raised a runtime error (exit code 70 at
/// the process level).
#[macro_export]
macro_rules! assert_runtime_error {
    ($source:expr) => {{
        let mut braid = braid::Braid::with_output(Box::new(Vec::new()));
        let diagnostics = braid.eval($source);
        assert!(!diagnostics.had_error(), "expected a runtime error, got a compile-time one");
        assert!(diagnostics.had_runtime_error(), "expected a runtime error for: {}", $source);
    }};
}

/// Runs `source` and asserts it raised a scan/parse/resolve error (exit
/// code 65 at the process level).
#[macro_export]
macro_rules! assert_compile_error {
    ($source:expr) => {{
        let mut braid = braid::Braid::with_output(Box::new(Vec::new()));
        let diagnostics = braid.eval($source);
        assert!(diagnostics.had_error(), "expected a compile-time error for: {}", $source);
    }};
}
