//! Common test utilities for codecflow integration tests
//!
//! This module provides shared test infrastructure including:
//! - A writer whose contents stay inspectable after a runtime takes it
//! - Runtime construction helpers over in-memory input

#![allow(dead_code)]

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use codecflow::Runtime;

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runtime with the default codecs reading `input`
pub fn runtime_with_input(input: &str) -> (Runtime, SharedBuffer) {
    let output = SharedBuffer::new();
    let rt = Runtime::with_defaults(Cursor::new(input.to_string()), output.clone());
    (rt, output)
}
