//! codecflow library interface
//!
//! A small runtime that couples a registry of format codecs with an ordered
//! pipeline of handlers sharing one buffered stream.
//!
//! # Module Organization
//!
//! - [`encoding`] - Decoder/encoder traits, makers, registries, json/xml/yaml codecs
//! - [`convert`] - CSV line to sequence/mapping helpers, JSON text helpers
//! - [`runtime`] - Runtime, options and the handler pipeline
//! - [`context`] - Cancellation/deadline context passed to handlers
//! - [`config`] - TOML configuration
//! - [`logging`] - tracing subscriber setup
//! - [`errors`] - Error types (CodecflowError, Result)
//!
//! # Example
//!
//! ```
//! use codecflow::{Context, Runtime};
//! use std::io::Cursor;
//!
//! let mut rt = Runtime::with_defaults(Cursor::new(r#"{"name": "ada"}"#), std::io::sink());
//! rt.add_handler(|rt, ctx| {
//!     ctx.check()?;
//!     let value = rt.decode("json")?;
//!     rt.encode("yaml", &value)?;
//!     Ok(())
//! });
//!
//! assert!(rt.runnable());
//! rt.run(&Context::background()).unwrap();
//! rt.close().unwrap();
//! ```

pub mod config;
pub mod context;
pub mod convert;
pub mod encoding;
pub mod errors;
pub mod logging;
pub mod runtime;

pub use context::Context;
pub use errors::{CodecflowError, Result};
pub use runtime::{Handler, Runtime, RuntimeOption, RuntimeSettings};
