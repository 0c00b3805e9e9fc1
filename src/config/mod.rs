//! Configuration loading

mod config;

pub use config::{CodecsConfig, Config, LogFormat, LoggingConfig, RuntimeConfig};
