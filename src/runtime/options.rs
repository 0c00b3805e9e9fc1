//! Construction options for [`Runtime::new`]

use std::io::{BufReader, BufWriter, Read, Write};
use std::sync::Arc;

use super::{Handler, Runtime};
use crate::config::Config;
use crate::context::Context;
use crate::encoding::{DecoderRegistry, EncoderRegistry, JSON};
use crate::errors::Result;

/// A configuration step applied to a runtime under construction
pub type RuntimeOption = Box<dyn FnOnce(&mut Runtime)>;

/// Knobs that change how the runtime behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Format the `*_or_default` codec lookups fall back to
    pub default_format: String,
    /// Check the context before each handler instead of leaving it
    /// entirely to the handlers
    pub check_context_between_handlers: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            default_format: JSON.to_string(),
            check_context_between_handlers: false,
        }
    }
}

impl From<&Config> for RuntimeSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_format: config.codecs.default_format.clone(),
            check_context_between_handlers: config.runtime.check_context_between_handlers,
        }
    }
}

/// Read input from `reader`, buffered
pub fn with_reader<R: Read + Send + 'static>(reader: R) -> RuntimeOption {
    let reader: Box<dyn Read + Send> = Box::new(reader);
    Box::new(move |rt: &mut Runtime| rt.reader = BufReader::new(reader))
}

/// Write output to `writer`, buffered until [`Runtime::close`]
pub fn with_writer<W: Write + Send + 'static>(writer: W) -> RuntimeOption {
    let writer: Box<dyn Write + Send> = Box::new(writer);
    Box::new(move |rt: &mut Runtime| rt.writer = BufWriter::new(writer))
}

pub fn with_decoders(decoders: DecoderRegistry) -> RuntimeOption {
    Box::new(move |rt: &mut Runtime| rt.decoders = decoders)
}

pub fn with_encoders(encoders: EncoderRegistry) -> RuntimeOption {
    Box::new(move |rt: &mut Runtime| rt.encoders = encoders)
}

pub fn with_settings(settings: RuntimeSettings) -> RuntimeOption {
    Box::new(move |rt: &mut Runtime| rt.settings = settings)
}

/// Append a handler to the pipeline
pub fn with_handler<F>(handler: F) -> RuntimeOption
where
    F: Fn(&mut Runtime, &Context) -> Result<()> + Send + Sync + 'static,
{
    let handler: Handler = Arc::new(handler);
    Box::new(move |rt: &mut Runtime| rt.handlers.push(handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.codecs.default_format = "yaml".to_string();
        config.runtime.check_context_between_handlers = true;

        let settings = RuntimeSettings::from(&config);
        assert_eq!(settings.default_format, "yaml");
        assert!(settings.check_context_between_handlers);
    }

    #[test]
    fn test_with_handler_appends() {
        let rt = Runtime::new([
            with_handler(|_, _| Ok(())),
            with_handler(|_, _| Ok(())),
            with_settings(RuntimeSettings {
                default_format: "xml".to_string(),
                check_context_between_handlers: true,
            }),
        ]);
        assert_eq!(rt.handler_count(), 2);
        assert_eq!(rt.settings().default_format, "xml");
    }
}
