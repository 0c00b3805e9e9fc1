//! Runtime: one buffered stream, two codec registries, one handler pipeline
//!
//! The runtime owns the read and write halves of its stream. Handlers reach
//! them through the `&mut Runtime` they are given, either as raw bytes
//! ([`std::io::Read`], [`std::io::Write`], [`Runtime::scan_line`]) or through a
//! codec made from the registries ([`Runtime::new_decoder`],
//! [`Runtime::new_encoder`]).

mod handler;
mod options;

pub use handler::Handler;
pub use options::{
    with_decoders, with_encoders, with_handler, with_reader, with_settings, with_writer,
    RuntimeOption, RuntimeSettings,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::encoding::xml::XmlCodec;
use crate::encoding::{
    Decoder, DecoderExt, DecoderRegistry, Encoder, EncoderExt, EncoderRegistry, Value, XML,
};
use crate::errors::Result;

type Input = BufReader<Box<dyn Read + Send>>;
type Output = BufWriter<Box<dyn Write + Send>>;

/// Codec registries plus an ordered handler pipeline over a buffered stream
pub struct Runtime {
    reader: Input,
    writer: Output,
    decoders: DecoderRegistry,
    encoders: EncoderRegistry,
    handlers: Vec<Handler>,
    settings: RuntimeSettings,
}

impl Runtime {
    /// Build a runtime by applying `opts` to an empty one
    ///
    /// The empty runtime reads nothing, discards writes, has no codecs and
    /// no handlers.
    pub fn new<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RuntimeOption>,
    {
        let input: Box<dyn Read + Send> = Box::new(io::empty());
        let output: Box<dyn Write + Send> = Box::new(io::sink());
        let mut runtime = Self {
            reader: BufReader::new(input),
            writer: BufWriter::new(output),
            decoders: DecoderRegistry::new(),
            encoders: EncoderRegistry::new(),
            handlers: Vec::new(),
            settings: RuntimeSettings::default(),
        };
        for opt in opts {
            opt(&mut runtime);
        }
        runtime
    }

    /// Runtime over `reader` and `writer` with the default json, xml and yaml codecs
    pub fn with_defaults<R, W>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self::new([
            with_reader(reader),
            with_writer(writer),
            with_decoders(DecoderRegistry::defaults()),
            with_encoders(EncoderRegistry::defaults()),
        ])
    }

    /// Runtime with the default codecs, adjusted by `config`
    pub fn from_config<R, W>(config: &Config, reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let mut runtime = Self::with_defaults(reader, writer);
        let xml = Arc::new(XmlCodec::with_root(config.codecs.xml_root.clone()));
        runtime.decoders.register(XML, xml.clone());
        runtime.encoders.register(XML, xml);
        runtime.settings = RuntimeSettings::from(config);
        runtime
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    pub fn decoders_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.decoders
    }

    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    pub fn encoders_mut(&mut self) -> &mut EncoderRegistry {
        &mut self.encoders
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RuntimeSettings {
        &mut self.settings
    }

    /// Make a decoder for `id` reading from the runtime's input
    pub fn new_decoder(&mut self, id: &str) -> Result<Box<dyn Decoder + '_>> {
        self.decoders.new_decoder(id, Box::new(&mut self.reader))
    }

    /// Make an encoder for `id` writing to the runtime's output
    pub fn new_encoder(&mut self, id: &str) -> Result<Box<dyn Encoder + '_>> {
        self.encoders.new_encoder(id, Box::new(&mut self.writer))
    }

    /// Like [`Runtime::new_decoder`], but falls back to the configured
    /// default format when `id` is not registered
    pub fn new_decoder_or_default(&mut self, id: &str) -> Result<Box<dyn Decoder + '_>> {
        if self.decoders.contains(id) {
            return self.new_decoder(id);
        }
        let fallback = self.settings.default_format.clone();
        warn!(format = %id, fallback = %fallback, "no decoder registered, using default");
        self.new_decoder(&fallback)
    }

    /// Like [`Runtime::new_encoder`], but falls back to the configured
    /// default format when `id` is not registered
    pub fn new_encoder_or_default(&mut self, id: &str) -> Result<Box<dyn Encoder + '_>> {
        if self.encoders.contains(id) {
            return self.new_encoder(id);
        }
        let fallback = self.settings.default_format.clone();
        warn!(format = %id, fallback = %fallback, "no encoder registered, using default");
        self.new_encoder(&fallback)
    }

    /// Decode one value from the input with a fresh `id` decoder
    pub fn decode(&mut self, id: &str) -> Result<Value> {
        self.new_decoder(id)?.decode()
    }

    /// Decode one value from the input into `T`
    pub fn decode_as<T: DeserializeOwned>(&mut self, id: &str) -> Result<T> {
        self.new_decoder(id)?.decode_as()
    }

    /// Encode one value to the output with a fresh `id` encoder
    pub fn encode(&mut self, id: &str, value: &Value) -> Result<()> {
        self.new_encoder(id)?.encode(value)
    }

    /// Encode any serializable value to the output
    pub fn encode_from<T: Serialize + ?Sized>(&mut self, id: &str, value: &T) -> Result<()> {
        self.new_encoder(id)?.encode_from(value)
    }

    /// Next input line without its `\n` or `\r\n`, or `None` at EOF
    pub fn scan_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Iterate over the remaining input lines
    pub fn scanner(&mut self) -> impl Iterator<Item = io::Result<String>> + '_ {
        (&mut self.reader).lines()
    }

    /// Drain the remaining input into `sink`
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<u64> {
        io::copy(&mut self.reader, sink)
    }

    /// Copy all of `source` into the output
    pub fn read_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<u64> {
        io::copy(source, &mut self.writer)
    }

    /// Flush buffered output
    pub fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Read for Runtime {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for Runtime {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl Write for Runtime {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("decoders", &self.decoders)
            .field("encoders", &self.encoders)
            .field("handlers", &self.handlers.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
