//! Format identifier to maker registries

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

use super::xml::XmlCodec;
use super::{json, yaml, Decoder, DecoderMaker, Encoder, EncoderMaker, JSON, XML, YAML};
use crate::errors::{CodecflowError, Result};

/// Maps format identifiers to makers
///
/// Identifiers are case-sensitive and unvalidated. Registering an identifier
/// twice keeps the last maker. Cloning a registry is cheap and yields an
/// independent map sharing the same maker instances.
pub struct CodecRegistry<M: ?Sized> {
    makers: HashMap<String, Arc<M>>,
}

/// Registry of decoder makers
pub type DecoderRegistry = CodecRegistry<dyn DecoderMaker>;

/// Registry of encoder makers
pub type EncoderRegistry = CodecRegistry<dyn EncoderMaker>;

impl<M: ?Sized> CodecRegistry<M> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            makers: HashMap::new(),
        }
    }

    /// Store `maker` under `id`, returning the maker it replaced
    pub fn register(&mut self, id: impl Into<String>, maker: Arc<M>) -> Option<Arc<M>> {
        let id = id.into();
        let previous = self.makers.insert(id.clone(), maker);
        debug!(format = %id, replaced = previous.is_some(), "codec registered");
        previous
    }

    /// Find the maker registered under `id`
    pub fn lookup(&self, id: &str) -> Option<&Arc<M>> {
        self.makers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.makers.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn formats(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.makers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.makers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.makers.is_empty()
    }

    fn require(&self, id: &str) -> Result<&Arc<M>> {
        self.lookup(id)
            .ok_or_else(|| CodecflowError::UnknownFormat(id.to_string()))
    }
}

impl<M: ?Sized> Default for CodecRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ?Sized> Clone for CodecRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            makers: self.makers.clone(),
        }
    }
}

impl<M: ?Sized> fmt::Debug for CodecRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl CodecRegistry<dyn DecoderMaker> {
    /// Registry holding the built-in json, xml and yaml decoders
    ///
    /// Each call builds a new value; no registry is shared between callers.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JSON, Arc::new(json::new_decoder));
        registry.register(XML, Arc::new(XmlCodec::default()));
        registry.register(YAML, Arc::new(yaml::new_decoder));
        registry
    }

    /// Make a decoder for `id` bound to `reader`
    pub fn new_decoder<'a>(
        &self,
        id: &str,
        reader: Box<dyn BufRead + 'a>,
    ) -> Result<Box<dyn Decoder + 'a>> {
        Ok(self.require(id)?.new_decoder(reader))
    }
}

impl CodecRegistry<dyn EncoderMaker> {
    /// Registry holding the built-in json, xml and yaml encoders
    ///
    /// Each call builds a new value; no registry is shared between callers.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JSON, Arc::new(json::new_encoder));
        registry.register(XML, Arc::new(XmlCodec::default()));
        registry.register(YAML, Arc::new(yaml::new_encoder));
        registry
    }

    /// Make an encoder for `id` bound to `writer`
    pub fn new_encoder<'a>(
        &self,
        id: &str,
        writer: Box<dyn Write + 'a>,
    ) -> Result<Box<dyn Encoder + 'a>> {
        Ok(self.require(id)?.new_encoder(writer))
    }
}
