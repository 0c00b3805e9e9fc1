//! Format codecs and their registries
//!
//! A codec is bound to one stream when it is made. Decoders pull one value
//! per [`Decoder::decode`] call; encoders push one value per
//! [`Encoder::encode`] call. Values travel as [`serde_json::Value`], which
//! keeps key order (`preserve_order`) and converts to typed data through
//! [`DecoderExt::decode_as`] and [`EncoderExt::encode_from`].
//!
//! Makers are looked up by format identifier in a [`CodecRegistry`].
//! Any function with the right signature is a maker:
//!
//! ```
//! use std::io::BufRead;
//! use codecflow::encoding::{json::JsonDecoder, Decoder, DecoderRegistry};
//!
//! fn ndjson<'a>(reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> {
//!     Box::new(JsonDecoder::new(reader))
//! }
//!
//! let mut registry = DecoderRegistry::new();
//! registry.register("ndjson", std::sync::Arc::new(ndjson));
//! assert!(registry.contains("ndjson"));
//! ```

pub mod json;
pub mod registry;
pub mod xml;
pub mod yaml;

pub use registry::{CodecRegistry, DecoderRegistry, EncoderRegistry};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, Write};

use crate::errors::Result;

/// Format-neutral value exchanged with codecs
pub type Value = serde_json::Value;

/// Identifiers installed by the default registries
pub const JSON: &str = "json";
pub const XML: &str = "xml";
pub const YAML: &str = "yaml";

/// Decodes values from the stream it was made for
pub trait Decoder {
    /// Decode the next value
    fn decode(&mut self) -> Result<Value>;
}

/// Encodes values onto the stream it was made for
pub trait Encoder {
    /// Encode one value
    fn encode(&mut self, value: &Value) -> Result<()>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&mut self) -> Result<Value> {
        (**self).decode()
    }
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&mut self, value: &Value) -> Result<()> {
        (**self).encode(value)
    }
}

/// Creates a fresh [`Decoder`] bound to a readable stream
///
/// Makers must not carry state from one call to the next.
pub trait DecoderMaker: Send + Sync {
    fn new_decoder<'a>(&self, reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a>;
}

/// Creates a fresh [`Encoder`] bound to a writable stream
///
/// Makers must not carry state from one call to the next.
pub trait EncoderMaker: Send + Sync {
    fn new_encoder<'a>(&self, writer: Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a>;
}

impl<F> DecoderMaker for F
where
    F: for<'a> Fn(Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> + Send + Sync,
{
    fn new_decoder<'a>(&self, reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> {
        self(reader)
    }
}

impl<F> EncoderMaker for F
where
    F: for<'a> Fn(Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a> + Send + Sync,
{
    fn new_encoder<'a>(&self, writer: Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a> {
        self(writer)
    }
}

/// Typed decoding on top of [`Decoder`]
pub trait DecoderExt: Decoder {
    /// Decode the next value into `T`
    fn decode_as<T: DeserializeOwned>(&mut self) -> Result<T> {
        let value = self.decode()?;
        Ok(serde_json::from_value(value)?)
    }
}

impl<D: Decoder + ?Sized> DecoderExt for D {}

/// Typed encoding on top of [`Encoder`]
pub trait EncoderExt: Encoder {
    /// Encode any serializable value
    fn encode_from<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.encode(&value)
    }
}

impl<E: Encoder + ?Sized> EncoderExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_decode_as_typed() {
        let mut decoder = json::JsonDecoder::new(Cursor::new(r#"{"x": 1, "y": -2}"#));
        let point: Point = decoder.decode_as().unwrap();
        assert_eq!(point, Point { x: 1, y: -2 });
    }

    #[test]
    fn test_decode_as_type_mismatch() {
        let mut decoder = json::JsonDecoder::new(Cursor::new(r#"{"x": "one"}"#));
        assert!(decoder.decode_as::<Point>().is_err());
    }

    #[test]
    fn test_encode_from_typed() {
        let mut out = Vec::new();
        {
            let mut encoder = json::JsonEncoder::new(&mut out);
            encoder.encode_from(&Point { x: 3, y: 4 }).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "{\"x\":3,\"y\":4}\n");
    }

    #[test]
    fn test_boxed_decoder_is_decoder() {
        let mut decoder: Box<dyn Decoder> = Box::new(json::JsonDecoder::new(Cursor::new("[1]")));
        let items: Vec<u8> = decoder.decode_as().unwrap();
        assert_eq!(items, vec![1]);
    }
}
