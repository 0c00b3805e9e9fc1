//! YAML codec
//!
//! The YAML parser works on a complete buffer, so the decoder reads its
//! stream to EOF on the first call and decodes the first document found.
//! Anything after that document is consumed and discarded.

use serde::Deserialize;
use std::io::{BufRead, Read, Write};

use super::{Decoder, Encoder, Value};
use crate::errors::Result;

/// Whole-buffer YAML decoder
pub struct YamlDecoder<R: Read> {
    reader: R,
}

impl<R: Read> YamlDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> Decoder for YamlDecoder<R> {
    /// Read the rest of the stream and decode its first document
    ///
    /// An exhausted or empty stream decodes to `null`.
    fn decode(&mut self) -> Result<Value> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;

        let value = match serde_yaml::Deserializer::from_slice(&buf).next() {
            Some(document) => Value::deserialize(document)?,
            None => Value::Null,
        };
        Ok(value)
    }
}

/// YAML encoder
///
/// Every document starts with a `---` marker, so output from separate
/// encoders on one stream still reads back as separate documents.
pub struct YamlEncoder<W: Write> {
    writer: W,
}

impl<W: Write> YamlEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Encoder for YamlEncoder<W> {
    fn encode(&mut self, value: &Value) -> Result<()> {
        self.writer.write_all(b"---\n")?;
        serde_yaml::to_writer(&mut self.writer, value)?;
        Ok(())
    }
}

/// Maker for [`YamlDecoder`]
pub fn new_decoder<'a>(reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> {
    Box::new(YamlDecoder::new(reader))
}

/// Maker for [`YamlEncoder`]
pub fn new_encoder<'a>(writer: Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a> {
    Box::new(YamlEncoder::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_decode_mapping() {
        let mut decoder = YamlDecoder::new(Cursor::new("name: ada\ntags:\n  - a\n  - b\ncount: 3\n"));
        assert_eq!(
            decoder.decode().unwrap(),
            json!({"name": "ada", "tags": ["a", "b"], "count": 3})
        );
    }

    #[test]
    fn test_decode_exhausts_stream() {
        let mut input = Cursor::new("a: 1\n---\nb: 2\n");
        {
            let mut decoder = YamlDecoder::new(&mut input);
            assert_eq!(decoder.decode().unwrap(), json!({"a": 1}));
        }
        assert_eq!(input.position(), input.get_ref().len() as u64);
    }

    #[test]
    fn test_decode_after_exhaustion_is_null() {
        let mut decoder = YamlDecoder::new(Cursor::new("x: true\n"));
        decoder.decode().unwrap();
        assert_eq!(decoder.decode().unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_malformed() {
        let mut decoder = YamlDecoder::new(Cursor::new("key: [unclosed\n"));
        assert!(matches!(
            decoder.decode(),
            Err(crate::errors::CodecflowError::Yaml(_))
        ));
    }

    #[test]
    fn test_encode_separates_documents() {
        let mut out = Vec::new();
        {
            let mut encoder = YamlEncoder::new(&mut out);
            encoder.encode(&json!({"a": 1})).unwrap();
            encoder.encode(&json!({"b": 2})).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "---\na: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_separate_encoders_write_separate_documents() {
        let mut out = Vec::new();
        YamlEncoder::new(&mut out).encode(&json!(1)).unwrap();
        YamlEncoder::new(&mut out).encode(&json!(2)).unwrap();

        let documents: Vec<Value> = serde_yaml::Deserializer::from_slice(&out)
            .map(|document| Value::deserialize(document).unwrap())
            .collect();
        assert_eq!(documents, vec![json!(1), json!(2)]);
    }
}
