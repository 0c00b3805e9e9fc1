//! JSON codec
//!
//! Decoding is incremental: each call consumes exactly one value and leaves
//! whatever follows it on the stream, including the byte the parser has to
//! look at to find the end of a bare number or literal.

use std::io::{self, BufRead, Read, Write};

use super::{Decoder, Encoder, Value};
use crate::errors::{CodecflowError, Result};

/// Decoder for a stream of concatenated or whitespace-separated JSON values
pub struct JsonDecoder<R: BufRead> {
    reader: R,
}

impl<R: BufRead> JsonDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Decoder for JsonDecoder<R> {
    fn decode(&mut self) -> Result<Value> {
        let mut source = Lookahead::new(&mut self.reader);
        let (next, used) = {
            let mut stream =
                serde_json::Deserializer::from_reader(&mut source).into_iter::<Value>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(value)) => {
                source.settle(used);
                Ok(value)
            }
            Some(Err(e)) => {
                source.settle_all();
                Err(e.into())
            }
            None => {
                source.settle_all();
                Err(CodecflowError::EndOfStream)
            }
        }
    }
}

/// Reader over a `BufRead` that defers `consume` until the parser reports
/// how many bytes it used
///
/// Bytes are only consumed from the underlying reader once the parser asks
/// for more than the current buffer holds, which means it has used all of
/// them. Whatever is still pending afterwards is settled against the
/// parser's byte offset.
struct Lookahead<'r, R: BufRead + ?Sized> {
    inner: &'r mut R,
    pending: usize,
    handed_out: usize,
}

impl<'r, R: BufRead + ?Sized> Lookahead<'r, R> {
    fn new(inner: &'r mut R) -> Self {
        Self {
            inner,
            pending: 0,
            handed_out: 0,
        }
    }

    /// Consume everything the parser used out of `handed_out`
    fn settle(self, used: usize) {
        let unread = self.handed_out.saturating_sub(used);
        self.inner.consume(self.pending.saturating_sub(unread));
    }

    fn settle_all(self) {
        self.inner.consume(self.pending);
    }
}

impl<R: BufRead + ?Sized> Read for Lookahead<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending == self.inner.fill_buf()?.len() {
            self.inner.consume(self.pending);
            self.pending = 0;
        }

        let available = &self.inner.fill_buf()?[self.pending..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending += n;
        self.handed_out += n;
        Ok(n)
    }
}

/// Encoder writing one compact JSON value per line
pub struct JsonEncoder<W: Write> {
    writer: W,
}

impl<W: Write> JsonEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Encoder for JsonEncoder<W> {
    fn encode(&mut self, value: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Maker for [`JsonDecoder`]
pub fn new_decoder<'a>(reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> {
    Box::new(JsonDecoder::new(reader))
}

/// Maker for [`JsonEncoder`]
pub fn new_encoder<'a>(writer: Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a> {
    Box::new(JsonEncoder::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_decode_consumes_one_value() {
        let mut input = Cursor::new(r#"{"a":1}{"b":2}"#);
        {
            let mut decoder = JsonDecoder::new(&mut input);
            assert_eq!(decoder.decode().unwrap(), json!({"a": 1}));
        }
        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, r#"{"b":2}"#);
    }

    #[test]
    fn test_decode_leaves_byte_after_scalar() {
        let mut input = Cursor::new("null{\"a\":1}");
        assert_eq!(JsonDecoder::new(&mut input).decode().unwrap(), Value::Null);
        assert_eq!(JsonDecoder::new(&mut input).decode().unwrap(), json!({"a": 1}));

        let mut input = Cursor::new("1[2]");
        assert_eq!(JsonDecoder::new(&mut input).decode().unwrap(), json!(1));
        assert_eq!(JsonDecoder::new(&mut input).decode().unwrap(), json!([2]));
    }

    #[test]
    fn test_decode_scalar_across_buffer_boundary() {
        let mut reader = BufReader::with_capacity(2, Cursor::new("123 true"));
        assert_eq!(JsonDecoder::new(&mut reader).decode().unwrap(), json!(123));
        assert_eq!(JsonDecoder::new(&mut reader).decode().unwrap(), json!(true));
        assert!(matches!(
            JsonDecoder::new(&mut reader).decode(),
            Err(CodecflowError::EndOfStream)
        ));
    }

    #[test]
    fn test_decode_successive_values() {
        let mut decoder = JsonDecoder::new(Cursor::new("1 \"two\"\n[3]"));
        assert_eq!(decoder.decode().unwrap(), json!(1));
        assert_eq!(decoder.decode().unwrap(), json!("two"));
        assert_eq!(decoder.decode().unwrap(), json!([3]));
        assert!(matches!(decoder.decode(), Err(CodecflowError::EndOfStream)));
    }

    #[test]
    fn test_decode_malformed() {
        let mut decoder = JsonDecoder::new(Cursor::new(r#"{"a": }"#));
        assert!(matches!(decoder.decode(), Err(CodecflowError::Json(_))));
    }

    #[test]
    fn test_decode_empty_stream() {
        let mut decoder = JsonDecoder::new(Cursor::new("   \n"));
        assert!(matches!(decoder.decode(), Err(CodecflowError::EndOfStream)));
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let mut decoder = JsonDecoder::new(Cursor::new(r#"{"z":1,"a":2,"m":3}"#));
        let value = decoder.decode().unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_encode_one_value_per_line() {
        let mut out = Vec::new();
        {
            let mut encoder = JsonEncoder::new(&mut out);
            encoder.encode(&json!({"a": [1, 2]})).unwrap();
            encoder.encode(&json!(null)).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":[1,2]}\nnull\n");
    }
}
