//! Scalar conversion helpers
//!
//! Turn single-line textual settings into structured values, and values
//! into JSON text for logging.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::errors::{CodecflowError, Result};

/// Parse one line of CSV into its fields
///
/// Empty input yields no fields. So does input holding no record at all,
/// such as a lone line break: the csv reader skips blank lines, and the
/// result is an empty vec rather than an end-of-input error. Only the first
/// record is read.
///
/// # Examples
/// ```
/// use codecflow::convert::read_as_sequence;
/// assert_eq!(read_as_sequence("a,\"b,c\",d").unwrap(), vec!["a", "b,c", "d"]);
/// assert!(read_as_sequence("").unwrap().is_empty());
/// assert!(read_as_sequence("\n").unwrap().is_empty());
/// ```
pub fn read_as_sequence(raw: &str) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    check_quoting(raw)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }

    Ok(record.iter().map(String::from).collect())
}

/// Reject quoting the csv reader would silently accept
///
/// A quote may only open a field, a quoted field must be closed, and a
/// closing quote must be followed by a comma or the end of the record.
/// Checking stops at the end of the first record.
fn check_quoting(raw: &str) -> Result<()> {
    let mut chars = raw.chars().enumerate().peekable();
    let mut field_start = true;

    while let Some((col, c)) = chars.next() {
        match c {
            '"' if field_start => {
                loop {
                    match chars.next() {
                        Some((_, '"')) if matches!(chars.peek(), Some((_, '"'))) => {
                            chars.next();
                        }
                        Some((_, '"')) => break,
                        Some(_) => {}
                        None => return Err(quote_error(col, "extraneous or missing \" in quoted-field")),
                    }
                }
                match chars.peek() {
                    None | Some((_, ',')) | Some((_, '\n')) | Some((_, '\r')) => {}
                    Some(&(after, _)) => {
                        return Err(quote_error(after, "extraneous or missing \" in quoted-field"))
                    }
                }
                field_start = false;
            }
            '"' => return Err(quote_error(col, "bare \" in non-quoted-field")),
            ',' => field_start = true,
            '\n' => break,
            _ => field_start = false,
        }
    }

    Ok(())
}

fn quote_error(col: usize, message: &str) -> CodecflowError {
    CodecflowError::CsvSyntax {
        column: col + 1,
        message: message.to_string(),
    }
}

/// Parse one line of CSV into `key=value` / `key:value` pairs
///
/// Each field is split on its first `=`; fields without `=` are split on
/// their first `:`. Keys and values are trimmed. Fields with neither
/// separator are skipped. Later duplicates overwrite earlier keys.
///
/// # Examples
/// ```
/// use codecflow::convert::read_as_mapping;
/// let map = read_as_mapping("a=1,b:2").unwrap();
/// assert_eq!(map["a"], "1");
/// assert_eq!(map["b"], "2");
/// ```
pub fn read_as_mapping(raw: &str) -> Result<IndexMap<String, String>> {
    let mut mapping = IndexMap::new();

    for field in read_as_sequence(raw)? {
        match field.split_once('=').or_else(|| field.split_once(':')) {
            Some((key, value)) => {
                mapping.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => trace!(field = %field, "skipping field without separator"),
        }
    }

    Ok(mapping)
}

/// Compact JSON text for `value`, or `""` if it cannot be serialized
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> String {
    try_to_json_text(value).unwrap_or_else(|e| {
        debug!(error = %e, "dropping unserializable value");
        String::new()
    })
}

/// Indented JSON text for `value`, or `""` if it cannot be serialized
pub fn to_pretty_json_text<T: Serialize + ?Sized>(value: &T) -> String {
    try_to_pretty_json_text(value).unwrap_or_else(|e| {
        debug!(error = %e, "dropping unserializable value");
        String::new()
    })
}

/// Compact JSON text for `value`
pub fn try_to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// JSON text for `value` indented by two spaces
pub fn try_to_pretty_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
