//! Scalar metadata values
//!
//! Scanners store every per-image scalar they find (JFIF fields, GIF loop
//! counts, PNG gamma, comment bytes) as a [`MetaValue`]; the report builder
//! renders them as text lines.

use std::fmt;

/// A scalar metadata field value
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Text value
    Str(String),
    /// Integer value
    Int(i64),
    /// Floating point value (e.g. PNG gamma)
    Float(f64),
    /// Two-integer tuple (e.g. a JFIF version or density pair)
    Pair(i64, i64),
    /// Raw byte string (e.g. a JPEG comment)
    Bytes(Vec<u8>),
}

impl MetaValue {
    /// Get the value as text, if it is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is an integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as raw bytes, if it is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MetaValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Str(s) => write!(f, "{}", s),
            MetaValue::Int(i) => write!(f, "{}", i),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Pair(a, b) => write!(f, "({}, {})", a, b),
            MetaValue::Bytes(b) => write!(f, "{}", bytes_repr(b)),
        }
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Str(s)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Str(s.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Int(i)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<(i64, i64)> for MetaValue {
    fn from((a, b): (i64, i64)) -> Self {
        MetaValue::Pair(a, b)
    }
}

impl From<Vec<u8>> for MetaValue {
    fn from(b: Vec<u8>) -> Self {
        MetaValue::Bytes(b)
    }
}

/// Render bytes as a quoted `b"..."` literal.
///
/// Printable ASCII passes through, `\n`/`\r`/`\t`/`\"`/`\\` use their short
/// escapes, everything else becomes `\xNN`. Diagnostic output only; not
/// reversible for all inputs.
pub fn bytes_repr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b\"");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                out.push_str(&format!("\\x{:02x}", b));
            }
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_formats() {
        assert_eq!(MetaValue::Str("GIF89a".into()).to_string(), "GIF89a");
        assert_eq!(MetaValue::Int(3).to_string(), "3");
        assert_eq!(MetaValue::Pair(1, 2).to_string(), "(1, 2)");
        assert_eq!(MetaValue::Float(0.45455).to_string(), "0.45455");
    }

    #[test]
    fn bytes_repr_escapes() {
        assert_eq!(bytes_repr(b"abc"), "b\"abc\"");
        assert_eq!(bytes_repr(b"a\x00b"), "b\"a\\x00b\"");
        assert_eq!(bytes_repr(b"line\nbreak"), "b\"line\\nbreak\"");
        assert_eq!(bytes_repr(b"q\"q"), "b\"q\\\"q\"");
        assert_eq!(bytes_repr(&[0xff, 0xfe]), "b\"\\xff\\xfe\"");
    }

    #[test]
    fn accessors() {
        assert_eq!(MetaValue::Int(7).as_int(), Some(7));
        assert_eq!(MetaValue::Str("x".into()).as_int(), None);
        assert_eq!(MetaValue::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    }
}
