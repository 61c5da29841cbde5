use crate::records::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-less field value as read from a document store.
///
/// The union is wide enough to carry every BSON type the stores we talk to
/// produce. Anything without a dedicated variant travels as canonical
/// extended JSON in [`Value::Extended`] so it is written back verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Binary { subtype: u8, bytes: Vec<u8> },
    ObjectId([u8; 12]),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    Timestamp { time: u32, increment: u32 },
    Decimal128([u8; 16]),
    Array(Vec<Value>),
    Document(Record),
    Extended(serde_json::Value),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "bool",
            Value::Int32(_) => "int",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary { .. } => "binData",
            Value::ObjectId(_) => "objectId",
            Value::DateTime(_) => "date",
            Value::Timestamp { .. } => "timestamp",
            Value::Decimal128(_) => "decimal",
            Value::Array(_) => "array",
            Value::Document(_) => "object",
            Value::Extended(_) => "extended",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::Double(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Record> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(ms) => DateTime::from_timestamp_millis(*ms),
            _ => None,
        }
    }

    /// Approximate encoded size of the value payload, excluding its key.
    ///
    /// Mirrors the BSON wire sizes closely enough for throughput telemetry;
    /// it is not an exact storage measurement.
    pub fn size_bytes(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int32(_) => 4,
            Value::Int64(_) | Value::Double(_) | Value::DateTime(_) => 8,
            Value::Timestamp { .. } => 8,
            // length prefix + bytes + NUL
            Value::String(s) => 4 + s.len() + 1,
            Value::Binary { bytes, .. } => 4 + 1 + bytes.len(),
            Value::ObjectId(_) => 12,
            Value::Decimal128(_) => 16,
            Value::Array(items) => {
                // arrays are documents keyed by their decimal index
                let body: usize = items
                    .iter()
                    .enumerate()
                    .map(|(idx, v)| 1 + idx.to_string().len() + 1 + v.size_bytes())
                    .sum();
                4 + body + 1
            }
            Value::Document(doc) => doc.size_bytes(),
            Value::Extended(v) => serde_json::to_string(v).map_or(0, |s| s.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Binary { subtype, bytes } => {
                write!(f, "Binary({subtype:#04x}, {} bytes)", bytes.len())
            }
            Value::ObjectId(bytes) => {
                let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
                write!(f, "ObjectId({hex})")
            }
            Value::DateTime(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "DateTime({ms})"),
            },
            Value::Timestamp { time, increment } => write!(f, "Timestamp({time}, {increment})"),
            Value::Decimal128(_) => write!(f, "Decimal128(..)"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Document(doc) => write!(f, "{doc}"),
            Value::Extended(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Document(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_wire_layout() {
        assert_eq!(Value::Int32(7).size_bytes(), 4);
        assert_eq!(Value::Int64(7).size_bytes(), 8);
        assert_eq!(Value::from("abc").size_bytes(), 4 + 3 + 1);
        assert_eq!(Value::Null.size_bytes(), 0);

        // 4 (len) + ["0" key: type + "0" + NUL + 4] + NUL
        let arr = Value::from(vec![1i32]);
        assert_eq!(arr.size_bytes(), 4 + (1 + 1 + 1 + 4) + 1);
    }

    #[test]
    fn serde_keeps_variant_tags() {
        let value = Value::Binary {
            subtype: 4,
            bytes: vec![1, 2, 3],
        };
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"binary\""));

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn integer_accessors() {
        assert_eq!(Value::Int32(3).as_i64(), Some(3));
        assert_eq!(Value::Double(4.0).as_i64(), Some(4));
        assert_eq!(Value::Double(4.5).as_i64(), None);
        assert_eq!(Value::from("4").as_i64(), None);
    }
}
