use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single named value inside a [`Record`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// One schema-less document: an ordered mapping of field name to value.
///
/// Field order is preserved exactly as read; lookups are linear, which is
/// fine for the field counts documents carry in practice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name` to `value`, replacing an existing field in place so the
    /// original position is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => Some(std::mem::replace(&mut field.value, value)),
            None => {
                self.fields.push(Field { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(idx).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|f| (f.name.as_str(), &f.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Estimated encoded size of the whole document: a length prefix, one
    /// type byte + NUL-terminated key per field, the payloads, and the
    /// trailing NUL.
    pub fn size_bytes(&self) -> usize {
        let body: usize = self
            .fields
            .iter()
            .map(|f| 1 + f.name.len() + 1 + f.value.size_bytes())
            .sum();
        4 + body + 1
    }

    /// Deterministic byte encoding used for batch checksums.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::iter::Map<std::vec::IntoIter<Field>, fn(Field) -> (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        fn split(field: Field) -> (String, Value) {
            (field.name, field.value)
        }
        self.fields
            .into_iter()
            .map(split as fn(Field) -> (String, Value))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.value)?;
        }
        write!(f, "}}")
    }
}
