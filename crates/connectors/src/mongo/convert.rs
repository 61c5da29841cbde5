//! Lossless mapping between BSON and the store-neutral [`Value`] union.

use crate::error::AdapterError;
use model::{core::value::Value, records::record::Record};
use mongodb::bson::{
    Binary, Bson, DateTime, Decimal128, Document, Timestamp, oid::ObjectId, spec::BinarySubtype,
};

pub fn document_to_record(doc: Document) -> Record {
    let mut record = Record::with_capacity(doc.len());
    for (name, value) in doc {
        record.insert(name, bson_to_value(value));
    }
    record
}

pub fn bson_to_value(value: Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(v) => Value::Boolean(v),
        Bson::Int32(v) => Value::Int32(v),
        Bson::Int64(v) => Value::Int64(v),
        Bson::Double(v) => Value::Double(v),
        Bson::String(v) => Value::String(v),
        Bson::Binary(bin) => Value::Binary {
            subtype: u8::from(bin.subtype),
            bytes: bin.bytes,
        },
        Bson::ObjectId(oid) => Value::ObjectId(oid.bytes()),
        Bson::DateTime(dt) => Value::DateTime(dt.timestamp_millis()),
        Bson::Timestamp(ts) => Value::Timestamp {
            time: ts.time,
            increment: ts.increment,
        },
        Bson::Decimal128(d) => Value::Decimal128(d.bytes()),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_value).collect()),
        Bson::Document(doc) => Value::Document(document_to_record(doc)),
        // regex, code, symbol, min/max key, ...
        other => Value::Extended(other.into_canonical_extjson()),
    }
}

pub fn record_to_document(record: Record) -> Result<Document, AdapterError> {
    let mut doc = Document::new();
    for (name, value) in record {
        let bson = value_to_bson(&name, value)?;
        doc.insert(name, bson);
    }
    Ok(doc)
}

fn value_to_bson(field: &str, value: Value) -> Result<Bson, AdapterError> {
    let bson = match value {
        Value::Null => Bson::Null,
        Value::Boolean(v) => Bson::Boolean(v),
        Value::Int32(v) => Bson::Int32(v),
        Value::Int64(v) => Bson::Int64(v),
        Value::Double(v) => Bson::Double(v),
        Value::String(v) => Bson::String(v),
        Value::Binary { subtype, bytes } => Bson::Binary(Binary {
            subtype: BinarySubtype::from(subtype),
            bytes,
        }),
        Value::ObjectId(bytes) => Bson::ObjectId(ObjectId::from_bytes(bytes)),
        Value::DateTime(ms) => Bson::DateTime(DateTime::from_millis(ms)),
        Value::Timestamp { time, increment } => Bson::Timestamp(Timestamp { time, increment }),
        Value::Decimal128(bytes) => Bson::Decimal128(Decimal128::from_bytes(bytes)),
        Value::Array(items) => Bson::Array(
            items
                .into_iter()
                .map(|item| value_to_bson(field, item))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Document(record) => Bson::Document(record_to_document(record)?),
        Value::Extended(json) => {
            Bson::try_from(json).map_err(|e| AdapterError::conversion(field, e.to_string()))?
        }
    };
    Ok(bson)
}
