use crate::{
    collection::{CollectionStats, SourceCollection, TargetCollection},
    error::AdapterError,
    mongo::convert::{document_to_record, record_to_document},
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use model::records::record::Record;
use mongodb::{
    Collection, Database,
    bson::{Bson, Document, doc},
};
use tracing::debug;

/// Collection handle usable both as a transfer source and target.
#[derive(Clone)]
pub struct MongoCollection {
    db: Database,
    inner: Collection<Document>,
    name: String,
}

impl MongoCollection {
    pub fn new(db: Database, name: &str) -> Self {
        let inner = db.collection::<Document>(name);
        MongoCollection {
            db,
            inner,
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl SourceCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self) -> Result<u64, AdapterError> {
        Ok(self.inner.count_documents(doc! {}).await?)
    }

    async fn read(&self, offset: u64, limit: usize) -> Result<Vec<Record>, AdapterError> {
        // a zero limit means "no limit" to the server
        if limit == 0 {
            return Ok(Vec::new());
        }

        // _id order is stable across calls while the collection is untouched
        let cursor = self
            .inner
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .skip(offset)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;

        let docs: Vec<Document> = cursor.try_collect().await?;
        debug!(collection = %self.name, offset, limit, read = docs.len(), "Read page");
        Ok(docs.into_iter().map(document_to_record).collect())
    }

    async fn stats(&self) -> Result<CollectionStats, AdapterError> {
        let stats = self
            .db
            .run_command(doc! { "collStats": self.name.as_str() })
            .await?;

        Ok(CollectionStats {
            avg_record_size_bytes: non_negative(&stats, "avgObjSize")?,
            record_count: non_negative(&stats, "count")?,
        })
    }
}

#[async_trait]
impl TargetCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn clear(&self) -> Result<u64, AdapterError> {
        let result = self.inner.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, AdapterError> {
        if records.is_empty() {
            return Ok(0);
        }

        let docs = records
            .into_iter()
            .map(record_to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.inner.insert_many(docs).await?;
        Ok(result.inserted_ids.len())
    }
}

/// Reads a numeric `collStats` field; absent fields (empty collections)
/// count as zero.
fn non_negative(stats: &Document, key: &str) -> Result<u64, AdapterError> {
    match stats.get(key) {
        None | Some(Bson::Null) => Ok(0),
        Some(Bson::Int32(v)) => Ok((*v).max(0) as u64),
        Some(Bson::Int64(v)) => Ok((*v).max(0) as u64),
        Some(Bson::Double(v)) => Ok(v.max(0.0) as u64),
        Some(other) => Err(AdapterError::InvalidMetadata(format!(
            "collStats.{key} has unexpected type {:?}",
            other.element_type()
        ))),
    }
}
