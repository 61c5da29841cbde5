use crate::error::TransferError;
use connectors::collection::{SourceCollection, TargetCollection};
use std::{fmt, sync::Arc};
use tracing::debug;

/// A source/target pair selected for transfer, before anything is measured.
#[derive(Clone)]
pub struct CollectionPair {
    pub name: String,
    pub source: Arc<dyn SourceCollection>,
    pub target: Arc<dyn TargetCollection>,
}

impl CollectionPair {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn SourceCollection>,
        target: Arc<dyn TargetCollection>,
    ) -> Self {
        CollectionPair {
            name: name.into(),
            source,
            target,
        }
    }
}

impl fmt::Debug for CollectionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionPair")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .finish()
    }
}

/// One collection's transfer, sized at job start.
///
/// Immutable once built; `estimated_total` is the source count observed
/// when the job opened and may drift if the source is written to.
#[derive(Clone)]
pub struct CollectionJob {
    name: String,
    source: Arc<dyn SourceCollection>,
    target: Arc<dyn TargetCollection>,
    estimated_total: u64,
}

impl CollectionJob {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn SourceCollection>,
        target: Arc<dyn TargetCollection>,
        estimated_total: u64,
    ) -> Self {
        CollectionJob {
            name: name.into(),
            source,
            target,
            estimated_total,
        }
    }

    /// Counts the source and builds the job.
    pub async fn open(pair: CollectionPair) -> Result<Self, TransferError> {
        let total = pair
            .source
            .count()
            .await
            .map_err(|source| TransferError::Count {
                collection: pair.name.clone(),
                source,
            })?;
        debug!(collection = %pair.name, total, "Counted source records");

        Ok(CollectionJob::new(pair.name, pair.source, pair.target, total))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<dyn SourceCollection> {
        &self.source
    }

    pub fn target(&self) -> &Arc<dyn TargetCollection> {
        &self.target
    }

    pub fn estimated_total(&self) -> u64 {
        self.estimated_total
    }
}

impl fmt::Debug for CollectionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionJob")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field("estimated_total", &self.estimated_total)
            .finish()
    }
}
