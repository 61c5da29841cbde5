use crate::{context::job::CollectionJob, error::TransferError};
use connectors::collection::SourceCollection;
use futures::{Stream, stream};
use model::{pagination::page::PageRequest, records::batch::Batch};
use std::sync::Arc;
use tracing::{Level, debug, enabled};

/// Offset-based reader over one source collection.
pub struct PageReader {
    collection: String,
    source: Arc<dyn SourceCollection>,
}

impl PageReader {
    pub fn new(job: &CollectionJob) -> Self {
        PageReader {
            collection: job.name().to_string(),
            source: Arc::clone(job.source()),
        }
    }

    /// Up to `limit` records from `offset`. Past the end the batch is empty.
    pub async fn read(&self, offset: u64, limit: usize) -> Result<Batch, TransferError> {
        let records = self
            .source
            .read(offset, limit)
            .await
            .map_err(|source| TransferError::Read {
                collection: self.collection.clone(),
                offset,
                limit,
                source,
            })?;

        let batch = Batch::new(&self.collection, offset, records);
        if enabled!(Level::DEBUG) {
            debug!(
                collection = %self.collection,
                batch_id = %batch.id,
                offset,
                limit,
                read = batch.len(),
                checksum = %format!("{:016x}", batch.manifest().checksum_xxh3),
                "Read page"
            );
        }
        Ok(batch)
    }

    /// Every page from offset 0, lazily.
    ///
    /// Each call starts over. The stream ends after an empty page or a page
    /// shorter than `page_size`; a read error is yielded once and ends it.
    pub fn pages(
        &self,
        page_size: usize,
    ) -> impl Stream<Item = Result<Batch, TransferError>> + Send + '_ {
        let first = PageRequest::first(page_size.max(1));

        stream::try_unfold(Some(first), move |state| async move {
            let Some(request) = state else {
                return Ok::<_, TransferError>(None);
            };

            let batch = self.read(request.offset, request.limit).await?;
            if batch.is_empty() {
                return Ok(None);
            }

            let read = batch.len();
            let next = (!request.is_final(read)).then(|| request.next(read));
            Ok(Some((batch, next)))
        })
    }
}
