use async_trait::async_trait;
use connectors::{
    collection::{CollectionStats, SourceCollection, TargetCollection},
    error::AdapterError,
    memory::{MemoryCollection, MemoryStore},
};
use engine_config::settings::TransferSettings;
use engine_core::{context::job::CollectionPair, sink::ProgressSink};
use engine_runtime::TransferEngine;
use model::{events::transfer::TransferEvent, records::record::Record};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// `n` small documents with sequential `_id`s.
pub fn docs(n: usize) -> Vec<Record> {
    (0..n as i64)
        .map(|i| {
            Record::new()
                .with("_id", i)
                .with("name", format!("doc-{i}"))
                .with("tags", vec!["a", "b"])
        })
        .collect()
}

pub fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get("_id")?.as_i64())
        .collect()
}

pub fn settings(page_size: usize) -> TransferSettings {
    TransferSettings::builder()
        .page_size(page_size)
        .build()
        .expect("valid settings")
}

pub fn engine(page_size: usize, sink: Arc<dyn ProgressSink>) -> TransferEngine {
    TransferEngine::new(&settings(page_size)).with_sink(sink)
}

/// Plain in-memory pair: `name` in `src` copied to `name` in `dst`.
pub fn pair(src: &MemoryStore, dst: &MemoryStore, name: &str) -> CollectionPair {
    CollectionPair::new(
        name,
        Arc::new(src.collection(name)),
        Arc::new(dst.collection(name)),
    )
}

/// Source wrapper that counts calls and can fail on demand.
pub struct ScriptedSource {
    inner: MemoryCollection,
    pub reads: AtomicUsize,
    fail_count: bool,
    fail_stats: bool,
    fail_read_at: Option<u64>,
}

impl ScriptedSource {
    pub fn new(inner: MemoryCollection) -> Self {
        ScriptedSource {
            inner,
            reads: AtomicUsize::new(0),
            fail_count: false,
            fail_stats: false,
            fail_read_at: None,
        }
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn failing_stats(mut self) -> Self {
        self.fail_stats = true;
        self
    }

    pub fn failing_read_at(mut self, offset: u64) -> Self {
        self.fail_read_at = Some(offset);
        self
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceCollection for ScriptedSource {
    fn name(&self) -> &str {
        SourceCollection::name(&self.inner)
    }

    async fn count(&self) -> Result<u64, AdapterError> {
        if self.fail_count {
            return Err(AdapterError::Store("count timed out".into()));
        }
        self.inner.count().await
    }

    async fn read(&self, offset: u64, limit: usize) -> Result<Vec<Record>, AdapterError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_read_at == Some(offset) {
            return Err(AdapterError::Store("cursor not found".into()));
        }
        self.inner.read(offset, limit).await
    }

    async fn stats(&self) -> Result<CollectionStats, AdapterError> {
        if self.fail_stats {
            return Err(AdapterError::Store("collStats unauthorized".into()));
        }
        self.inner.stats().await
    }
}

/// Target wrapper that fails its `fail_on`-th insert (1-based), refuses to
/// clear, or acknowledges fewer records than it stored.
pub struct FaultyTarget {
    inner: MemoryCollection,
    inserts: AtomicUsize,
    fail_on: Option<usize>,
    fail_clear: bool,
    under_ack: usize,
}

impl FaultyTarget {
    fn wrap(inner: MemoryCollection) -> Self {
        FaultyTarget {
            inner,
            inserts: AtomicUsize::new(0),
            fail_on: None,
            fail_clear: false,
            under_ack: 0,
        }
    }

    pub fn failing_on(inner: MemoryCollection, call: usize) -> Self {
        FaultyTarget {
            fail_on: Some(call),
            ..Self::wrap(inner)
        }
    }

    pub fn failing_clear(inner: MemoryCollection) -> Self {
        FaultyTarget {
            fail_clear: true,
            ..Self::wrap(inner)
        }
    }

    pub fn under_acknowledging(inner: MemoryCollection, missing: usize) -> Self {
        FaultyTarget {
            under_ack: missing,
            ..Self::wrap(inner)
        }
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetCollection for FaultyTarget {
    fn name(&self) -> &str {
        TargetCollection::name(&self.inner)
    }

    async fn clear(&self) -> Result<u64, AdapterError> {
        if self.fail_clear {
            return Err(AdapterError::Store("not authorized on target".into()));
        }
        self.inner.clear().await
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, AdapterError> {
        let call = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(AdapterError::Store("write concern failed".into()));
        }
        let stored = self.inner.insert_many(records).await?;
        Ok(stored.saturating_sub(self.under_ack))
    }
}

/// Keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TransferEvent>>,
}

impl RecordingSink {
    pub async fn events(&self) -> Vec<TransferEvent> {
        self.events.lock().await.clone()
    }

    /// `processed` values of the progress events for `collection`, in order.
    pub async fn processed(&self, collection: &str) -> Vec<u64> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                TransferEvent::Progress {
                    collection: c,
                    snapshot,
                    ..
                } if c == collection => Some(snapshot.processed),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn emit(&self, event: TransferEvent) {
        self.events.lock().await.push(event);
    }
}

/// Cancels `token` once `after` progress events have been seen.
pub struct CancellingSink {
    pub recorder: RecordingSink,
    token: CancellationToken,
    after: usize,
    seen: AtomicUsize,
}

impl CancellingSink {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        CancellingSink {
            recorder: RecordingSink::default(),
            token,
            after,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProgressSink for CancellingSink {
    async fn emit(&self, event: TransferEvent) {
        if matches!(event, TransferEvent::Progress { .. })
            && self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.after
        {
            self.token.cancel();
        }
        self.recorder.emit(event).await;
    }
}
