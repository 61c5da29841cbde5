use connectors::error::AdapterError;
use thiserror::Error;

/// Why a single collection job stopped.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to count records in '{collection}': {source}")]
    Count {
        collection: String,
        #[source]
        source: AdapterError,
    },

    #[error("Failed to read '{collection}' at offset {offset} (limit {limit}): {source}")]
    Read {
        collection: String,
        offset: u64,
        limit: usize,
        #[source]
        source: AdapterError,
    },

    #[error("Failed to clear target '{collection}': {source}")]
    Prepare {
        collection: String,
        #[source]
        source: AdapterError,
    },

    #[error(
        "Failed to write batch {batch_id} ({records} record(s) from offset {offset}) to '{collection}': {source}"
    )]
    Write {
        collection: String,
        batch_id: String,
        offset: u64,
        records: usize,
        #[source]
        source: AdapterError,
    },

    #[error("Transfer of '{collection}' cancelled after {processed} record(s)")]
    Cancelled { collection: String, processed: u64 },
}

impl TransferError {
    pub fn collection(&self) -> &str {
        match self {
            TransferError::Count { collection, .. }
            | TransferError::Read { collection, .. }
            | TransferError::Prepare { collection, .. }
            | TransferError::Write { collection, .. }
            | TransferError::Cancelled { collection, .. } => collection,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled { .. })
    }

    /// Short machine-readable label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Count { .. } | TransferError::Read { .. } => "read_failure",
            TransferError::Prepare { .. } => "prepare_failure",
            TransferError::Write { .. } => "write_failure",
            TransferError::Cancelled { .. } => "cancelled",
        }
    }
}
