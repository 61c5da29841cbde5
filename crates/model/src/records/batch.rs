use crate::records::record::Record;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// One page worth of records moved in a single write call.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub records: Vec<Record>,
    /// Source offset of the first record in this batch.
    pub offset: u64,
    pub ts: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub record_count: usize,
    pub checksum_xxh3: u64, // rolling checksum over canonicalized records
}

pub fn manifest_for(records: &[Record]) -> Manifest {
    let checksum_xxh3 = records
        .iter()
        .fold(0u64, |h, r| xxh3_64_with_seed(&r.canonical_bytes(), h));

    Manifest {
        record_count: records.len(),
        checksum_xxh3,
    }
}

impl Batch {
    pub fn new(collection: &str, offset: u64, records: Vec<Record>) -> Self {
        Batch {
            id: batch_id(collection, offset),
            records,
            offset,
            ts: chrono::Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Offset right after the last record of this batch.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.records.len() as u64
    }

    pub fn size_bytes(&self) -> usize {
        self.records.iter().map(|r| r.size_bytes()).sum()
    }

    /// Hashes every record; computed on demand since only diagnostics need it.
    pub fn manifest(&self) -> Manifest {
        manifest_for(&self.records)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

fn batch_id(collection: &str, offset: u64) -> String {
    let h = xxh3_64_with_seed(collection.as_bytes(), offset);
    format!("{collection}@{offset}-{h:016x}")
}
