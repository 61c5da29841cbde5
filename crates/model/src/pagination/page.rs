use serde::{Deserialize, Serialize};

/// Offset/limit window over a source collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        PageRequest { offset: 0, limit }
    }

    /// The request for the page following one that returned `read` records.
    ///
    /// Advances by what was actually read, not by the nominal limit, so a
    /// short page can never leave a gap.
    pub fn next(&self, read: usize) -> Self {
        PageRequest {
            offset: self.offset + read as u64,
            limit: self.limit,
        }
    }

    /// A page holding fewer records than requested is the final one.
    pub fn is_final(&self, read: usize) -> bool {
        read < self.limit
    }
}
