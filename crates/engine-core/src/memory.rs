use sysinfo::System;

/// Source of the available-memory figure fed to the page size estimate.
pub trait MemoryProbe: Send + Sync {
    fn available_bytes(&self) -> u64;
}

/// Reads available host memory on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemoryProbe;

impl MemoryProbe for SystemMemoryProbe {
    fn available_bytes(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub u64);

impl MemoryProbe for FixedMemoryProbe {
    fn available_bytes(&self) -> u64 {
        self.0
    }
}

/// Caps another probe at a configured ceiling.
#[derive(Debug, Clone, Copy)]
pub struct CappedMemoryProbe<P> {
    inner: P,
    ceiling: u64,
}

impl<P: MemoryProbe> CappedMemoryProbe<P> {
    pub fn new(inner: P, ceiling: u64) -> Self {
        CappedMemoryProbe { inner, ceiling }
    }
}

impl<P: MemoryProbe> MemoryProbe for CappedMemoryProbe<P> {
    fn available_bytes(&self) -> u64 {
        self.inner.available_bytes().min(self.ceiling)
    }
}
