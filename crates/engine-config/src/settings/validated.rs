use crate::error::SettingsError;
use engine_core::budget::{BudgetEstimator, DEFAULT_MAX_PAGE_SIZE, SAFETY_FACTOR};
use serde::Serialize;

pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Immutable, validated configuration for a transfer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSettings {
    /// Fraction of available memory one page may use
    safety_factor: f64,
    /// Fixed page size; skips memory-based estimation when set
    page_size: Option<usize>,
    min_page_size: usize,
    /// Upper bound on estimated page sizes; `None` is unbounded
    max_page_size: Option<usize>,
    /// Ceiling applied to the measured available memory
    memory_limit_bytes: Option<u64>,
    /// Capacity of each event subscriber channel
    event_buffer: usize,
}

impl TransferSettings {
    pub fn builder() -> TransferSettingsBuilder {
        TransferSettingsBuilder::new()
    }

    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    pub fn min_page_size(&self) -> usize {
        self.min_page_size
    }

    pub fn max_page_size(&self) -> Option<usize> {
        self.max_page_size
    }

    pub fn memory_limit_bytes(&self) -> Option<u64> {
        self.memory_limit_bytes
    }

    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    pub fn estimator(&self) -> BudgetEstimator {
        BudgetEstimator::new(self.safety_factor)
            .with_min_page_size(self.min_page_size)
            .with_max_page_size(self.max_page_size)
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            safety_factor: SAFETY_FACTOR,
            page_size: None,
            min_page_size: 1,
            max_page_size: Some(DEFAULT_MAX_PAGE_SIZE),
            memory_limit_bytes: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferSettingsBuilder {
    pub safety_factor: Option<f64>,
    pub page_size: Option<usize>,
    pub min_page_size: Option<usize>,
    pub max_page_size: Option<Option<usize>>,
    pub memory_limit_bytes: Option<u64>,
    pub event_buffer: Option<usize>,
}

impl TransferSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn safety_factor(mut self, safety_factor: f64) -> Self {
        self.safety_factor = Some(safety_factor);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn min_page_size(mut self, min_page_size: usize) -> Self {
        self.min_page_size = Some(min_page_size);
        self
    }

    /// `None` removes the upper bound.
    pub fn max_page_size(mut self, max_page_size: Option<usize>) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    pub fn memory_limit_bytes(mut self, limit: u64) -> Self {
        self.memory_limit_bytes = Some(limit);
        self
    }

    pub fn event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = Some(event_buffer);
        self
    }

    /// Values set on `other` win.
    pub fn merge(mut self, other: TransferSettingsBuilder) -> Self {
        self.safety_factor = other.safety_factor.or(self.safety_factor);
        self.page_size = other.page_size.or(self.page_size);
        self.min_page_size = other.min_page_size.or(self.min_page_size);
        self.max_page_size = other.max_page_size.or(self.max_page_size);
        self.memory_limit_bytes = other.memory_limit_bytes.or(self.memory_limit_bytes);
        self.event_buffer = other.event_buffer.or(self.event_buffer);
        self
    }

    pub fn build(self) -> Result<TransferSettings, SettingsError> {
        let defaults = TransferSettings::default();
        let settings = TransferSettings {
            safety_factor: self.safety_factor.unwrap_or(defaults.safety_factor),
            page_size: self.page_size,
            min_page_size: self.min_page_size.unwrap_or(defaults.min_page_size),
            max_page_size: self.max_page_size.unwrap_or(defaults.max_page_size),
            memory_limit_bytes: self.memory_limit_bytes,
            event_buffer: self.event_buffer.unwrap_or(defaults.event_buffer),
        };
        validate(&settings)?;
        Ok(settings)
    }
}

fn validate(settings: &TransferSettings) -> Result<(), SettingsError> {
    let factor = settings.safety_factor;
    if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
        return Err(SettingsError::InvalidSafetyFactor(factor));
    }
    if settings.page_size == Some(0) {
        return Err(SettingsError::ZeroPageSize { name: "page size" });
    }
    if settings.min_page_size == 0 {
        return Err(SettingsError::ZeroPageSize {
            name: "minimum page size",
        });
    }
    if let Some(max) = settings.max_page_size {
        if max == 0 {
            return Err(SettingsError::ZeroPageSize {
                name: "maximum page size",
            });
        }
        if settings.min_page_size > max {
            return Err(SettingsError::PageSizeRange {
                min: settings.min_page_size,
                max,
            });
        }
    }
    if settings.memory_limit_bytes == Some(0) {
        return Err(SettingsError::ZeroMemoryLimit);
    }
    if settings.event_buffer == 0 {
        return Err(SettingsError::ZeroEventBuffer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = TransferSettings::builder().build().unwrap();
        assert_eq!(settings, TransferSettings::default());
        assert_eq!(settings.safety_factor(), 0.70);
        assert_eq!(settings.page_size(), None);
        assert_eq!(settings.max_page_size(), Some(50_000));
        assert_eq!(settings.event_buffer(), DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_builder() {
        let settings = TransferSettings::builder()
            .safety_factor(0.5)
            .min_page_size(10)
            .max_page_size(None)
            .memory_limit_bytes(1 << 20)
            .build()
            .unwrap();

        assert_eq!(settings.safety_factor(), 0.5);
        assert_eq!(settings.max_page_size(), None);
        assert_eq!(settings.memory_limit_bytes(), Some(1 << 20));
        // 1 MiB * 0.5 / 1 KiB
        assert_eq!(settings.estimator().estimate(1 << 20, 1024), 512);
        assert_eq!(settings.estimator().estimate(0, 1024), 10);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            TransferSettings::builder().safety_factor(0.0).build(),
            Err(SettingsError::InvalidSafetyFactor(0.0))
        );
        assert!(matches!(
            TransferSettings::builder().safety_factor(1.5).build(),
            Err(SettingsError::InvalidSafetyFactor(_))
        ));
        assert!(matches!(
            TransferSettings::builder().page_size(0).build(),
            Err(SettingsError::ZeroPageSize { .. })
        ));
        assert_eq!(
            TransferSettings::builder()
                .min_page_size(100)
                .max_page_size(Some(10))
                .build(),
            Err(SettingsError::PageSizeRange { min: 100, max: 10 })
        );
        assert_eq!(
            TransferSettings::builder().event_buffer(0).build(),
            Err(SettingsError::ZeroEventBuffer)
        );
    }

    #[test]
    fn merge_prefers_later_values() {
        let base = TransferSettingsBuilder::new().page_size(100).safety_factor(0.4);
        let overrides = TransferSettingsBuilder::new().page_size(250);
        let settings = base.merge(overrides).build().unwrap();

        assert_eq!(settings.page_size(), Some(250));
        assert_eq!(settings.safety_factor(), 0.4);
    }

    #[test]
    fn serializes_for_reports() {
        let json = serde_json::to_value(TransferSettings::default()).unwrap();
        assert_eq!(json["min_page_size"], 1);
        assert!(json["page_size"].is_null());
    }
}
