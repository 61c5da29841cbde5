//! Settings from `DOCCOPY_*` environment keys.

use crate::{error::SettingsError, settings::validated::TransferSettingsBuilder};
use std::{collections::HashMap, str::FromStr};
use tracing::debug;

pub const SAFETY_FACTOR_KEY: &str = "DOCCOPY_SAFETY_FACTOR";
pub const PAGE_SIZE_KEY: &str = "DOCCOPY_PAGE_SIZE";
pub const MIN_PAGE_SIZE_KEY: &str = "DOCCOPY_MIN_PAGE_SIZE";
/// `0` removes the upper bound.
pub const MAX_PAGE_SIZE_KEY: &str = "DOCCOPY_MAX_PAGE_SIZE";
pub const MEMORY_LIMIT_KEY: &str = "DOCCOPY_MEMORY_LIMIT_BYTES";
pub const EVENT_BUFFER_KEY: &str = "DOCCOPY_EVENT_BUFFER";

impl TransferSettingsBuilder {
    /// Builder holding every recognised key present in `vars`.
    ///
    /// Blank values are ignored. Validation happens in `build`.
    pub fn from_env_map(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut builder = TransferSettingsBuilder::new();

        if let Some(v) = parse::<f64>(vars, SAFETY_FACTOR_KEY)? {
            builder = builder.safety_factor(v);
        }
        if let Some(v) = parse::<usize>(vars, PAGE_SIZE_KEY)? {
            builder = builder.page_size(v);
        }
        if let Some(v) = parse::<usize>(vars, MIN_PAGE_SIZE_KEY)? {
            builder = builder.min_page_size(v);
        }
        if let Some(v) = parse::<usize>(vars, MAX_PAGE_SIZE_KEY)? {
            builder = builder.max_page_size((v > 0).then_some(v));
        }
        if let Some(v) = parse::<u64>(vars, MEMORY_LIMIT_KEY)? {
            builder = builder.memory_limit_bytes(v);
        }
        if let Some(v) = parse::<usize>(vars, EVENT_BUFFER_KEY)? {
            builder = builder.event_buffer(v);
        }

        Ok(builder)
    }
}

fn parse<T>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let value = raw.parse::<T>().map_err(|e| SettingsError::Parse {
        key: key.to_string(),
        value: raw.to_string(),
        message: e.to_string(),
    })?;
    debug!(key, value = raw, "Loaded setting from environment");
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_known_keys() {
        let settings = TransferSettingsBuilder::from_env_map(&vars(&[
            (SAFETY_FACTOR_KEY, "0.5"),
            (PAGE_SIZE_KEY, " 2000 "),
            (MAX_PAGE_SIZE_KEY, "0"),
            (MEMORY_LIMIT_KEY, "1048576"),
            ("UNRELATED", "x"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(settings.safety_factor(), 0.5);
        assert_eq!(settings.page_size(), Some(2000));
        assert_eq!(settings.max_page_size(), None);
        assert_eq!(settings.memory_limit_bytes(), Some(1_048_576));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let settings = TransferSettingsBuilder::from_env_map(&vars(&[(PAGE_SIZE_KEY, "  ")]))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(settings.page_size(), None);
    }

    #[test]
    fn unparsable_value_names_the_key() {
        let err = TransferSettingsBuilder::from_env_map(&vars(&[(EVENT_BUFFER_KEY, "lots")]))
            .unwrap_err();
        match err {
            SettingsError::Parse { key, value, .. } => {
                assert_eq!(key, EVENT_BUFFER_KEY);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_env_value_fails_validation() {
        let builder =
            TransferSettingsBuilder::from_env_map(&vars(&[(SAFETY_FACTOR_KEY, "2")])).unwrap();
        assert_eq!(builder.build(), Err(SettingsError::InvalidSafetyFactor(2.0)));
    }
}
