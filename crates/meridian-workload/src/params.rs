//! Workload parameter maps.
//!
//! Every family declares a default map; the caller may override entries
//! with a `"key=value,key=value"` string. Overriding a key the family
//! does not declare is an error, typos in benchmark configs should not
//! pass silently.

use std::collections::HashMap;

use meridian_common::{MeridianError, MeridianResult};

/// Parsed parameters of one generator.
#[derive(Debug, Clone)]
pub struct WorkloadParams {
    values: HashMap<String, String>,
}

impl WorkloadParams {
    /// Builds the map from the family defaults and an override string.
    pub fn new(defaults: &[(&str, &str)], overrides: &str) -> MeridianResult<Self> {
        let mut values: HashMap<String, String> = defaults
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();

        for piece in overrides.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let Some((key, value)) = piece.split_once('=') else {
                return Err(MeridianError::InvalidParameter(format!(
                    "expected key=value, got \"{piece}\""
                )));
            };
            let key = key.trim();
            if !values.contains_key(key) {
                return Err(MeridianError::InvalidParameter(format!(
                    "unknown parameter \"{key}\""
                )));
            }
            values.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { values })
    }

    /// String value of `key`. The key must be one of the declared defaults.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_else(|| {
            debug_assert!(false, "undeclared parameter {key}");
            String::new()
        })
    }

    /// `i32` value of `key`; zero when unparsable.
    #[must_use]
    pub fn get_i32(&self, key: &str) -> i32 {
        self.get_string(key).parse().unwrap_or(0)
    }

    /// `f64` value of `key`; zero when unparsable.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> f64 {
        self.get_string(key).parse().unwrap_or(0.0)
    }

    /// Parses a colon-separated list of integers, e.g. a txn mix.
    pub fn get_i32_list(&self, key: &str) -> MeridianResult<Vec<i32>> {
        let raw = self.get_string(key);
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(':')
            .map(|piece| {
                piece.trim().parse().map_err(|_| {
                    MeridianError::InvalidParameter(format!("bad integer \"{piece}\" in {key}"))
                })
            })
            .collect()
    }
}
