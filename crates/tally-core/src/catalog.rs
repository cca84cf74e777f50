//! The service catalog.
//!
//! Services have no lifecycle of their own: the catalog is loaded once at
//! startup, either from a JSON file (`[{"name": ..., "rate": ...}]`) or
//! from the built-in defaults below, and usage records must reference a
//! cataloged name.

use serde::{Deserialize, Serialize};

/// One meterable service and its per-unit rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Unique service name.
    pub name: String,

    /// Price per consumed unit, used by usage summaries.
    #[serde(default)]
    pub rate: f64,
}

impl ServiceEntry {
    /// Build a catalog entry.
    #[must_use]
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }
}

/// The catalog used when no catalog file is configured.
///
/// Rates are nominal; deployments that care about cost weighting supply
/// their own catalog file.
#[must_use]
pub fn default_catalog() -> Vec<ServiceEntry> {
    vec![
        ServiceEntry::new("compute", 0.12),
        ServiceEntry::new("storage", 0.05),
        ServiceEntry::new("network", 0.02),
        ServiceEntry::new("api_calls", 0.01),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_unique_names() {
        let catalog = default_catalog();
        let mut names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn rate_defaults_to_zero_when_absent() {
        let entry: ServiceEntry = serde_json::from_str(r#"{"name": "compute"}"#).unwrap();
        assert_eq!(entry.rate, 0.0);
    }
}
