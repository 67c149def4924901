use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Ingestion settings
// ---------------------------------------------------------------------------

/// Settings for every loader, usually read from a JSON file. Missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub ascii: AsciiConfig,
    pub events: EventsConfig,
    /// Key the cache by canonical path when the file exists.
    pub canonicalize_paths: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            ascii: AsciiConfig::default(),
            events: EventsConfig::default(),
            canonicalize_paths: true,
        }
    }
}

/// Plain-text tables: every header consumes a value column and an error
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiConfig {
    /// Defaults to `table_id`.
    pub dataset_id: Option<String>,
    pub table_id: String,
    pub header_names: Vec<String>,
    /// Opt-in synthetic column appended after loading.
    pub augment: Option<AugmentConfig>,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            dataset_id: None,
            table_id: "txt_table".into(),
            header_names: ["Time", "Rate", "color1", "color2"]
                .into_iter()
                .map(String::from)
                .collect(),
            augment: None,
        }
    }
}

impl AsciiConfig {
    pub fn dataset_id(&self) -> &str {
        self.dataset_id.as_deref().unwrap_or(&self.table_id)
    }
}

/// Seeded uniform column, see [`crate::data::augment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub column: String,
    pub seed: u64,
    pub low: f64,
    pub high: f64,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            column: "Amplitude".into(),
            seed: 0,
            low: -1.0,
            high: 1.0,
        }
    }
}

/// Binary event files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub dataset_id: String,
    pub hdu_name: String,
    pub time_column: String,
    pub additional_columns: Vec<String>,
    /// Candidate GTI extensions; the first one present is used.
    pub gti_names: Vec<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            dataset_id: "FITS".into(),
            hdu_name: "EVENTS".into(),
            time_column: "TIME".into(),
            additional_columns: vec!["PI".into()],
            gti_names: ["GTI", "STDGTI", "STDGTI04"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl IngestConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ascii = &self.ascii;
        if ascii.header_names.is_empty() {
            return Err(Error::Config("ascii.header_names is empty".into()));
        }
        let mut seen = BTreeSet::new();
        for name in &ascii.header_names {
            if !seen.insert(name.as_str()) {
                return Err(Error::Config(format!("duplicate ascii header '{name}'")));
            }
        }
        if let Some(augment) = &ascii.augment {
            if seen.contains(augment.column.as_str()) {
                return Err(Error::Config(format!(
                    "augment column '{}' clashes with a measured column",
                    augment.column
                )));
            }
            if !(augment.low < augment.high) {
                return Err(Error::Config(format!(
                    "augment range [{}, {}) is empty",
                    augment.low, augment.high
                )));
            }
        }

        let events = &self.events;
        if events.gti_names.is_empty() {
            return Err(Error::Config("events.gti_names is empty".into()));
        }
        if events
            .additional_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&events.time_column))
        {
            return Err(Error::Config(format!(
                "time column '{}' listed as an additional column",
                events.time_column
            )));
        }
        let mut seen = BTreeSet::new();
        for name in &events.additional_columns {
            if !seen.insert(name.to_ascii_uppercase()) {
                return Err(Error::Config(format!("duplicate additional column '{name}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: IngestConfig =
            serde_json::from_str(r#"{ "events": { "additional_columns": ["PI", "DETID"] } }"#)
                .unwrap();

        assert_eq!(config.events.hdu_name, "EVENTS");
        assert_eq!(config.events.additional_columns, vec!["PI", "DETID"]);
        assert_eq!(config.ascii.table_id, "txt_table");
        assert_eq!(config.ascii.dataset_id(), "txt_table");
        assert!(config.ascii.augment.is_none());
        assert!(config.canonicalize_paths);
    }

    #[test]
    fn augment_defaults_fill_in() {
        let config: IngestConfig =
            serde_json::from_str(r#"{ "ascii": { "augment": { "seed": 7 } } }"#).unwrap();
        let augment = config.ascii.augment.unwrap();

        assert_eq!(augment.column, "Amplitude");
        assert_eq!(augment.seed, 7);
        assert_eq!((augment.low, augment.high), (-1.0, 1.0));
    }

    #[test]
    fn validate_rejects_clashes() {
        let mut config = IngestConfig::default();
        config.ascii.augment = Some(AugmentConfig {
            column: "Rate".into(),
            ..AugmentConfig::default()
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = IngestConfig::default();
        config.events.additional_columns.push("time".into());
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.ascii.header_names = vec!["a".into(), "a".into()];
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.events.additional_columns = vec!["PI".into(), "DETID".into(), "pi".into()];
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        assert!(IngestConfig::default().validate().is_ok());
    }
}
