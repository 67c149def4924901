use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Process-wide map from a file identity to its parsed dataset.
///
/// Datasets are published behind `Arc` and never mutated afterwards, so
/// readers hold no lock once they have their handle. The lock only guards the
/// map itself; loading happens outside it. No eviction policy.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<String, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `dataset`, replacing any previous entry. Returns the
    /// published handle.
    pub fn put(&self, key: impl Into<String>, dataset: Dataset) -> Arc<Dataset> {
        let key = key.into();
        let dataset = Arc::new(dataset);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.insert(key.clone(), Arc::clone(&dataset)).is_some() {
            debug!("Replaced cached dataset for {key}");
        }
        dataset
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// `None` is a cache miss. Never loads anything.
    pub fn get(&self, key: &str) -> Option<Arc<Dataset>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Evict `key`; returns whether an entry was there.
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
