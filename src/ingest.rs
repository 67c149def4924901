use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};

use crate::cache::DatasetCache;
use crate::config::IngestConfig;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Builds a dataset from a file. Implementations must either return a fully
/// populated dataset or an error, never a partial one.
pub trait DatasetLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Dataset>;
}

/// Content-sniffing loader for text tables and FITS event files.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    config: IngestConfig,
}

impl FileLoader {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }
}

impl DatasetLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Dataset> {
        loader::load_file(path, &self.config)
    }
}

// ---------------------------------------------------------------------------
// Ingestion entry point
// ---------------------------------------------------------------------------

/// Cache lookup, then detection and loading on a miss.
///
/// The cache is shared and injected; loading runs without holding its lock,
/// so two first-time requests for the same file may both load and the later
/// `put` wins.
pub struct Ingestor<L = FileLoader> {
    cache: Arc<DatasetCache>,
    loader: L,
    canonicalize: bool,
}

impl Ingestor<FileLoader> {
    /// Fails with [`crate::Error::Config`] when `config` does not validate.
    pub fn new(cache: Arc<DatasetCache>, config: IngestConfig) -> Result<Self> {
        config.validate()?;
        let canonicalize = config.canonicalize_paths;
        Ok(Self::with_loader(cache, FileLoader::new(config), canonicalize))
    }
}

impl<L: DatasetLoader> Ingestor<L> {
    pub fn with_loader(cache: Arc<DatasetCache>, loader: L, canonicalize: bool) -> Self {
        Self {
            cache,
            loader,
            canonicalize,
        }
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Identity of a file: its canonical path when it resolves, else the path
    /// as given.
    pub fn cache_key(&self, path: &Path) -> String {
        if self.canonicalize {
            if let Ok(canonical) = std::fs::canonicalize(path) {
                return canonical.to_string_lossy().into_owned();
            }
        }
        path.to_string_lossy().into_owned()
    }

    /// Like [`Ingestor::ingest`] but keeps the failure.
    pub fn try_ingest(&self, path: &Path) -> Result<Arc<Dataset>> {
        let key = self.cache_key(path);
        if let Some(dataset) = self.cache.get(&key) {
            debug!("Returned cached dataset for {key}");
            return Ok(dataset);
        }

        let dataset = self.loader.load(path)?;
        Ok(self.cache.put(key, dataset))
    }

    /// The dataset for `path`, or `None` when the file could not be turned
    /// into one. Failures are logged with their kind and never propagate.
    pub fn ingest(&self, path: &Path) -> Option<Arc<Dataset>> {
        match self.try_ingest(path) {
            Ok(dataset) => Some(dataset),
            Err(err) => {
                warn!("No dataset for {} [{}]: {err}", path.display(), err.kind());
                None
            }
        }
    }

    /// Drop the cached entry for `path`, if any.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.cache.remove(&self.cache_key(path))
    }
}
