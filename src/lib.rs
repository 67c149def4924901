//! Ingestion core for X-ray timing analysis: turns uploaded event lists and
//! text tables into GTI-segmented tabular datasets and caches them per file.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;

pub use cache::DatasetCache;
pub use config::IngestConfig;
pub use data::detect::{detect_format, FileFormat};
pub use data::gti::{Gti, GtiWindow};
pub use data::model::{Column, Dataset, DatasetSchema, Table};
pub use error::{Error, Result};
pub use ingest::{DatasetLoader, FileLoader, Ingestor};
