use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use gti_ingest::data::fits;
use gti_ingest::data::gti::GTI_TABLE;
use gti_ingest::{detect_format, DatasetCache, IngestConfig, Ingestor};

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    /// JSON ingestion settings; defaults apply to anything left out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a file and print its dataset schema.
    Schema { path: PathBuf },
    /// Ingest an event file and print its GTI windows.
    Gtis { path: PathBuf },
    /// List the columns of a binary table.
    Columns { path: PathBuf, hdu: String },
    /// Print the detected file format.
    Detect { path: PathBuf },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => IngestConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IngestConfig::default(),
    };

    let cache = Arc::new(DatasetCache::new());
    let ingestor = Ingestor::new(cache, config)?;

    match cli.command {
        Command::Schema { path } => {
            let Some(dataset) = ingestor.ingest(&path) else {
                bail!("no dataset for {}", path.display());
            };
            println!("{}", serde_json::to_string_pretty(&dataset.schema())?);
        }
        Command::Gtis { path } => {
            let Some(dataset) = ingestor.ingest(&path) else {
                bail!("no dataset for {}", path.display());
            };
            let windows = dataset.gti_windows(GTI_TABLE)?;
            println!("{}", serde_json::to_string_pretty(&windows)?);
        }
        Command::Columns { path, hdu } => {
            for name in fits::table_column_names(&path, &hdu)? {
                println!("{name}");
            }
        }
        Command::Detect { path } => {
            println!("{}", detect_format(&path)?);
        }
    }
    Ok(())
}
