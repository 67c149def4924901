use std::path::Path;

use anyhow::{bail, Context};
use log::{debug, info, warn};

use super::fits::{FitsFile, Hdu};
use super::gti::{EventList, Gti};
use super::model::Dataset;
use crate::config::EventsConfig;
use crate::error::{Error, Result};

fn ingestion(err: anyhow::Error) -> Error {
    Error::Ingestion(format!("{err:#}"))
}

// ---------------------------------------------------------------------------
// Event files
// ---------------------------------------------------------------------------

/// Load an event file into an events table (in-GTI events only) followed by
/// a `GTI` table holding each window and its event index range.
pub fn load_events(path: &Path, settings: &EventsConfig) -> Result<Dataset> {
    let file = FitsFile::open(path).map_err(ingestion)?;
    let events = read_event_list(&file, settings)
        .with_context(|| format!("reading events from {}", path.display()))
        .map_err(ingestion)?;

    let mut dataset = Dataset::new(&settings.dataset_id);
    let windows = events.segment_into(&mut dataset, &settings.hdu_name)?;

    let kept: usize = windows.iter().map(|w| w.event_count()).sum();
    info!(
        "Read event file {}: {kept} of {} events in {} GTIs",
        path.display(),
        events.times.len(),
        windows.len()
    );
    Ok(dataset)
}

fn read_event_list(file: &FitsFile, settings: &EventsConfig) -> anyhow::Result<EventList> {
    let hdu = file
        .find(&settings.hdu_name)
        .with_context(|| format!("no HDU named '{}'", settings.hdu_name))?;
    let table = file.bintable(hdu)?;

    let mut times = table.read_f64(&settings.time_column)?;
    if let Some(timezero) = hdu.header.float("TIMEZERO").filter(|&tz| tz != 0.0) {
        debug!("Applying TIMEZERO {timezero}");
        times.iter_mut().for_each(|t| *t += timezero);
    }

    let mut additional: Vec<(String, Vec<f64>)> =
        Vec::with_capacity(settings.additional_columns.len());
    for name in &settings.additional_columns {
        let seen = name.eq_ignore_ascii_case(&settings.time_column)
            || additional.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
        if seen {
            debug!("Column '{name}' is already read, skipping");
        } else if table.has_column(name) {
            additional.push((name.clone(), table.read_f64(name)?));
        } else {
            warn!("Column '{name}' not found in '{}', skipping", table.name);
        }
    }

    let gtis = read_gtis(file, &settings.gti_names)?;

    Ok(EventList {
        time_column: settings.time_column.clone(),
        times,
        additional,
        gtis,
    })
}

/// GTIs from the first extension in `names` that the file has.
fn read_gtis(file: &FitsFile, names: &[String]) -> anyhow::Result<Vec<Gti>> {
    let Some(hdu) = names.iter().find_map(|n| file.find(n)) else {
        bail!("no GTI extension among {names:?}");
    };
    let table = file.bintable(hdu)?;
    debug!("Reading GTIs from '{}'", table.name);

    let starts = table.read_f64("START")?;
    let stops = table.read_f64("STOP")?;
    if starts.is_empty() {
        bail!("GTI extension '{}' is empty", table.name);
    }
    Ok(starts
        .into_iter()
        .zip(stops)
        .map(|(start, stop)| Gti::new(start, stop))
        .collect())
}

// ---------------------------------------------------------------------------
// Whole-file load
// ---------------------------------------------------------------------------

/// Read every binary table of a FITS file, one dataset table per extension
/// keyed by its name. Only scalar numeric columns are kept.
pub fn load_all_tables(path: &Path, dataset_id: &str) -> Result<Dataset> {
    let file = FitsFile::open(path).map_err(ingestion)?;
    let mut dataset = Dataset::new(dataset_id);

    for hdu in file.hdus() {
        if !hdu.is_bintable() {
            debug!("No table data in HDU {}", hdu.index);
            continue;
        }
        read_whole_table(&file, hdu, &mut dataset).map_err(ingestion)?;
    }

    if dataset.table_ids().is_empty() {
        return Err(Error::Ingestion(format!(
            "{} has no binary tables",
            path.display()
        )));
    }
    info!("Read all tables of {}", path.display());
    Ok(dataset)
}

fn read_whole_table(file: &FitsFile, hdu: &Hdu, dataset: &mut Dataset) -> anyhow::Result<()> {
    let table = file.bintable(hdu)?;
    let names: Vec<&str> = table
        .columns()
        .iter()
        .filter(|c| c.is_numeric_scalar())
        .map(|c| c.name.as_str())
        .collect();

    let out = dataset.add_table(&table.name, names.as_slice());
    for name in names {
        out.column_mut(name)?.add_values(&table.read_f64(name)?);
    }
    Ok(())
}
