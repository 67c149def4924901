use std::ops::Range;

use log::debug;
use serde::Serialize;

use super::model::{Dataset, Table};
use crate::error::{Error, Result};

/// Id of the GTI table written next to the events table.
pub const GTI_TABLE: &str = "GTI";

/// Columns of the GTI table. The index pair is a half-open range into the
/// original (unfiltered) event sequence.
pub const GTI_COLUMNS: [&str; 4] = ["START", "STOP", "START_EVENT_IDX", "END_EVENT_IDX"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One Good Time Interval, closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gti {
    pub start: f64,
    pub stop: f64,
}

impl Gti {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }
}

/// A GTI together with the slice of events that fell inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GtiWindow {
    pub start: f64,
    pub stop: f64,
    pub start_event_idx: usize,
    pub end_event_idx: usize,
}

impl GtiWindow {
    pub fn range(&self) -> Range<usize> {
        self.start_event_idx..self.end_event_idx
    }

    pub fn event_count(&self) -> usize {
        self.end_event_idx - self.start_event_idx
    }
}

/// A raw event list as read from a binary table: the time series, any
/// row-aligned auxiliary columns and the GTI list.
#[derive(Debug, Clone, PartialEq)]
pub struct EventList {
    pub time_column: String,
    pub times: Vec<f64>,
    pub additional: Vec<(String, Vec<f64>)>,
    pub gtis: Vec<Gti>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// GTIs must be well-formed, ascending and non-overlapping. An interval may
/// start exactly where the previous one stops.
pub fn validate(gtis: &[Gti]) -> Result<()> {
    if gtis.is_empty() {
        return Err(Error::InvalidGti("empty GTI list".into()));
    }
    for (k, gti) in gtis.iter().enumerate() {
        if !(gti.start <= gti.stop) {
            return Err(Error::InvalidGti(format!(
                "GTI {k}: start {} is not <= stop {}",
                gti.start, gti.stop
            )));
        }
        if k > 0 && gti.start < gtis[k - 1].stop {
            return Err(Error::InvalidGti(format!(
                "GTI {k} starts at {} before GTI {} stops at {}",
                gti.start,
                k - 1,
                gtis[k - 1].stop
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Partition a non-decreasing event time series against an ordered GTI list
/// in a single pass.
///
/// Every GTI yields exactly one window. A window whose GTI caught no events
/// gets an empty range positioned at the first event past it. Events before
/// the first GTI, in gaps, or after the last GTI belong to no window.
pub fn segment(times: &[f64], gtis: &[Gti]) -> Vec<GtiWindow> {
    let mut windows = Vec::with_capacity(gtis.len());
    let mut gti_index = 0;
    // (first event, one past last event) of the window being filled
    let mut open: Option<(usize, usize)> = None;

    for (e, &t) in times.iter().enumerate() {
        while gti_index < gtis.len() && t > gtis[gti_index].stop {
            debug!("Adding GTI {gti_index}");
            windows.push(close_window(gtis[gti_index], open.take(), e));
            gti_index += 1;
        }
        let Some(gti) = gtis.get(gti_index) else {
            break;
        };
        if t >= gti.start {
            open = Some(match open {
                Some((first, _)) => (first, e + 1),
                None => (e, e + 1),
            });
        }
    }

    // Flush the window still open at end of stream and any GTIs past it.
    for &gti in &gtis[gti_index..] {
        debug!("Adding GTI {gti_index}");
        windows.push(close_window(gti, open.take(), times.len()));
        gti_index += 1;
    }
    windows
}

fn close_window(gti: Gti, open: Option<(usize, usize)>, cursor: usize) -> GtiWindow {
    let (start_event_idx, end_event_idx) = open.unwrap_or((cursor, cursor));
    GtiWindow {
        start: gti.start,
        stop: gti.stop,
        start_event_idx,
        end_event_idx,
    }
}

impl EventList {
    /// Validate, segment and write the in-window events into `events_table`
    /// plus the window list into [`GTI_TABLE`].
    pub fn segment_into(&self, dataset: &mut Dataset, events_table: &str) -> Result<Vec<GtiWindow>> {
        if self.times.is_empty() {
            return Err(Error::Ingestion(format!(
                "column '{}' holds no events",
                self.time_column
            )));
        }
        for (k, (name, values)) in self.additional.iter().enumerate() {
            if *name == self.time_column || self.additional[..k].iter().any(|(n, _)| n == name) {
                return Err(Error::Ingestion(format!(
                    "column '{name}' is listed more than once"
                )));
            }
            if values.len() != self.times.len() {
                return Err(Error::Ingestion(format!(
                    "column '{name}' has {} rows, expected {}",
                    values.len(),
                    self.times.len()
                )));
            }
        }
        validate(&self.gtis)?;

        let windows = segment(&self.times, &self.gtis);

        let mut header: Vec<&str> = vec![self.time_column.as_str()];
        header.extend(self.additional.iter().map(|(name, _)| name.as_str()));
        let events = dataset.add_table(events_table, header.as_slice());
        for window in &windows {
            let range = window.range();
            events
                .column_mut(&self.time_column)?
                .add_values(&self.times[range.clone()]);
            for (name, values) in &self.additional {
                events.column_mut(name)?.add_values(&values[range.clone()]);
            }
        }

        let table = dataset.add_table(GTI_TABLE, &GTI_COLUMNS);
        for window in &windows {
            table.column_mut("START")?.add_value(window.start);
            table.column_mut("STOP")?.add_value(window.stop);
            table
                .column_mut("START_EVENT_IDX")?
                .add_value(window.start_event_idx as f64);
            table
                .column_mut("END_EVENT_IDX")?
                .add_value(window.end_event_idx as f64);
        }

        Ok(windows)
    }
}

/// Decode a GTI table back into typed windows.
pub fn windows_from_table(table: &Table) -> Result<Vec<GtiWindow>> {
    let starts = table.column("START")?.values();
    let stops = table.column("STOP")?.values();
    let first = table.column("START_EVENT_IDX")?.values();
    let last = table.column("END_EVENT_IDX")?.values();

    (0..starts.len())
        .map(|row| {
            let (Some(&stop), Some(&a), Some(&b)) = (stops.get(row), first.get(row), last.get(row))
            else {
                return Err(Error::Ingestion(format!(
                    "GTI table '{}' has ragged columns at row {row}",
                    table.id()
                )));
            };
            Ok(GtiWindow {
                start: starts[row],
                stop,
                start_event_idx: as_index(a, row)?,
                end_event_idx: as_index(b, row)?,
            })
        })
        .collect()
}

fn as_index(v: f64, row: usize) -> Result<usize> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
        Ok(v as usize)
    } else {
        Err(Error::Ingestion(format!("row {row}: '{v}' is not an event index")))
    }
}
