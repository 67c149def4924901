use std::path::Path;

use log::{debug, info};

use super::augment;
use super::detect::{detect_format, FileFormat};
use super::events;
use super::model::Dataset;
use crate::config::IngestConfig;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file, dispatching on its content.
///
/// * ASCII table  → [`load_ascii`], then the optional synthetic column
/// * binary table → [`events::load_events`]
/// * anything else → [`Error::FormatUnrecognized`]
pub fn load_file(path: &Path, config: &IngestConfig) -> Result<Dataset> {
    let format = detect_format(path)?;
    debug!("File format of {}: {format}", path.display());

    match format {
        FileFormat::AsciiTable => {
            let ascii = &config.ascii;
            let mut dataset = load_ascii(
                path,
                ascii.dataset_id(),
                &ascii.table_id,
                &ascii.header_names,
            )?;
            if let Some(settings) = &ascii.augment {
                augment::append_uniform_column(dataset.table_mut(&ascii.table_id)?, settings)?;
            }
            Ok(dataset)
        }
        FileFormat::BinaryTable => events::load_events(path, &config.events),
        FileFormat::Unknown => Err(Error::FormatUnrecognized(path.to_path_buf())),
    }
}

// ---------------------------------------------------------------------------
// ASCII loader
// ---------------------------------------------------------------------------

/// Layout: one row per line, values separated by whitespace or commas,
/// `#` starts a comment line. Header `i` reads its values from column `2i`
/// and its errors from column `2i + 1`:
///
/// ```text
/// # Time  TimeErr  Rate  RateErr
///   0.0   0.5      12.1  3.4
///   1.0   0.5      11.7  3.3
/// ```
pub fn load_ascii<S: AsRef<str>>(
    path: &Path,
    dataset_id: &str,
    table_id: &str,
    header_names: &[S],
) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Parse(format!("reading {}: {e}", path.display())))?;
    let matrix = read_matrix(&text)?;

    let width = 2 * header_names.len();
    if let Some((line, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(Error::Parse(format!(
            "row {line} has {} columns, expected {width} for {} headers",
            row.len(),
            header_names.len()
        )));
    }

    let mut dataset = Dataset::new(dataset_id);
    let table = dataset.add_table(table_id, header_names);
    for (i, header) in header_names.iter().enumerate() {
        let values = matrix.iter().map(|r| r[2 * i]).collect();
        let errors = matrix.iter().map(|r| r[2 * i + 1]).collect();
        table.column_mut(header.as_ref())?.set_values(values, errors)?;
    }

    info!(
        "Read text table {} ({} rows)",
        path.display(),
        matrix.len()
    );
    Ok(dataset)
}

/// Parse a numeric matrix. Comma-separated when any data line has a comma,
/// whitespace-separated otherwise.
fn read_matrix(text: &str) -> Result<Vec<Vec<f64>>> {
    let comma = text
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .any(|l| l.contains(','));

    let matrix = if comma {
        read_delimited(text)?
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, l)| {
                let l = l.trim();
                !l.is_empty() && !l.starts_with('#')
            })
            .map(|(n, l)| parse_row(l.split_whitespace(), n + 1))
            .collect::<Result<Vec<_>>>()?
    };

    if matrix.is_empty() {
        return Err(Error::Parse("no data rows".into()));
    }
    Ok(matrix)
}

fn read_delimited(text: &str) -> Result<Vec<Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Parse(format!("CSV: {e}")))?;
        // whitespace-only line
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        rows.push(parse_row(record.iter(), line)?);
    }
    Ok(rows)
}

fn parse_row<'a>(tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<Vec<f64>> {
    tokens
        .enumerate()
        .map(|(j, tok)| {
            tok.parse::<f64>().map_err(|_| {
                Error::Parse(format!("line {line}, column {j}: '{tok}' is not a number"))
            })
        })
        .collect()
}
