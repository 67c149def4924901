use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::Table;
use crate::config::AugmentConfig;
use crate::error::{Error, Result};

/// Append a column of seeded uniform values in `[low, high)`, one per row.
///
/// The column is flagged synthetic so it can always be told apart from
/// measured data. Same seed and row count give the same values.
pub fn append_uniform_column(table: &mut Table, settings: &AugmentConfig) -> Result<()> {
    let AugmentConfig {
        column,
        seed,
        low,
        high,
    } = settings;
    if table.has_column(column) {
        return Err(Error::Parse(format!(
            "table '{}' already has a column '{column}'",
            table.id()
        )));
    }
    if !(low < high) {
        return Err(Error::Config(format!("empty range [{low}, {high})")));
    }

    let rows = table.row_count();
    let mut rng = StdRng::seed_from_u64(*seed);
    let values: Vec<f64> = (0..rows).map(|_| rng.gen_range(*low..*high)).collect();

    table.add_columns(&[column.as_str()]);
    let col = table.column_mut(column)?;
    col.set_values(values, Vec::new())?;
    col.mark_synthetic();
    debug!("Appended synthetic column '{column}' ({rows} rows, seed {seed})");
    Ok(())
}
