use serde::Serialize;

use super::gti::{self, GtiWindow};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Column – one named numeric series
// ---------------------------------------------------------------------------

/// An ordered numeric series with optional per-point errors.
///
/// `error_values` is either empty (errors not tracked) or exactly as long as
/// `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<f64>,
    error_values: Vec<f64>,
    /// Generated rather than measured.
    synthetic: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            error_values: Vec::new(),
            synthetic: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn error_values(&self) -> &[f64] {
        &self.error_values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.error_values.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub(crate) fn mark_synthetic(&mut self) {
        self.synthetic = true;
    }

    /// Append one value. On a column that tracks errors the new point gets a
    /// NaN (unknown) error so both series stay aligned.
    pub fn add_value(&mut self, value: f64) {
        self.values.push(value);
        if self.has_errors() {
            self.error_values.push(f64::NAN);
        }
    }

    /// Bulk version of [`Column::add_value`].
    pub fn add_values(&mut self, values: &[f64]) {
        self.values.extend_from_slice(values);
        if self.has_errors() {
            self.error_values.resize(self.values.len(), f64::NAN);
        }
    }

    /// Append a value together with its uncertainty.
    ///
    /// Fails when the column already holds values without errors.
    pub fn add_value_with_error(&mut self, value: f64, error: f64) -> Result<()> {
        if self.error_values.len() != self.values.len() {
            return Err(Error::Parse(format!(
                "column '{}' holds {} values but no errors",
                self.name,
                self.values.len()
            )));
        }
        self.values.push(value);
        self.error_values.push(error);
        Ok(())
    }

    /// Replace the contents wholesale. `error_values` must be empty or match
    /// `values` in length.
    pub fn set_values(&mut self, values: Vec<f64>, error_values: Vec<f64>) -> Result<()> {
        if !error_values.is_empty() && error_values.len() != values.len() {
            return Err(Error::Parse(format!(
                "column '{}': {} values but {} errors",
                self.name,
                values.len(),
                error_values.len()
            )));
        }
        self.values = values;
        self.error_values = error_values;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Table – named columns sharing one row index space
// ---------------------------------------------------------------------------

/// A named, ordered set of columns. Declaration order is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    id: String,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table with one empty column per header name.
    pub fn new<S: AsRef<str>>(id: impl Into<String>, header_names: &[S]) -> Self {
        let mut table = Self {
            id: id.into(),
            columns: Vec::with_capacity(header_names.len()),
        };
        table.add_columns(header_names);
        table
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add empty columns; names already present are left untouched.
    pub fn add_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if !self.has_column(name) {
                self.columns.push(Column::new(name));
            }
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::not_found("column", format!("{}.{name}", self.id)))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        let id = &self.id;
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::not_found("column", format!("{id}.{name}")))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Row count, taken from the first column.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }
}

// ---------------------------------------------------------------------------
// Dataset – tables in insertion order
// ---------------------------------------------------------------------------

/// Everything parsed from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: String,
    tables: Vec<Table>,
}

impl Dataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tables: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a table with empty columns for `header_names`. An existing table
    /// with the same id is replaced in place.
    pub fn add_table<S: AsRef<str>>(&mut self, id: &str, header_names: &[S]) -> &mut Table {
        let table = Table::new(id, header_names);
        let pos = match self.tables.iter().position(|t| t.id == id) {
            Some(pos) => {
                self.tables[pos] = table;
                pos
            }
            None => {
                self.tables.push(table);
                self.tables.len() - 1
            }
        };
        &mut self.tables[pos]
    }

    pub fn table(&self, id: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found("table", id))
    }

    pub fn table_mut(&mut self, id: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found("table", id))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn table_ids(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn column_names(&self, table_id: &str) -> Result<Vec<&str>> {
        Ok(self.table(table_id)?.column_names())
    }

    pub fn values(&self, table_id: &str, column: &str) -> Result<&[f64]> {
        Ok(self.table(table_id)?.column(column)?.values())
    }

    pub fn error_values(&self, table_id: &str, column: &str) -> Result<&[f64]> {
        Ok(self.table(table_id)?.column(column)?.error_values())
    }

    /// Decode a GTI table produced by the event loader.
    pub fn gti_windows(&self, table_id: &str) -> Result<Vec<GtiWindow>> {
        gti::windows_from_table(self.table(table_id)?)
    }

    pub fn schema(&self) -> DatasetSchema {
        DatasetSchema {
            id: self.id.clone(),
            tables: self
                .tables
                .iter()
                .map(|t| TableSchema {
                    id: t.id.clone(),
                    row_count: t.row_count(),
                    columns: t
                        .columns
                        .iter()
                        .map(|c| ColumnSchema {
                            name: c.name.clone(),
                            len: c.len(),
                            has_errors: c.has_errors(),
                            synthetic: c.synthetic,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – serialisable shape of a dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSchema {
    pub id: String,
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub id: String,
    pub row_count: usize,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub len: usize,
    pub has_errors: bool,
    pub synthetic: bool,
}
