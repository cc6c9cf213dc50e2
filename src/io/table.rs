//! Tabular file ingest and validation.
//!
//! Theory predictions and measured spectra arrive as column-delimited text
//! with a header row naming each column. This module turns such a file into
//! named `f64` columns that are safe to fit.
//!
//! Design goals:
//! - **Strict schema**: a missing column or unparseable cell fails the whole
//!   load with path + line number. A theory table with a corrupt row must
//!   not silently shrink.
//! - **Exact column names**: the on-disk schema (`k/h`, `Z2_vv_A`,
//!   `P0_mu2`, ...) is preserved verbatim; only surrounding whitespace and a
//!   UTF-8 BOM are stripped.
//! - **Deterministic behavior**: no unit guessing, no row skipping.
//!
//! Two dialects share the same `Table` type: the pipeline's native
//! whitespace-separated columns, and comma-separated exports of the same
//! tables. The header row decides which parser runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::FitError;

/// A parsed tabular file: named columns over all-numeric rows.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Read and validate a table file.
    pub fn read(path: &Path) -> Result<Self, FitError> {
        let text = fs::read_to_string(path)
            .map_err(|e| FitError::file_format(path, format!("failed to open: {e}")))?;

        let header = content_lines(&text)
            .next()
            .ok_or_else(|| FitError::file_format(path, "empty table"))?
            .1;

        let table = if header.contains(',') {
            Self::parse_csv(path, &text)?
        } else {
            Self::parse_whitespace(path, &text)?
        };

        debug!(
            "read {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    fn parse_csv(path: &Path, text: &str) -> Result<Self, FitError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| FitError::file_format(path, format!("failed to read header: {e}")))?
            .clone();
        let columns = build_column_map(path, headers.iter())?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| FitError::file_format(path, format!("CSV parse error: {e}")))?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            rows.push(parse_row(path, line, record.iter(), columns.len())?);
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    fn parse_whitespace(path: &Path, text: &str) -> Result<Self, FitError> {
        let mut lines = content_lines(text);

        let (_, header) = lines
            .next()
            .ok_or_else(|| FitError::file_format(path, "empty table"))?;
        let columns = build_column_map(path, header.split_whitespace())?;

        let mut rows = Vec::new();
        for (line, body) in lines {
            rows.push(parse_row(path, line, body.split_whitespace(), columns.len())?);
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Extract a named column.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, FitError> {
        let idx = *self.columns.get(name).ok_or_else(|| {
            FitError::file_format(&self.path, format!("missing required column `{name}`"))
        })?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn build_column_map<'a>(
    path: &Path,
    names: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, FitError> {
    let mut columns = HashMap::new();
    for (idx, name) in names.enumerate() {
        let name = normalize_header_name(name);
        if name.is_empty() {
            return Err(FitError::file_format(path, "blank column name in header"));
        }
        if columns.insert(name.clone(), idx).is_some() {
            return Err(FitError::file_format(
                path,
                format!("duplicate column `{name}` in header"),
            ));
        }
    }
    Ok(columns)
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 files with a BOM prefix on
    // the first header cell. If we don't strip it, schema validation will
    // incorrectly report missing columns.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_row<'a>(
    path: &Path,
    line: usize,
    fields: impl Iterator<Item = &'a str>,
    n_columns: usize,
) -> Result<Vec<f64>, FitError> {
    let mut row = Vec::with_capacity(n_columns);
    for field in fields {
        let value = field.parse::<f64>().map_err(|_| {
            FitError::file_format(path, format!("line {line}: not a number: `{field}`"))
        })?;
        row.push(value);
    }
    if row.len() != n_columns {
        return Err(FitError::file_format(
            path,
            format!(
                "line {line}: expected {n_columns} fields, found {}",
                row.len()
            ),
        ));
    }
    Ok(row)
}
