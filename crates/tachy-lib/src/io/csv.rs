use super::SampleSource;
use crate::signal::TimeSeries;
use ::csv::{ReaderBuilder, Trim};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Read one column, selected by header name (case-insensitive), as f64 samples.
pub fn read_csv_column(path: &Path, column: &str, delimiter: u8) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            anyhow!(
                "{} has no column '{}' (columns: {})",
                path.display(),
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;
    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {}", row + 1))?;
        let raw = record
            .get(idx)
            .ok_or_else(|| anyhow!("row {} is missing column '{}'", row + 1, column))?;
        let value = raw
            .parse::<f64>()
            .with_context(|| format!("row {} column '{}' is not f64: {}", row + 1, column, raw))?;
        values.push(value);
    }
    if values.is_empty() {
        anyhow::bail!("column '{}' in {} has no samples", column, path.display());
    }
    Ok(values)
}

/// Named column of a delimited file.
#[derive(Debug, Clone)]
pub struct CsvColumnSource {
    pub path: PathBuf,
    pub column: String,
    pub delimiter: u8,
    pub fs: f64,
}

impl CsvColumnSource {
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>, fs: f64) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
            delimiter: b',',
            fs,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl SampleSource for CsvColumnSource {
    fn acquire(&self) -> Result<TimeSeries> {
        let data = read_csv_column(&self.path, &self.column, self.delimiter)?;
        Ok(TimeSeries::new(self.fs, data))
    }
}
