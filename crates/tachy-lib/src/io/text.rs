use super::SampleSource;
use crate::signal::TimeSeries;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Newline-delimited samples from a file, or stdin when no path is given.
#[derive(Debug, Clone)]
pub struct TextSource {
    pub input: Option<PathBuf>,
    pub fs: f64,
}

impl TextSource {
    pub fn new(input: Option<PathBuf>, fs: f64) -> Self {
        Self { input, fs }
    }
}

impl SampleSource for TextSource {
    fn acquire(&self) -> Result<TimeSeries> {
        let data = match &self.input {
            Some(path) => read_f64_series(path)?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading samples from stdin")?;
                parse_f64_series(&buf)?
            }
        };
        Ok(TimeSeries::new(self.fs, data))
    }
}
