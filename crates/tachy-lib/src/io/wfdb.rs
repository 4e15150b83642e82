use super::SampleSource;
use crate::signal::TimeSeries;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_FS: f64 = 250.0;

/// Load the specified signal (lead) from a WFDB header/data pair into a TimeSeries.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    // wfdb-rust panics on unreadable input, so check what we can first.
    std::fs::metadata(header_path)
        .with_context(|| format!("failed to read WFDB header {}", header_path.display()))?;
    let (header, signals) = wfdb_rust::parse_wfdb(header_path);
    if lead >= signals.len() {
        anyhow::bail!(
            "WFDB record contains {} signals, but lead {} was requested",
            signals.len(),
            lead
        );
    }
    let spec = header
        .signal_specs
        .get(lead)
        .with_context(|| format!("WFDB header has no signal spec for lead {lead}"))?;
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .unwrap_or(DEFAULT_FS);
    let data = signals[lead]
        .iter()
        .map(|&sample| (sample as f64 - baseline) / gain)
        .collect();
    Ok(TimeSeries::new(fs, data))
}

/// One lead of a WFDB record; the sampling rate comes from the header.
#[derive(Debug, Clone)]
pub struct WfdbSource {
    pub header: PathBuf,
    pub lead: usize,
}

impl WfdbSource {
    pub fn new(header: impl Into<PathBuf>, lead: usize) -> Self {
        Self {
            header: header.into(),
            lead,
        }
    }
}

impl SampleSource for WfdbSource {
    fn acquire(&self) -> Result<TimeSeries> {
        load_wfdb_lead(&self.header, self.lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_an_error() {
        let err = WfdbSource::new("/nonexistent/100.hea", 0)
            .acquire()
            .unwrap_err();
        assert!(format!("{err:#}").contains("100.hea"));
    }
}
