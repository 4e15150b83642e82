use serde::{Deserialize, Serialize};

/// Uniformly sampled amplitude stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Intervals between consecutive events. Non-increasing pairs are dropped.
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let rr = events
            .indices
            .windows(2)
            .filter(|w| w[1] > w[0])
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect();
        Self { rr }
    }
}

/// Instantaneous heart rates in beats per minute, one per consecutive beat pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSeries {
    pub bpm: Vec<f64>,
}

impl RateSeries {
    pub fn from_bpm(bpm: Vec<f64>) -> Self {
        Self { bpm }
    }

    /// Convert RR intervals (seconds) to beats per minute.
    pub fn from_rr(rr: &RRSeries) -> Self {
        let bpm = rr
            .rr
            .iter()
            .filter(|&&dt| dt > 0.0)
            .map(|dt| 60.0 / dt)
            .collect();
        Self { bpm }
    }

    pub fn len(&self) -> usize {
        self.bpm.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bpm.is_empty()
    }

    /// Arithmetic mean, or `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.bpm.is_empty() {
            return None;
        }
        Some(self.bpm.iter().sum::<f64>() / self.bpm.len() as f64)
    }
}
