use super::BeatDetector;
use crate::signal::{Events, TimeSeries};
use serde::{Deserialize, Serialize};

/// Tuning for the Pan–Tompkins-style R-peak detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcgDetectorConfig {
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Minimum physiological RR distance / refractory period (seconds).
    pub min_rr_s: f64,
    /// Scale between noise and signal envelopes for the adaptive threshold.
    pub threshold_scale: f64,
    /// How far back to search (seconds) for the precise R-peak after a detection.
    pub search_back_s: f64,
}

impl Default for EcgDetectorConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            integration_window_s: 0.150,
            min_rr_s: 0.250,
            threshold_scale: 0.6,
            search_back_s: 0.150,
        }
    }
}

/// Default [`BeatDetector`]: band-pass, differentiate, square, integrate, then an
/// adaptive threshold with refractory period and search-back to the true R apex.
#[derive(Debug, Clone, Default)]
pub struct PanTompkinsDetector {
    cfg: EcgDetectorConfig,
}

impl PanTompkinsDetector {
    pub fn new(cfg: EcgDetectorConfig) -> Self {
        Self { cfg }
    }

    /// Default tuning with the refractory period replaced (never below 150 ms).
    pub fn with_min_rr(min_rr_s: f64) -> Self {
        let cfg = EcgDetectorConfig {
            min_rr_s: min_rr_s.max(0.15),
            ..EcgDetectorConfig::default()
        };
        Self { cfg }
    }

    pub fn config(&self) -> &EcgDetectorConfig {
        &self.cfg
    }
}

impl BeatDetector for PanTompkinsDetector {
    fn detect(&self, samples: &[f64], fs: f64) -> Events {
        detect_r_peaks(samples, fs, &self.cfg)
    }
}

/// Detect R-peaks over a whole recording.
pub fn detect_series(ts: &TimeSeries, cfg: &EcgDetectorConfig) -> Events {
    detect_r_peaks(&ts.data, ts.fs, cfg)
}

/// Detect R-peaks in `data` sampled at `fs` Hz.
pub fn detect_r_peaks(data: &[f64], fs: f64, cfg: &EcgDetectorConfig) -> Events {
    if data.is_empty() || !(fs.is_finite() && fs > 0.0) {
        return Events::default();
    }

    let (bandpassed, integrated) = envelope(data, fs, cfg);
    let peaks = pick_peaks(&bandpassed, &integrated, fs, cfg);

    if peaks.len() < 2 {
        // The adaptive picker needs a few beats to settle; short or odd windows fall back.
        return Events::from_indices(fallback_peaks(data, fs, cfg));
    }

    Events::from_indices(peaks)
}

fn envelope(data: &[f64], fs: f64, cfg: &EcgDetectorConfig) -> (Vec<f64>, Vec<f64>) {
    let fs = fs.max(1.0);
    let bandpassed = bandpass(data, fs, cfg.lowcut_hz, cfg.highcut_hz);
    let squared: Vec<f64> = derivative(&bandpassed).iter().map(|d| d * d).collect();
    let win = ((cfg.integration_window_s * fs).round() as usize).max(1);
    let integrated = moving_average(&squared, win);
    (bandpassed, integrated)
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    let hp = if low > 0.0 {
        highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        lowpass(&hp, fs, high)
    }
}

fn rc(cutoff: f64) -> f64 {
    1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01))
}

fn highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let rc = rc(cutoff);
    let alpha = rc / (rc + 1.0 / fs);
    let mut prev_y = first;
    let mut prev_x = first;
    data.iter()
        .map(|&x| {
            let y = alpha * (prev_y + x - prev_x);
            prev_y = y;
            prev_x = x;
            y
        })
        .collect()
}

fn lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let alpha = dt / (rc(cutoff) + dt);
    let mut prev = first;
    data.iter()
        .map(|&x| {
            prev += alpha * (x - prev);
            prev
        })
        .collect()
}

fn derivative(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(data.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

/// Trailing moving average; the first `win - 1` outputs are scaled by `win` as well.
fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    let mut acc = 0.0;
    data.iter()
        .enumerate()
        .map(|(i, &sample)| {
            acc += sample;
            if i >= win {
                acc -= data[i - win];
            }
            acc / win as f64
        })
        .collect()
}

fn pick_peaks(
    bandpassed: &[f64],
    envelope: &[f64],
    fs: f64,
    cfg: &EcgDetectorConfig,
) -> Vec<usize> {
    if bandpassed.is_empty() || envelope.is_empty() {
        return Vec::new();
    }

    let refractory = (cfg.min_rr_s * fs).round().max(1.0) as usize;
    let search = (cfg.search_back_s * fs).round().max(1.0) as usize;

    // Seed both levels from the first second of envelope.
    let init = envelope.len().min((fs as usize).max(1));
    let avg = envelope[..init].iter().sum::<f64>() / init as f64;
    let mut signal_level = avg;
    let mut noise_level = avg * 0.5;
    let mut threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    let mut last_detection = 0usize;
    let mut peaks: Vec<usize> = Vec::new();

    for (i, &sample) in envelope.iter().enumerate() {
        let refractory_ok = peaks.is_empty() || i - last_detection >= refractory;
        // A flat envelope never counts as a beat.
        if sample > 0.0 && sample >= threshold && refractory_ok {
            let start = i.saturating_sub(search);
            let end = i.min(bandpassed.len() - 1);
            // Earliest sample wins ties.
            let apex = (start..=end)
                .rev()
                .max_by(|&a, &b| bandpassed[a].total_cmp(&bandpassed[b]))
                .unwrap_or(i);
            peaks.push(apex);
            last_detection = i;
            signal_level = 0.125 * sample + 0.875 * signal_level;
        } else {
            noise_level = 0.125 * sample + 0.875 * noise_level;
        }
        threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

/// Local maxima of the signal above its trailing mean, spaced by the refractory period.
fn fallback_peaks(data: &[f64], fs: f64, cfg: &EcgDetectorConfig) -> Vec<usize> {
    if data.len() < 3 {
        return Vec::new();
    }
    let min_gap = (cfg.min_rr_s * fs).max(1.0) as usize;
    let win = ((cfg.integration_window_s * fs) as usize).max(1);
    let detrended: Vec<f64> = data
        .iter()
        .zip(moving_average(data, win))
        .map(|(x, m)| x - m)
        .collect();

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..detrended.len() - 1 {
        let y = detrended[i];
        let is_peak = y > 0.0 && y > detrended[i - 1] && y > detrended[i + 1];
        let spaced = peaks.last().map_or(true, |&last| i - last >= min_gap);
        if is_peak && spaced {
            peaks.push(i);
        }
    }
    peaks
}
