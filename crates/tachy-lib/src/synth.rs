//! Synthetic ECG-like recordings: Gaussian R waves on a slow baseline wander.

use crate::signal::{Events, TimeSeries};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A stretch of constant heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSegment {
    pub duration_s: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthSpec {
    pub fs: f64,
    pub segments: Vec<RateSegment>,
    /// Peak amplitude of uniform additive noise.
    #[serde(default)]
    pub noise: f64,
    #[serde(default)]
    pub seed: u64,
}

impl SynthSpec {
    pub fn constant(fs: f64, duration_s: f64, bpm: f64) -> Self {
        Self {
            fs,
            segments: vec![RateSegment { duration_s, bpm }],
            noise: 0.0,
            seed: 0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s.max(0.0)).sum()
    }

    fn bpm_at(&self, t: f64) -> Option<f64> {
        let mut acc = 0.0;
        for seg in &self.segments {
            acc += seg.duration_s.max(0.0);
            if t < acc {
                return Some(seg.bpm);
            }
        }
        None
    }
}

/// Generated recording plus the ground-truth beat positions.
#[derive(Debug, Clone)]
pub struct SyntheticEcg {
    pub series: TimeSeries,
    pub beats: Events,
}

const FIRST_BEAT_S: f64 = 0.5;
const R_WIDTH_S: f64 = 0.02;
const R_AMPLITUDE: f64 = 1.2;
const WANDER_AMPLITUDE: f64 = 0.05;
/// Highest rate a segment may ask for.
pub const MAX_SYNTH_BPM: f64 = 600.0;

/// Non-finite sampling rate, duration or noise yields an empty recording.
pub fn synthetic_ecg(spec: &SynthSpec) -> SyntheticEcg {
    let duration = spec.duration();
    if !(spec.fs.is_finite() && spec.fs > 0.0 && duration.is_finite() && spec.noise.is_finite()) {
        return SyntheticEcg {
            series: TimeSeries::new(spec.fs, Vec::new()),
            beats: Events::default(),
        };
    }
    let n = (duration * spec.fs).max(0.0) as usize;

    let mut beat_times = Vec::new();
    let mut t = FIRST_BEAT_S;
    while let Some(bpm) = spec.bpm_at(t) {
        if !(bpm > 0.0 && bpm.is_finite()) {
            break;
        }
        beat_times.push(t);
        let next = t + 60.0 / bpm.min(MAX_SYNTH_BPM);
        if next <= t {
            break;
        }
        t = next;
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let reach = 6.0 * R_WIDTH_S;
    let mut data = Vec::with_capacity(n);
    let mut first = 0usize;
    for i in 0..n {
        let time = i as f64 / spec.fs;
        let mut v = WANDER_AMPLITUDE * (2.0 * PI * time).sin();
        while first < beat_times.len() && beat_times[first] < time - reach {
            first += 1;
        }
        for &bt in beat_times[first..].iter().take_while(|&&bt| bt <= time + reach) {
            v += R_AMPLITUDE * (-0.5 * ((time - bt) / R_WIDTH_S).powi(2)).exp();
        }
        if spec.noise > 0.0 {
            v += rng.gen_range(-spec.noise..=spec.noise);
        }
        data.push(v);
    }

    let beats = beat_times
        .iter()
        .map(|bt| (bt * spec.fs).round() as usize)
        .filter(|&idx| idx < n)
        .collect();

    SyntheticEcg {
        series: TimeSeries::new(spec.fs, data),
        beats: Events::from_indices(beats),
    }
}
