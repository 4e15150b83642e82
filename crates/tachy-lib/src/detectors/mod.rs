pub mod ecg;

use crate::signal::Events;

/// Heartbeat detector over one contiguous slice of samples.
///
/// Returned indices are relative to the slice and strictly increasing.
pub trait BeatDetector: Send + Sync {
    fn detect(&self, samples: &[f64], fs: f64) -> Events;
}

impl<D: BeatDetector + ?Sized> BeatDetector for &D {
    fn detect(&self, samples: &[f64], fs: f64) -> Events {
        (**self).detect(samples, fs)
    }
}

impl<D: BeatDetector + ?Sized> BeatDetector for Box<D> {
    fn detect(&self, samples: &[f64], fs: f64) -> Events {
        (**self).detect(samples, fs)
    }
}

pub use ecg::{EcgDetectorConfig, PanTompkinsDetector};
