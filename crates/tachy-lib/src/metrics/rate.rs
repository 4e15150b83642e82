use crate::detectors::BeatDetector;
use crate::error::PipelineError;
use crate::signal::{Events, RRSeries, RateSeries};
use crate::windows::Window;

/// Beat positions to instantaneous heart rate.
pub trait IntervalToRate: Send + Sync {
    fn rates(&self, events: &Events, fs: f64) -> RateSeries;
}

impl<R: IntervalToRate + ?Sized> IntervalToRate for &R {
    fn rates(&self, events: &Events, fs: f64) -> RateSeries {
        (**self).rates(events, fs)
    }
}

impl<R: IntervalToRate + ?Sized> IntervalToRate for Box<R> {
    fn rates(&self, events: &Events, fs: f64) -> RateSeries {
        (**self).rates(events, fs)
    }
}

/// `60 / rr` for every consecutive beat pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct RrIntervalRate;

impl IntervalToRate for RrIntervalRate {
    fn rates(&self, events: &Events, fs: f64) -> RateSeries {
        RateSeries::from_rr(&RRSeries::from_events(events, fs))
    }
}

/// Detector output and derived rates for one window.
#[derive(Debug, Clone)]
pub struct WindowRates {
    pub window: Window,
    pub events: Events,
    pub rates: RateSeries,
}

impl WindowRates {
    /// Mean instantaneous rate; `None` when the window held fewer than two beats.
    pub fn mean(&self) -> Option<f64> {
        self.rates.mean()
    }
}

/// Reduce one window to its mean rate.
pub fn window_rate(rates: &WindowRates) -> Result<f64, PipelineError> {
    rates.mean().ok_or(PipelineError::EmptyWindowRate {
        window: rates.window,
    })
}

/// Runs a detector and a rate conversion over individual windows.
#[derive(Debug, Clone)]
pub struct BeatRateEstimator<D, R> {
    detector: D,
    converter: R,
}

impl<D: BeatDetector, R: IntervalToRate> BeatRateEstimator<D, R> {
    pub fn new(detector: D, converter: R) -> Self {
        Self {
            detector,
            converter,
        }
    }

    /// A window reaching past the end of `samples` holds no beats.
    pub fn estimate(&self, window: Window, samples: &[f64], fs: f64) -> WindowRates {
        let events = match window.slice(samples) {
            Some(slice) => self.detector.detect(slice, fs),
            None => Events::default(),
        };
        let rates = if events.len() < 2 {
            RateSeries::default()
        } else {
            self.converter.rates(&events, fs)
        };
        WindowRates {
            window,
            events,
            rates,
        }
    }
}
