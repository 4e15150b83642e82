//! Windowed heart-rate pipeline: windows → beats → mean rate per window → median
//! smoothing → verdict.

use crate::{
    detectors::BeatDetector,
    error::{ConfigError, PipelineError},
    filters::MedianFilter,
    io::SampleSource,
    metrics::{
        rate::{window_rate, BeatRateEstimator, IntervalToRate, WindowRates},
        threshold::{RatePredicate, Threshold},
    },
    signal::TimeSeries,
    windows::{Window, WindowSpec},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// What to do with a window that yields no beat-interval rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyWindowPolicy {
    /// Stop and return [`PipelineError::EmptyWindowRate`] for the first such window.
    #[default]
    Abort,
    /// Leave the window out of the timeline and list it in [`PipelineReport::gaps`].
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub window: WindowSpec,
    pub median_filter_length: usize,
    /// Verdict is raised when any smoothed window rate is strictly above this value.
    pub threshold_bpm: f64,
    #[serde(default)]
    pub on_empty_window: EmptyWindowPolicy,
}

impl PipelineConfig {
    pub fn new(window: WindowSpec, median_filter_length: usize, threshold_bpm: f64) -> Self {
        Self {
            window,
            median_filter_length,
            threshold_bpm,
            on_empty_window: EmptyWindowPolicy::default(),
        }
    }

    pub fn with_empty_window_policy(mut self, policy: EmptyWindowPolicy) -> Self {
        self.on_empty_window = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        MedianFilter::new(self.median_filter_length)?;
        if !self.threshold_bpm.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.threshold_bpm));
        }
        Ok(())
    }
}

/// Shared flag checked between windows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub beats: usize,
    /// `None` marks a gap.
    pub rate_bpm: Option<f64>,
}

/// Everything one run produced, in window order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub fs: f64,
    pub sample_count: usize,
    pub windows: Vec<WindowSummary>,
    pub timeline: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub gaps: Vec<usize>,
    pub abnormal: bool,
}

pub struct Pipeline<D, R> {
    config: PipelineConfig,
    estimator: BeatRateEstimator<D, R>,
    filter: MedianFilter,
    cancel: Option<CancelToken>,
}

impl<D: BeatDetector, R: IntervalToRate> Pipeline<D, R> {
    /// Rejects invalid window geometry, filter length or threshold up front.
    pub fn new(config: PipelineConfig, detector: D, converter: R) -> Result<Self, PipelineError> {
        config.validate()?;
        let filter = MedianFilter::new(config.median_filter_length)?;
        Ok(Self {
            config,
            estimator: BeatRateEstimator::new(detector, converter),
            filter,
            cancel: None,
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn evaluate(&self, stream: &TimeSeries) -> Result<bool, PipelineError> {
        Ok(self.run(stream)?.abnormal)
    }

    pub fn evaluate_with<P>(
        &self,
        stream: &TimeSeries,
        predicate: &P,
    ) -> Result<bool, PipelineError>
    where
        P: RatePredicate + ?Sized,
    {
        Ok(self.run_with(stream, predicate)?.abnormal)
    }

    /// Acquire the stream from `source`, then evaluate it.
    pub fn evaluate_source<S>(&self, source: &S) -> Result<bool, PipelineError>
    where
        S: SampleSource + ?Sized,
    {
        Ok(self.run_source(source)?.abnormal)
    }

    pub fn run_source<S>(&self, source: &S) -> Result<PipelineReport, PipelineError>
    where
        S: SampleSource + ?Sized,
    {
        let stream = source.acquire().map_err(PipelineError::Acquisition)?;
        self.run(&stream)
    }

    pub fn run(&self, stream: &TimeSeries) -> Result<PipelineReport, PipelineError> {
        let threshold = Threshold::new(self.config.threshold_bpm);
        self.run_with(stream, &threshold)
    }

    pub fn run_with<P>(
        &self,
        stream: &TimeSeries,
        predicate: &P,
    ) -> Result<PipelineReport, PipelineError>
    where
        P: RatePredicate + ?Sized,
    {
        if !(stream.fs.is_finite() && stream.fs > 0.0) {
            return Err(ConfigError::InvalidSamplingRate(stream.fs).into());
        }

        let Aggregate {
            windows,
            timeline,
            gaps,
        } = self.aggregate(stream)?;

        let smoothed = self.filter.apply(&timeline);
        let abnormal = predicate.check(&smoothed);
        info!(
            "{} window(s), {} gap(s), peak smoothed rate {:?} bpm, abnormal={}",
            windows.len(),
            gaps.len(),
            smoothed.iter().copied().reduce(f64::max),
            abnormal
        );

        Ok(PipelineReport {
            fs: stream.fs,
            sample_count: stream.len(),
            windows,
            timeline,
            smoothed,
            gaps,
            abnormal,
        })
    }

    fn check_cancelled(&self, completed: usize) -> Result<(), PipelineError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled { completed }),
            _ => Ok(()),
        }
    }

    fn estimate(&self, window: Window, stream: &TimeSeries) -> WindowRates {
        let wr = self.estimator.estimate(window, &stream.data, stream.fs);
        debug!(
            "window {} [{}, {}): {} beat(s), {} rate(s)",
            window.index,
            window.start,
            window.end(),
            wr.events.len(),
            wr.rates.len()
        );
        wr
    }

    /// Each window is detected, converted and aggregated before the next one starts.
    #[cfg(not(feature = "parallel"))]
    fn aggregate(&self, stream: &TimeSeries) -> Result<Aggregate, PipelineError> {
        let windows = self.config.window.windows(stream.len());
        let mut acc = Aggregate::with_capacity(windows.len());
        for window in windows {
            self.check_cancelled(acc.windows.len())?;
            let wr = self.estimate(window, stream);
            acc.push(&wr, self.config.on_empty_window)?;
        }
        Ok(acc)
    }

    /// Windows fan out over the rayon pool; aggregation then walks them in window order.
    #[cfg(feature = "parallel")]
    fn aggregate(&self, stream: &TimeSeries) -> Result<Aggregate, PipelineError> {
        use rayon::prelude::*;
        use std::sync::atomic::AtomicUsize;

        let windows: Vec<_> = self.config.window.windows(stream.len()).collect();
        let completed = AtomicUsize::new(0);
        let per_window = windows
            .par_iter()
            .map(|&window| -> Result<WindowRates, PipelineError> {
                self.check_cancelled(completed.load(Ordering::SeqCst))?;
                let wr = self.estimate(window, stream);
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(wr)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut acc = Aggregate::with_capacity(per_window.len());
        for wr in &per_window {
            acc.push(wr, self.config.on_empty_window)?;
        }
        Ok(acc)
    }
}

/// Window summaries, rate timeline and gaps collected in window order.
struct Aggregate {
    windows: Vec<WindowSummary>,
    timeline: Vec<f64>,
    gaps: Vec<usize>,
}

impl Aggregate {
    fn with_capacity(n: usize) -> Self {
        Self {
            windows: Vec::with_capacity(n),
            timeline: Vec::with_capacity(n),
            gaps: Vec::new(),
        }
    }

    fn push(&mut self, wr: &WindowRates, policy: EmptyWindowPolicy) -> Result<(), PipelineError> {
        let rate_bpm = match window_rate(wr) {
            Ok(rate) => {
                self.timeline.push(rate);
                Some(rate)
            }
            Err(err) => match policy {
                EmptyWindowPolicy::Abort => return Err(err),
                EmptyWindowPolicy::Skip => {
                    warn!("{err}; window left out of the timeline");
                    self.gaps.push(wr.window.index);
                    None
                }
            },
        };
        self.windows.push(WindowSummary {
            index: wr.window.index,
            start: wr.window.start,
            end: wr.window.end(),
            beats: wr.events.len(),
            rate_bpm,
        });
        Ok(())
    }
}

/// One-shot evaluation with the built-in threshold predicate.
pub fn evaluate<D, R>(
    stream: &TimeSeries,
    config: &PipelineConfig,
    detector: D,
    converter: R,
) -> Result<bool, PipelineError>
where
    D: BeatDetector,
    R: IntervalToRate,
{
    Pipeline::new(config.clone(), detector, converter)?.evaluate(stream)
}
