/// Verdict over a smoothed rate timeline.
pub trait RatePredicate {
    fn check(&self, timeline: &[f64]) -> bool;
}

impl<F> RatePredicate for F
where
    F: Fn(&[f64]) -> bool,
{
    fn check(&self, timeline: &[f64]) -> bool {
        self(timeline)
    }
}

/// True when any rate is strictly above `bpm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub bpm: f64,
}

impl Threshold {
    pub fn new(bpm: f64) -> Self {
        Self { bpm }
    }
}

impl RatePredicate for Threshold {
    fn check(&self, timeline: &[f64]) -> bool {
        exceeds(timeline, self.bpm)
    }
}

pub fn exceeds(timeline: &[f64], bpm: f64) -> bool {
    timeline.iter().any(|&rate| rate > bpm)
}
