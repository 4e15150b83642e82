pub mod rate;
pub mod threshold;

pub use rate::{window_rate, BeatRateEstimator, IntervalToRate, RrIntervalRate, WindowRates};
pub use threshold::{RatePredicate, Threshold};
