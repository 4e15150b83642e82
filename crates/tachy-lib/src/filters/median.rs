//! Odd-length running median with edge replication.
//!
//! Output `i` is the median of the `k` values centred at `i`, where positions before the
//! start read the first value and positions past the end read the last one. The output
//! always has the input's length.

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianFilter {
    length: usize,
}

impl MedianFilter {
    /// `length` must be odd and at least 1.
    pub fn new(length: usize) -> Result<Self, ConfigError> {
        if length == 0 || length % 2 == 0 {
            return Err(ConfigError::InvalidFilterLength(length));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n == 0 || self.length == 1 {
            return values.to_vec();
        }
        let half = self.length / 2;
        let last = n - 1;
        let mut neighbourhood = Vec::with_capacity(self.length);
        (0..n)
            .map(|i| {
                neighbourhood.clear();
                neighbourhood.extend((0..self.length).map(|j| {
                    let pos = (i + j).saturating_sub(half).min(last);
                    values[pos]
                }));
                neighbourhood.sort_unstable_by(f64::total_cmp);
                neighbourhood[half]
            })
            .collect()
    }
}

/// Convenience wrapper: validate `length` and filter `values`.
pub fn median_filter(values: &[f64], length: usize) -> Result<Vec<f64>, ConfigError> {
    Ok(MedianFilter::new(length)?.apply(values))
}
