//! Sliding-window enumeration over a sample stream.
//!
//! Windows are half-open ranges `[start, start + size)` whose starts advance by `step`.
//! Enumeration stops at the first window that would run past the stream (or past the
//! optional inclusive end index); truncated windows are never produced.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Window geometry in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub size: usize,
    pub step: usize,
    /// Start of the first window.
    #[serde(default)]
    pub offset: usize,
    /// Inclusive last sample index a window may cover.
    #[serde(default)]
    pub end: Option<usize>,
}

impl WindowSpec {
    pub fn new(size: usize, step: usize) -> Self {
        Self {
            size,
            step,
            offset: 0,
            end: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_end(mut self, end: usize) -> Self {
        self.end = Some(end);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroWindowSize);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroWindowStep);
        }
        Ok(())
    }

    /// Enumerate the windows that fit a stream of `len` samples.
    pub fn windows(&self, len: usize) -> Windows {
        // Exclusive bound: the stream length, tightened by the end index when given.
        let limit = match self.end {
            Some(end) => len.min(end.saturating_add(1)),
            None => len,
        };
        Windows {
            size: self.size,
            step: self.step,
            limit,
            next_start: Some(self.offset),
            next_index: 0,
        }
    }
}

/// One enumerated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Position in enumeration order.
    pub index: usize,
    pub start: usize,
    pub size: usize,
}

impl Window {
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Samples covered by this window, or `None` when it does not fit in `data`.
    pub fn slice<'a>(&self, data: &'a [f64]) -> Option<&'a [f64]> {
        data.get(self.range())
    }
}

/// Lazy window iterator. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Windows {
    size: usize,
    step: usize,
    limit: usize,
    next_start: Option<usize>,
    next_index: usize,
}

impl Windows {
    fn remaining(&self) -> usize {
        if self.size == 0 || self.step == 0 {
            return 0;
        }
        let Some(start) = self.next_start else {
            return 0;
        };
        match start.checked_add(self.size) {
            Some(end) if end <= self.limit => (self.limit - end) / self.step + 1,
            _ => 0,
        }
    }
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.size == 0 || self.step == 0 {
            return None;
        }
        let start = self.next_start?;
        let fits = start
            .checked_add(self.size)
            .map(|end| end <= self.limit)
            .unwrap_or(false);
        if !fits {
            self.next_start = None;
            return None;
        }
        let window = Window {
            index: self.next_index,
            start,
            size: self.size,
        };
        self.next_start = start.checked_add(self.step);
        self.next_index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Windows {}
