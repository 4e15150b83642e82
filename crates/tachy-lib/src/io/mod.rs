//! Sample acquisition. Everything here hands a finished [`TimeSeries`] to the pipeline and
//! reports failures as `anyhow` errors with file and field context.

pub mod csv;
pub mod quantumleap;
pub mod text;
pub mod wfdb;

use crate::signal::TimeSeries;
use anyhow::Result;

/// Anything that can produce a sample stream.
pub trait SampleSource {
    fn acquire(&self) -> Result<TimeSeries>;
}

impl<S: SampleSource + ?Sized> SampleSource for &S {
    fn acquire(&self) -> Result<TimeSeries> {
        (**self).acquire()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn acquire(&self) -> Result<TimeSeries> {
        (**self).acquire()
    }
}

pub use self::csv::CsvColumnSource;
pub use quantumleap::QuantumLeapSource;
pub use text::TextSource;
pub use wfdb::WfdbSource;
