pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod signal;
pub mod synth;
pub mod windows;

pub use detectors::*;
pub use error::*;
pub use filters::*;
pub use metrics::*;
pub use pipeline::*;
pub use signal::*;
pub use windows::*;
