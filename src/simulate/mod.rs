//! Test-run simulation.
//!
//! This module houses the synthetic metrics generator, the progress event
//! types, the injectable tick source, and the engine that drives a run
//! through its phases.

pub mod engine;
pub mod generator;
pub mod progress;
pub mod ticker;

pub use engine::{CancelToken, EngineConfig, RunOutcome, TestEngine};
pub use generator::RandomMetrics;
pub use progress::{NullProgress, ProgressCallback, ProgressEvent, TestPhase};
pub use ticker::IntervalTicker;
