//! Progress event types and callback interface.
//!
//! Defines the events emitted by the test engine so a presentation layer
//! can render live progress, and the callback trait for receiving them.

use std::fmt;

/// Phases of a simulated test run.
///
/// A run walks Initializing → Download → Upload → Latency → Advanced →
/// Complete; Failed and Cancelled are terminal and reachable from any
/// in-progress phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// No run is active
    Idle,
    /// Resetting run state before the first phase
    Initializing,
    /// Revealing the download ceiling tick by tick
    Download,
    /// Revealing the upload ceiling tick by tick
    Upload,
    /// Single-shot ping/jitter draw
    Latency,
    /// Single-shot advanced metrics draw
    Advanced,
    /// Run finished and the record was built
    Complete,
    /// Run hit a fault; nothing persisted
    Failed,
    /// Run was cancelled by the user; nothing persisted
    Cancelled,
}

impl TestPhase {
    /// Status line shown while the phase is running.
    pub fn status_text(&self) -> &'static str {
        match self {
            TestPhase::Idle => "Ready",
            TestPhase::Initializing => "Initializing test...",
            TestPhase::Download => "Testing download speed...",
            TestPhase::Upload => "Testing upload speed...",
            TestPhase::Latency => "Measuring latency...",
            TestPhase::Advanced => "Analyzing network quality...",
            TestPhase::Complete => "Test completed",
            TestPhase::Failed => "Test failed. Please try again.",
            TestPhase::Cancelled => "Test cancelled.",
        }
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The run entered a new phase
    PhaseChange(TestPhase),
    /// An instantaneous bandwidth reading within a download/upload phase
    Reading {
        /// Phase producing the reading
        phase: TestPhase,
        /// Revealed speed in Mbps
        mbps: f64,
        /// Phase-local progress in [0, 1]
        progress: f64,
    },
    /// The single-shot latency draw completed
    LatencySample {
        /// Ping in milliseconds
        ping_ms: f64,
        /// Jitter in milliseconds
        jitter_ms: f64,
    },
    /// A phase reached its endpoint; its final value is committed
    PhaseComplete(TestPhase),
    /// The whole run completed and a record was built
    RunComplete,
    /// The run failed or was cancelled
    Error(String),
}

/// Callback interface for progress updates.
///
/// Implementations must be non-blocking so they cannot stall the phase
/// timers.
pub trait ProgressCallback: Send + Sync {
    /// Called when a progress event occurs.
    fn on_progress(&self, event: ProgressEvent);
}

/// A callback that discards every event.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_progress(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_matches_phase() {
        assert_eq!(
            TestPhase::Download.status_text(),
            "Testing download speed..."
        );
        assert_eq!(TestPhase::Latency.status_text(), "Measuring latency...");
        assert_eq!(TestPhase::Complete.status_text(), "Test completed");
        assert_eq!(TestPhase::Cancelled.status_text(), "Test cancelled.");
    }

    #[test]
    fn test_display_uses_status_text() {
        assert_eq!(
            format!("{}", TestPhase::Advanced),
            "Analyzing network quality..."
        );
    }
}
