//! Injectable tick sources for the phase timers.
//!
//! The engine never touches the wall clock directly; it awaits a
//! [`Ticker`] between readings so phase logic stays testable without real
//! delays.

use std::future::Future;
use std::time::Duration;

/// Source of the delays that pace a run.
///
/// The returned futures are `Send` so a run can be driven from a spawned
/// task.
pub trait Ticker: Send {
    /// Wait one tick interval between bandwidth readings.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;

    /// Wait out a single-shot phase delay.
    fn delay(&mut self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production ticker backed by the tokio clock.
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    /// Tick at a fixed interval between readings.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(self.interval)
    }

    fn delay(&mut self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Test ticker that resolves immediately, yielding to the scheduler so
/// cancellation still gets a chance to land between ticks.
pub struct InstantTicker;

impl Ticker for InstantTicker {
    fn tick(&mut self) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }

    fn delay(&mut self, _duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}
