//! The test engine that drives a simulated run through its phases.
//!
//! A run is a strictly sequential state machine: Initializing, then the
//! tick-driven Download and Upload phases, then the single-shot Latency
//! and Advanced phases. Each phase's final value is committed before the
//! next phase starts. On completion the engine rates the
//! run once, builds a [`TestRecord`], and appends it to the history store;
//! a failed or cancelled run persists nothing.

use crate::errors::{Result, SpeedTestError};
use crate::history::HistoryStore;
use crate::rating;
use crate::results::{RunResults, TestRecord};
use crate::simulate::generator::{self, MetricsSource};
use crate::simulate::progress::{ProgressCallback, ProgressEvent, TestPhase};
use crate::simulate::ticker::Ticker;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the test engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of readings in the download phase.
    /// Default: 50
    pub download_ticks: usize,

    /// Number of readings in the upload phase.
    /// Default: 50
    pub upload_ticks: usize,

    /// Delay before the first phase starts.
    /// Default: 1s
    pub init_delay: Duration,

    /// Delay for the single-shot latency phase.
    /// Default: 1s
    pub latency_delay: Duration,

    /// Delay for the single-shot advanced-metrics phase.
    /// Default: 1.5s
    pub advanced_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_ticks: 50,
            upload_ticks: 50,
            init_delay: Duration::from_secs(1),
            latency_delay: Duration::from_secs(1),
            advanced_delay: Duration::from_millis(1500),
        }
    }
}

/// Cooperative cancellation handle for an in-flight run.
///
/// The engine checks the token between ticks, so a cancelled run stops at
/// the next suspension point and no stale timer can write into a later
/// phase's state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run holding this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Transient state of the active run, owned by the engine for its duration.
/// The committed metric values live in locals; only the phase needs to be
/// shared with the cancellation path.
#[derive(Debug, Clone)]
struct RunState {
    phase: TestPhase,
}

impl RunState {
    fn new() -> Self {
        Self { phase: TestPhase::Idle }
    }

    fn enter(&mut self, phase: TestPhase, callback: &dyn ProgressCallback) {
        self.phase = phase;
        callback.on_progress(ProgressEvent::PhaseChange(phase));
    }
}

/// How a run ended when no error occurred.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run walked every phase; results were built and persisted.
    Completed(Box<RunResults>),
    /// The run was cancelled mid-flight; nothing was persisted.
    Cancelled,
}

/// Resets the engine's active flag when a run finishes, errors, or is
/// dropped mid-flight.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The engine that orchestrates a simulated speed test.
///
/// At most one run may be active per engine; starting a second run while
/// one is in flight is rejected with a non-fatal `RunActive` error.
pub struct TestEngine {
    config: EngineConfig,
    active: AtomicBool,
}

impl TestEngine {
    /// Create a new test engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config, active: AtomicBool::new(false) }
    }

    /// Run the complete simulated test sequence.
    ///
    /// Phases execute strictly in order; the ticker paces the readings and
    /// the cancel token is honored at every suspension point. When a store
    /// is given, the completed record is appended before returning, and an
    /// append failure surfaces as a storage error.
    pub async fn run<T: Ticker>(
        &self,
        source: &mut dyn MetricsSource,
        ticker: &mut T,
        store: Option<&HistoryStore>,
        cancel: &CancelToken,
        callback: &dyn ProgressCallback,
    ) -> Result<RunOutcome> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(SpeedTestError::run_active());
        }
        let _guard = ActiveGuard(&self.active);

        info!("starting simulated speed test");
        let mut state = RunState::new();

        state.enter(TestPhase::Initializing, callback);
        let connection_type = source.connection_type();
        let server_location = source.server_location();
        debug!(
            "simulating {} via {}",
            connection_type, server_location
        );
        ticker.delay(self.config.init_delay).await;
        if let Some(outcome) = self.check_cancel(cancel, &mut state, callback) {
            return Ok(outcome);
        }

        // Download phase
        state.enter(TestPhase::Download, callback);
        let download_ceiling = source.download_ceiling();
        debug!("download ceiling drawn: {:.1} Mbps", download_ceiling);
        if let Some(outcome) = self
            .run_bandwidth_phase(
                TestPhase::Download,
                download_ceiling,
                self.config.download_ticks,
                generator::reveal_download,
                ticker,
                cancel,
                &mut state,
                callback,
            )
            .await?
        {
            return Ok(outcome);
        }
        callback.on_progress(ProgressEvent::PhaseComplete(TestPhase::Download));
        info!("download: {:.1} Mbps", download_ceiling);

        // Upload phase
        state.enter(TestPhase::Upload, callback);
        let upload_ceiling = source.upload_ceiling(download_ceiling);
        debug!("upload ceiling drawn: {:.1} Mbps", upload_ceiling);
        if let Some(outcome) = self
            .run_bandwidth_phase(
                TestPhase::Upload,
                upload_ceiling,
                self.config.upload_ticks,
                generator::reveal_upload,
                ticker,
                cancel,
                &mut state,
                callback,
            )
            .await?
        {
            return Ok(outcome);
        }
        callback.on_progress(ProgressEvent::PhaseComplete(TestPhase::Upload));
        info!("upload: {:.1} Mbps", upload_ceiling);

        // Latency phase (single-shot)
        state.enter(TestPhase::Latency, callback);
        ticker.delay(self.config.latency_delay).await;
        if let Some(outcome) = self.check_cancel(cancel, &mut state, callback) {
            return Ok(outcome);
        }
        let latency = source.latency(download_ceiling);
        callback.on_progress(ProgressEvent::LatencySample {
            ping_ms: latency.ping_ms,
            jitter_ms: latency.jitter_ms,
        });
        callback.on_progress(ProgressEvent::PhaseComplete(TestPhase::Latency));
        info!(
            "latency: {:.1} ms ping, {:.1} ms jitter",
            latency.ping_ms, latency.jitter_ms
        );

        // Advanced phase (single-shot)
        state.enter(TestPhase::Advanced, callback);
        ticker.delay(self.config.advanced_delay).await;
        if let Some(outcome) = self.check_cancel(cancel, &mut state, callback) {
            return Ok(outcome);
        }
        let advanced = source.advanced(latency.jitter_ms);
        callback.on_progress(ProgressEvent::PhaseComplete(TestPhase::Advanced));
        debug!(
            "advanced: {:.2}% loss, {} stability, {:.1} ms dns",
            advanced.packet_loss_pct,
            advanced.latency_stability,
            advanced.dns_response_ms
        );

        // Rate once with the final download/ping and build the record
        let assessment = rating::rate(download_ceiling, latency.ping_ms);
        let record = TestRecord::new(
            download_ceiling,
            upload_ceiling,
            latency.ping_ms,
            latency.jitter_ms,
            assessment.rating,
            connection_type.to_string(),
            server_location.to_string(),
        );

        if let Some(store) = store {
            match store.append(&record) {
                Ok(len) => {
                    debug!("record persisted, history holds {}", len);
                    if store.is_near_capacity().unwrap_or(false) {
                        warn!(
                            "history list is getting full ({} records); consider clearing some",
                            len
                        );
                    }
                }
                Err(e) => {
                    callback
                        .on_progress(ProgressEvent::Error(e.message.clone()));
                    return Err(e);
                }
            }
        }

        callback.on_progress(ProgressEvent::PhaseChange(TestPhase::Complete));
        callback.on_progress(ProgressEvent::RunComplete);
        info!(
            "run complete: {} ({})",
            assessment.rating.label(),
            assessment.rating.description()
        );

        Ok(RunOutcome::Completed(Box::new(RunResults {
            record,
            assessment,
            advanced,
        })))
    }

    /// Drive one tick-paced bandwidth phase to progress 1.
    ///
    /// Returns `Ok(Some(Cancelled))` if the run was cancelled mid-phase.
    #[allow(clippy::too_many_arguments)]
    async fn run_bandwidth_phase<T: Ticker>(
        &self,
        phase: TestPhase,
        ceiling_mbps: f64,
        ticks: usize,
        reveal: fn(f64, f64) -> f64,
        ticker: &mut T,
        cancel: &CancelToken,
        state: &mut RunState,
        callback: &dyn ProgressCallback,
    ) -> Result<Option<RunOutcome>> {
        if ticks == 0 {
            return Err(SpeedTestError::config(
                "bandwidth phases need at least one tick",
            ));
        }

        for i in 1..=ticks {
            ticker.tick().await;
            if let Some(outcome) = self.check_cancel(cancel, state, callback) {
                return Ok(Some(outcome));
            }

            let t = i as f64 / ticks as f64;
            let mbps = reveal(ceiling_mbps, t);
            callback.on_progress(ProgressEvent::Reading {
                phase,
                mbps,
                progress: t,
            });
        }

        Ok(None)
    }

    /// Transition to Cancelled and report it if cancellation was requested.
    fn check_cancel(
        &self,
        cancel: &CancelToken,
        state: &mut RunState,
        callback: &dyn ProgressCallback,
    ) -> Option<RunOutcome> {
        if !cancel.is_cancelled() {
            return None;
        }

        warn!("test run cancelled in phase {:?}", state.phase);
        state.phase = TestPhase::Cancelled;
        callback.on_progress(ProgressEvent::PhaseChange(TestPhase::Cancelled));
        Some(RunOutcome::Cancelled)
    }
}
