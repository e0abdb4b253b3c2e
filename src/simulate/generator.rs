//! Synthetic metrics generation.
//!
//! Each phase's headline number is drawn once per run (the "ceiling") and
//! then revealed progressively by a smoothing curve of the phase progress,
//! so the live readings ramp convincingly and still converge to exactly the
//! drawn ceiling. Ping and jitter are single-shot draws whose ranges depend
//! on the download tier, and the advanced metrics are cosmetic derivations
//! that never reach the persisted record.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Download ceilings are drawn uniformly from this range (Mbps).
pub const DOWNLOAD_CEILING_MBPS: (f64, f64) = (10.0, 100.0);

/// Upload ceilings are the download ceiling scaled by a ratio from this
/// range; uploads stay below downloads.
pub const UPLOAD_RATIO: (f64, f64) = (0.3, 0.7);

/// Simulated connection labels, one drawn per run.
pub const CONNECTION_TYPES: [&str; 5] =
    ["5G+", "Fiber Optic", "Quantum Link", "Neural Net", "Satellite+"];

/// Simulated server labels, one drawn per run.
pub const SERVER_LOCATIONS: [&str; 4] = [
    "Quantum Node Alpha",
    "Orbital Station 9",
    "Lunar Data Center",
    "Neural Hub 42",
];

/// Latency-stability labels, indexed by jitter bucket (best first).
const STABILITY_LABELS: [&str; 4] =
    ["Excellent", "Very Good", "Good", "Average"];

/// Single-shot ping/jitter draw for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    /// Ping in milliseconds
    pub ping_ms: f64,
    /// Jitter in milliseconds
    pub jitter_ms: f64,
}

/// Cosmetic metrics from the advanced phase; reported but never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdvancedMetrics {
    /// Packet loss percentage in [0, 0.5]
    pub packet_loss_pct: f64,
    /// Discrete stability label bucketed from the jitter magnitude
    pub latency_stability: &'static str,
    /// DNS response time in milliseconds, in [5, 20]
    pub dns_response_ms: f64,
}

/// Cubic-Bezier-like smoothing factor over progress `t ∈ [0, 1]`.
///
/// `3(1-t)²t + 3(1-t)t² + t³` collapses to `1 - (1-t)³`, so the factor
/// runs from 0.3 at t = 0 to exactly 1.0 at t = 1.
fn bezier_factor(t: f64) -> f64 {
    let eased = 3.0 * (1.0 - t).powi(2) * t
        + 3.0 * (1.0 - t) * t.powi(2)
        + t.powi(3);
    0.3 + 0.7 * eased
}

/// Instantaneous download reading at progress `t`.
///
/// Reaches exactly `ceiling` at t = 1.
pub fn reveal_download(ceiling_mbps: f64, t: f64) -> f64 {
    ceiling_mbps * bezier_factor(t) * t
}

/// Instantaneous upload reading at progress `t`.
///
/// The upload curve applies a progress floor of 0.1 so the gauge never
/// idles at zero; it still reaches exactly `ceiling` at t = 1.
pub fn reveal_upload(ceiling_mbps: f64, t: f64) -> f64 {
    ceiling_mbps * bezier_factor(t) * t.max(0.1)
}

/// Draw the download ceiling for a run, uniform in [10, 100] Mbps.
pub fn draw_download_ceiling<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(DOWNLOAD_CEILING_MBPS.0..=DOWNLOAD_CEILING_MBPS.1)
}

/// Draw the upload ceiling as a fraction of the download ceiling.
pub fn draw_upload_ceiling<R: Rng + ?Sized>(
    rng: &mut R,
    download_mbps: f64,
) -> f64 {
    download_mbps * rng.gen_range(UPLOAD_RATIO.0..=UPLOAD_RATIO.1)
}

/// Draw ping and jitter, with ranges tiered by the download ceiling.
pub fn draw_latency<R: Rng + ?Sized>(
    rng: &mut R,
    download_mbps: f64,
) -> LatencySample {
    let (ping_ms, jitter_ms) = if download_mbps > 50.0 {
        (rng.gen_range(1.0..=11.0), rng.gen_range(0.1..=2.1))
    } else if download_mbps > 20.0 {
        (rng.gen_range(8.0..=23.0), rng.gen_range(0.5..=3.5))
    } else {
        (rng.gen_range(15.0..=40.0), rng.gen_range(1.0..=6.0))
    };

    LatencySample { ping_ms, jitter_ms }
}

/// Draw the cosmetic advanced metrics.
pub fn draw_advanced<R: Rng + ?Sized>(
    rng: &mut R,
    jitter_ms: f64,
) -> AdvancedMetrics {
    let bucket = ((jitter_ms / 2.0).floor() as usize)
        .min(STABILITY_LABELS.len() - 1);

    AdvancedMetrics {
        packet_loss_pct: rng.gen_range(0.0..=0.5),
        latency_stability: STABILITY_LABELS[bucket],
        dns_response_ms: rng.gen_range(5.0..=20.0),
    }
}

/// Draw a simulated connection-type label.
pub fn draw_connection_type<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CONNECTION_TYPES.choose(rng).copied().unwrap_or(CONNECTION_TYPES[0])
}

/// Draw a simulated server-location label.
pub fn draw_server_location<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SERVER_LOCATIONS.choose(rng).copied().unwrap_or(SERVER_LOCATIONS[0])
}

/// Source of per-run metric draws.
///
/// The engine consumes this seam instead of a raw RNG so tests can script
/// exact metric values while production uses [`RandomMetrics`].
pub trait MetricsSource: Send {
    /// The download ceiling for this run (Mbps).
    fn download_ceiling(&mut self) -> f64;
    /// The upload ceiling for this run (Mbps), given the download ceiling.
    fn upload_ceiling(&mut self, download_mbps: f64) -> f64;
    /// The single-shot ping/jitter draw.
    fn latency(&mut self, download_mbps: f64) -> LatencySample;
    /// The single-shot advanced-metrics draw.
    fn advanced(&mut self, jitter_ms: f64) -> AdvancedMetrics;
    /// Connection-type label for this run.
    fn connection_type(&mut self) -> &'static str;
    /// Server-location label for this run.
    fn server_location(&mut self) -> &'static str;
}

/// The production metrics source: uniform draws from an owned RNG.
pub struct RandomMetrics<R: Rng + Send> {
    rng: R,
}

impl<R: Rng + Send> RandomMetrics<R> {
    /// Wrap an RNG as a metrics source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> MetricsSource for RandomMetrics<R> {
    fn download_ceiling(&mut self) -> f64 {
        draw_download_ceiling(&mut self.rng)
    }

    fn upload_ceiling(&mut self, download_mbps: f64) -> f64 {
        draw_upload_ceiling(&mut self.rng, download_mbps)
    }

    fn latency(&mut self, download_mbps: f64) -> LatencySample {
        draw_latency(&mut self.rng, download_mbps)
    }

    fn advanced(&mut self, jitter_ms: f64) -> AdvancedMetrics {
        draw_advanced(&mut self.rng, jitter_ms)
    }

    fn connection_type(&mut self) -> &'static str {
        draw_connection_type(&mut self.rng)
    }

    fn server_location(&mut self) -> &'static str {
        draw_server_location(&mut self.rng)
    }
}
