//! Throughput probing.
//!
//! One bounded transfer per sampling cycle; the result is a `SpeedSample`
//! that is either a real measurement or an explicit failure marker. A failed
//! probe is never an error to the caller — it carries no new information and
//! the sampling loop simply tries again next cycle.

mod http;
mod link;

pub use http::{HttpProbe, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_PROBE_URL};
pub use link::interface_hint_mbps;

use std::time::{SystemTime, UNIX_EPOCH};

/// Latency recorded on a failed probe, standing in for "timed out".
pub const FAILED_LATENCY_MS: f64 = 999.0;

/// One throughput measurement. Immutable once produced; not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSample {
    /// Wall-clock time the sample was taken, in ms since the Unix epoch.
    pub timestamp_ms: u64,
    /// Measured throughput in Mbps; 0 when the probe failed.
    pub speed_mbps: f64,
    /// Total transfer time in ms, or `FAILED_LATENCY_MS` on failure.
    pub latency_ms: f64,
    /// False when the transfer timed out, errored, or returned non-2xx.
    pub success: bool,
    /// Link speed reported by the network interface, if configured/available.
    pub link_hint_mbps: Option<f64>,
}

impl SpeedSample {
    /// Failure marker: zero speed, ceiling latency, optional link hint kept
    /// so the classifier can still fall back on it.
    pub fn failed(link_hint_mbps: Option<f64>) -> Self {
        Self {
            timestamp_ms: now_ms(),
            speed_mbps: 0.0,
            latency_ms: FAILED_LATENCY_MS,
            success: false,
            link_hint_mbps,
        }
    }
}

/// Performs one throughput measurement. Blocking; the controller runs it
/// under `spawn_blocking`. Implementations must not retry internally — the
/// sampling loop is the retry cadence.
pub trait SpeedProbe: Send + Sync {
    fn measure(&self) -> SpeedSample;
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Throughput in Mbps for `bytes` transferred over `elapsed_secs`.
pub(crate) fn mbps(bytes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / elapsed_secs / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mbps_formula() {
        // 131072 bytes in 1s = 1.048576 Mbps.
        assert!((mbps(131_072, 1.0) - 1.048_576).abs() < 1e-9);
        // Twice as fast when done in half the time.
        assert!((mbps(131_072, 0.5) - 2.097_152).abs() < 1e-9);
    }

    #[test]
    fn mbps_zero_elapsed_is_zero() {
        assert_eq!(mbps(131_072, 0.0), 0.0);
    }

    #[test]
    fn failed_sample_shape() {
        let s = SpeedSample::failed(Some(100.0));
        assert!(!s.success);
        assert_eq!(s.speed_mbps, 0.0);
        assert_eq!(s.latency_ms, FAILED_LATENCY_MS);
        assert_eq!(s.link_hint_mbps, Some(100.0));
    }
}
