//! HTTP throughput probe backed by the curl crate (libcurl).
//!
//! Fetches a fixed-size payload with a hard timeout and derives Mbps from
//! bytes transferred over wall time. Runs in the current thread; call from
//! `spawn_blocking` if used from async code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{interface_hint_mbps, mbps, now_ms, SpeedProbe, SpeedSample};

/// Default payload endpoint: 128 KiB of bytes, small enough for frequent checks.
pub const DEFAULT_PROBE_URL: &str = "https://httpbin.org/bytes/131072";

/// Hard ceiling on one probe transfer.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 8;

/// Probe that downloads a bounded payload over HTTP and measures throughput.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    timeout: Duration,
    /// Interface name to read a link-speed hint from (e.g. "eth0").
    interface: Option<String>,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration, interface: Option<String>) -> Self {
        Self {
            url: url.into(),
            timeout,
            interface,
        }
    }

    fn transfer(&self) -> anyhow::Result<(u64, f64)> {
        let bytes = Arc::new(AtomicU64::new(0));
        let bytes_cb = Arc::clone(&bytes);

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        // Fresh transfer every cycle: a cached response would measure nothing.
        easy.http_headers({
            let mut list = curl::easy::List::new();
            list.append("Cache-Control: no-cache")?;
            list
        })?;
        easy.connect_timeout(self.timeout)?;
        easy.timeout(self.timeout)?;

        let start = Instant::now();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(move |data| {
                bytes_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let elapsed = start.elapsed().as_secs_f64();

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            anyhow::bail!("probe GET returned HTTP {}", code);
        }

        Ok((bytes.load(Ordering::Relaxed), elapsed))
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROBE_URL,
            Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            None,
        )
    }
}

impl SpeedProbe for HttpProbe {
    fn measure(&self) -> SpeedSample {
        let hint = self.interface.as_deref().and_then(interface_hint_mbps);

        match self.transfer() {
            Ok((bytes, elapsed_secs)) => SpeedSample {
                timestamp_ms: now_ms(),
                speed_mbps: mbps(bytes, elapsed_secs),
                latency_ms: elapsed_secs * 1000.0,
                success: true,
                link_hint_mbps: hint,
            },
            Err(e) => {
                tracing::debug!("speed probe failed: {:#}", e);
                SpeedSample::failed(hint)
            }
        }
    }
}
