//! Network class and the threshold classifier.
//!
//! One discrete verdict per sampling cycle: `Fast` when there is evidence of
//! throughput above the configured threshold, `Slow` otherwise. With no valid
//! signal at all the classifier fails toward `Slow`, since nothing suggests a
//! fast link.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::probe::SpeedSample;

/// Discrete network-quality verdict the controller acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkClass {
    Fast,
    Slow,
    #[default]
    Unknown,
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkClass::Fast => write!(f, "fast"),
            NetworkClass::Slow => write!(f, "slow"),
            NetworkClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classifies one sample against a threshold in Mbps.
///
/// Decision value priority: a successful measurement wins over the interface
/// link hint; with neither present the result is `Slow`. The comparison is a
/// strict `>`, so a sample exactly at the threshold classifies as `Slow`.
pub fn classify(sample: &SpeedSample, threshold_mbps: f64) -> NetworkClass {
    let value = if sample.success && sample.speed_mbps > 0.0 {
        sample.speed_mbps
    } else if let Some(hint) = sample.link_hint_mbps.filter(|v| *v > 0.0) {
        hint
    } else {
        return NetworkClass::Slow;
    };

    if value > threshold_mbps {
        NetworkClass::Fast
    } else {
        NetworkClass::Slow
    }
}
