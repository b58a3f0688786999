//! Link-speed hint from the kernel.
//!
//! `/sys/class/net/<iface>/speed` reports negotiated link speed in Mbps.
//! Wireless and down interfaces report `-1` (or the file is unreadable);
//! both mean "no hint".

use std::path::Path;

/// Reads the negotiated link speed for `iface` in Mbps, if available.
pub fn interface_hint_mbps(iface: &str) -> Option<f64> {
    // Interface names never contain path separators; refuse anything odd.
    if iface.is_empty() || iface.contains('/') {
        return None;
    }
    let path = Path::new("/sys/class/net").join(iface).join("speed");
    let contents = std::fs::read_to_string(path).ok()?;
    parse_speed(&contents)
}

fn parse_speed(contents: &str) -> Option<f64> {
    let speed: i64 = contents.trim().parse().ok()?;
    if speed > 0 {
        Some(speed as f64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_speed() {
        assert_eq!(parse_speed("1000\n"), Some(1000.0));
        assert_eq!(parse_speed("100"), Some(100.0));
    }

    #[test]
    fn negative_or_garbage_is_none() {
        assert_eq!(parse_speed("-1\n"), None);
        assert_eq!(parse_speed("0"), None);
        assert_eq!(parse_speed("unknown"), None);
    }

    #[test]
    fn rejects_suspicious_interface_names() {
        assert_eq!(interface_hint_mbps(""), None);
        assert_eq!(interface_hint_mbps("../etc"), None);
    }
}
