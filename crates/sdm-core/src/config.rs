use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Default Fast/Slow threshold in Mbps.
pub const DEFAULT_THRESHOLD_MBPS: f64 = 0.7;

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Probe parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Fixed-size payload endpoint to download each cycle.
    pub url: String,
    /// Hard timeout per probe transfer, in seconds.
    pub timeout_secs: u64,
    /// Network interface to read a link-speed hint from (e.g. "eth0").
    #[serde(default)]
    pub interface: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: crate::probe::DEFAULT_PROBE_URL.to_string(),
            timeout_secs: crate::probe::DEFAULT_PROBE_TIMEOUT_SECS,
            interface: None,
        }
    }
}

/// Global configuration loaded from `~/.config/sdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Whether speed-based pause/resume is active at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Throughput separating Fast from Slow, in Mbps. Must be > 0.
    #[serde(default = "default_threshold")]
    pub threshold_mbps: f64,
    /// Seconds between classification cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Optional probe overrides; built-in defaults if missing.
    #[serde(default)]
    pub probe: Option<ProbeConfig>,
    /// Override for the download manager's control socket path.
    #[serde(default)]
    pub downloads_socket: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_MBPS
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_mbps: DEFAULT_THRESHOLD_MBPS,
            interval_secs: DEFAULT_INTERVAL_SECS,
            probe: None,
            downloads_socket: None,
        }
    }
}

/// Error returned when a threshold update is rejected. The prior
/// configuration stays in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidThreshold(pub f64);

impl fmt::Display for InvalidThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid threshold {} Mbps: must be greater than 0", self.0)
    }
}

impl std::error::Error for InvalidThreshold {}

/// Validates a proposed threshold value. Rejects zero, negatives, and NaN.
pub fn validate_threshold(v: f64) -> Result<(), InvalidThreshold> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(InvalidThreshold(v))
    }
}

/// Settings persistence collaborator. Writes run on the blocking pool, so
/// implementations are shared handles. A write failure is recoverable: the
/// in-memory value still applies for the current session.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn save(&self, cfg: &Config) -> Result<()>;
}

/// Settings stored as TOML under the XDG config dir.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<Self> {
        Ok(Self::new(config_path()?))
    }

    /// Load configuration from disk, creating a default file if none exists.
    pub fn load_or_init(&self) -> Result<Config> {
        if !self.path.exists() {
            let default_cfg = Config::default();
            self.save(&default_cfg)?;
            tracing::info!("created default config at {}", self.path.display());
            return Ok(default_cfg);
        }
        let data = fs::read_to_string(&self.path)?;
        let cfg: Config = toml::from_str(&data)?;
        Ok(cfg)
    }
}

impl SettingsStore for FileSettings {
    fn load(&self) -> Result<Config> {
        self.load_or_init()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        let toml = toml::to_string_pretty(cfg)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml)?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// XDG state dir shared by the log file, badge file, and sockets.
pub fn state_dir() -> std::io::Result<PathBuf> {
    Ok(xdg::BaseDirectories::with_prefix("sdm")?.get_state_home())
}

/// Default path for the daemon's own command socket.
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    Ok(state_dir()?.join("control.sock"))
}

/// Default path for the external download manager's socket.
pub fn default_downloads_socket_path() -> std::io::Result<PathBuf> {
    Ok(state_dir()?.join("downloads.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert!(cfg.enabled);
        assert!((cfg.threshold_mbps - 0.7).abs() < 1e-9);
        assert_eq!(cfg.interval_secs, 5);
        assert!(cfg.probe.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = Config::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.enabled, cfg.enabled);
        assert!((parsed.threshold_mbps - cfg.threshold_mbps).abs() < 1e-9);
        assert_eq!(parsed.interval_secs, cfg.interval_secs);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let cfg: Config = toml::from_str("threshold_mbps = 2.5").unwrap();
        assert!(cfg.enabled);
        assert!((cfg.threshold_mbps - 2.5).abs() < 1e-9);
        assert_eq!(cfg.interval_secs, 5);
    }

    #[test]
    fn config_toml_probe_section() {
        let toml = r#"
            enabled = false
            threshold_mbps = 1.0

            [probe]
            url = "https://example.com/128k"
            timeout_secs = 4
            interface = "eth0"
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert!(!cfg.enabled);
        let probe = cfg.probe.as_ref().unwrap();
        assert_eq!(probe.url, "https://example.com/128k");
        assert_eq!(probe.timeout_secs, 4);
        assert_eq!(probe.interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn threshold_validation() {
        assert!(validate_threshold(0.7).is_ok());
        assert!(validate_threshold(0.001).is_ok());
        assert_eq!(validate_threshold(0.0), Err(InvalidThreshold(0.0)));
        assert_eq!(validate_threshold(-1.5), Err(InvalidThreshold(-1.5)));
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn file_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettings::new(dir.path().join("config.toml"));
        // First load creates the default file.
        let cfg = store.load_or_init().unwrap();
        assert!(cfg.enabled);
        let mut changed = cfg;
        changed.threshold_mbps = 3.0;
        changed.enabled = false;
        store.save(&changed).unwrap();
        let reloaded = store.load().unwrap();
        assert!(!reloaded.enabled);
        assert!((reloaded.threshold_mbps - 3.0).abs() < 1e-9);
    }
}
