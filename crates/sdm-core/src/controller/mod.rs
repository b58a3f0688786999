//! Transition controller: the probe → classify → react state machine.
//!
//! Owns the configuration, the current network class, and the reactor. All
//! cycles (periodic and forced) run on the one task that owns the controller,
//! so a cycle can never overlap another and observers see reactions strictly
//! before the class they belong to.

mod run;

pub use run::{run, CommandRequest, NEW_DOWNLOAD_GRACE};

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::classify::{classify, NetworkClass};
use crate::config::{validate_threshold, Config, InvalidThreshold, SettingsStore};
use crate::downloads::{DownloadControl, DownloadEvent, DownloadId, DownloadState};
use crate::notify::Notifier;
use crate::probe::{now_ms, SpeedProbe};
use crate::reactor::DownloadReactor;
use crate::status::{Command, CommandResponse, ControllerStatus, Event};

const BADGE_SLOW_COLOR: &str = "#FF9800";
const BADGE_FAST_COLOR: &str = "#4CAF50";
const BADGE_ON_COLOR: &str = "#2196F3";

pub struct Controller {
    config: Config,
    class: NetworkClass,
    monitoring: bool,
    probe: Arc<dyn SpeedProbe>,
    reactor: DownloadReactor,
    settings: Arc<dyn SettingsStore>,
    notifier: Box<dyn Notifier>,
    updates: broadcast::Sender<Event>,
}

impl Controller {
    /// Builds a controller from injected collaborators. Nothing starts until
    /// `start()`.
    pub fn new(
        config: Config,
        probe: Arc<dyn SpeedProbe>,
        control: Arc<dyn DownloadControl>,
        settings: Arc<dyn SettingsStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            config,
            class: NetworkClass::Unknown,
            monitoring: false,
            probe,
            reactor: DownloadReactor::new(control),
            settings,
            notifier,
            updates,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_class(&self) -> NetworkClass {
        self.class
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Receiver for status-update events. Senders never error out on a
    /// missing listener; broadcasts are best-effort.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.updates.subscribe()
    }

    /// Sender handle for components that need to hand out subscriptions
    /// after the controller moved into its run loop.
    pub fn update_sender(&self) -> broadcast::Sender<Event> {
        self.updates.clone()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            enabled: self.config.enabled,
            monitoring: self.monitoring,
            network_class: self.class,
            paused_count: self.reactor.managed_count(),
            threshold_mbps: self.config.threshold_mbps,
        }
    }

    /// Begins monitoring (if enabled) with one immediate classification
    /// cycle; the periodic cadence is the run loop's ticker.
    pub async fn start(&mut self) {
        if !self.config.enabled {
            return;
        }
        self.monitoring = true;
        tracing::info!(threshold = self.config.threshold_mbps, "speed monitoring started");
        self.run_cycle().await;
    }

    /// Stops monitoring. Leaves `current_class` untouched.
    pub fn stop(&mut self) {
        self.monitoring = false;
        tracing::info!("speed monitoring stopped");
    }

    /// Enables or disables the whole feature. Disabling force-resumes every
    /// managed download so nothing is left stuck paused.
    pub async fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.persist().await;
        if enabled {
            self.notifier.set_badge("ON", BADGE_ON_COLOR);
            self.start().await;
        } else {
            self.stop();
            let resumed = self.reactor.resume_all().await;
            if resumed > 0 {
                tracing::info!(resumed, "resumed downloads on disable");
            }
            self.notifier.clear_badge();
        }
    }

    pub async fn toggle_enabled(&mut self) -> bool {
        let enabled = !self.config.enabled;
        self.set_enabled(enabled).await;
        enabled
    }

    /// Applies a new threshold for subsequent cycles. Rejects non-positive
    /// values; the prior configuration stays in effect then.
    pub async fn set_threshold(&mut self, value: f64) -> Result<(), InvalidThreshold> {
        validate_threshold(value)?;
        self.config.threshold_mbps = value;
        self.persist().await;
        tracing::info!(threshold = value, "threshold updated");
        Ok(())
    }

    /// One classification cycle outside the periodic cadence.
    pub async fn force_check(&mut self) {
        self.run_cycle().await;
    }

    /// One probe → classify → react cycle. Never fails: a probe that yields
    /// no usable signal carries no new information and leaves the class (and
    /// the managed set) exactly as they were.
    pub async fn run_cycle(&mut self) {
        let probe = Arc::clone(&self.probe);
        let sample = match tokio::task::spawn_blocking(move || probe.measure()).await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("probe task failed: {}", e);
                return;
            }
        };

        if !sample.success && sample.link_hint_mbps.filter(|v| *v > 0.0).is_none() {
            tracing::debug!("probe failed with no link hint; keeping class {}", self.class);
            return;
        }

        let new_class = classify(&sample, self.config.threshold_mbps);
        tracing::debug!(
            speed = sample.speed_mbps,
            latency_ms = sample.latency_ms,
            class = %new_class,
            "cycle classified"
        );

        if new_class != self.class {
            let old = self.class;
            tracing::info!(%old, new = %new_class, "network class changed");
            self.react(old, new_class).await;
            self.class = new_class;
        }
    }

    /// Reaction side effects for a class change, dispatched before the state
    /// field is updated by the caller.
    async fn react(&mut self, old: NetworkClass, new: NetworkClass) {
        match new {
            NetworkClass::Slow if old != NetworkClass::Slow => {
                let paused = self.reactor.pause_all().await;
                self.notifier
                    .notify(&format!("Downloads paused - slow network ({paused} downloads)"));
                self.notifier.set_badge("SLOW", BADGE_SLOW_COLOR);
            }
            NetworkClass::Fast if old != NetworkClass::Fast => {
                let resumed = self.reactor.resume_all().await;
                self.notifier
                    .notify(&format!("Downloads resumed - fast network ({resumed} downloads)"));
                self.notifier.set_badge("FAST", BADGE_FAST_COLOR);
            }
            _ => return,
        }

        // Best-effort: no listener is not an error.
        let _ = self.updates.send(Event::StatusUpdate {
            network_class: new,
            paused_count: self.reactor.managed_count(),
        });
    }

    /// Command surface consumed by the control socket.
    pub async fn handle_command(&mut self, cmd: Command) -> CommandResponse {
        match cmd {
            Command::Ping => CommandResponse::ok().with_timestamp(now_ms()),
            Command::GetStatus => CommandResponse::ok().with_status(self.status()),
            Command::ToggleEnabled => {
                let enabled = self.toggle_enabled().await;
                CommandResponse::ok().with_enabled(enabled)
            }
            Command::UpdateThreshold { value } => match self.set_threshold(value).await {
                Ok(()) => CommandResponse::ok().with_threshold(value),
                Err(e) => CommandResponse::err(e.to_string()),
            },
            Command::ManualPause => {
                let count = self.reactor.pause_all().await;
                CommandResponse::ok().with_count(count)
            }
            Command::ManualResume => {
                let count = self.reactor.resume_all().await;
                CommandResponse::ok().with_count(count)
            }
            Command::ForceCheck => {
                self.force_check().await;
                CommandResponse::ok().with_class(self.class)
            }
        }
    }

    /// Routes an external download event. New downloads observed while the
    /// network is slow get a deferred pause via `defer_tx` (the grace delay
    /// lets the download initialize before we touch it).
    pub fn handle_event(&mut self, event: DownloadEvent, defer_tx: &tokio::sync::mpsc::Sender<DownloadId>) {
        match event {
            DownloadEvent::Created(id) => {
                if self.config.enabled && self.class == NetworkClass::Slow {
                    let tx = defer_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(NEW_DOWNLOAD_GRACE).await;
                        let _ = tx.send(id).await;
                    });
                }
            }
            DownloadEvent::Changed(id, state) => self.handle_state_change(id, state),
        }
    }

    /// External state change for one download; terminal states drop it from
    /// the managed set without a resume call.
    pub fn handle_state_change(&mut self, id: DownloadId, state: DownloadState) {
        self.reactor.on_state_change(id, state);
    }

    /// Deferred pause for a new download, after the grace delay. The class
    /// may have flipped meanwhile, so the guard is re-checked here.
    pub async fn pause_new_download(&mut self, id: DownloadId) {
        if !self.config.enabled || self.class != NetworkClass::Slow {
            return;
        }
        if self.reactor.pause_new(id).await {
            self.notifier.notify("New download paused - slow network");
        }
    }

    /// Writes the config on the blocking pool; the in-memory value stays
    /// authoritative if the write fails.
    async fn persist(&self) {
        let settings = Arc::clone(&self.settings);
        let cfg = self.config.clone();
        match tokio::task::spawn_blocking(move || settings.save(&cfg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("settings save failed (keeping in-memory value): {:#}", e);
            }
            Err(e) => tracing::warn!("settings save task failed: {}", e),
        }
    }
}
