//! `sdm run` – the monitor daemon.

use anyhow::Result;
use sdm_core::config::{self, FileSettings};
use sdm_core::controller::{self, Controller};
use sdm_core::downloads::socket::{spawn_event_listener, SocketDownloads};
use sdm_core::notify::DesktopNotifier;
use sdm_core::probe::HttpProbe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::control_socket;

pub async fn run_monitor(downloads_socket: Option<PathBuf>) -> Result<()> {
    let settings = FileSettings::default_path()?;
    let cfg = settings.load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let probe_cfg = cfg.probe.clone().unwrap_or_default();
    let probe = Arc::new(HttpProbe::new(
        probe_cfg.url.clone(),
        Duration::from_secs(probe_cfg.timeout_secs.max(1)),
        probe_cfg.interface.clone(),
    ));

    let downloads_path = match downloads_socket.or_else(|| cfg.downloads_socket.clone()) {
        Some(path) => path,
        None => config::default_downloads_socket_path()?,
    };
    let control = Arc::new(SocketDownloads::new(&downloads_path));

    let controller = Controller::new(
        cfg,
        probe,
        control,
        Arc::new(settings),
        Box::new(DesktopNotifier::new()),
    );
    let updates = controller.update_sender();

    let (cmd_tx, cmd_rx) = tokio::sync::mpsc::channel(16);
    let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);

    let control_path = config::default_control_socket_path()?;
    control_socket::spawn_command_listener(&control_path, cmd_tx, updates)?;
    tracing::debug!(path = %control_path.display(), "control socket listening");

    let _events = spawn_event_listener(&downloads_path, event_tx);

    println!("sdm monitor running (control socket {})", control_path.display());

    tokio::select! {
        res = controller::run(controller, cmd_rx, event_rx) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
    }
}
