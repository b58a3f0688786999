//! `sdm watch` – stream status updates from the daemon.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Event;

use crate::cli::control_socket;

pub async fn run_watch() -> Result<()> {
    let path = default_control_socket_path()?;
    println!("Watching for status updates (Ctrl-C to stop)...");
    control_socket::watch_updates(&path, |event| {
        let Event::StatusUpdate {
            network_class,
            paused_count,
        } = event;
        println!("class={} paused={}", network_class, paused_count);
    })
    .await
}
