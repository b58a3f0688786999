//! `sdm toggle` – flip the enabled flag.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_toggle() -> Result<()> {
    let path = default_control_socket_path()?;
    let response = control_socket::send_command(&path, Command::ToggleEnabled).await?;
    match response.enabled {
        Some(true) => println!("Speed-based pause/resume enabled."),
        Some(false) => println!("Speed-based pause/resume disabled."),
        None => anyhow::bail!("toggle failed: {:?}", response.error),
    }
    Ok(())
}
