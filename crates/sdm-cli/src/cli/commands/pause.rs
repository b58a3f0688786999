//! `sdm pause` – pause all in-progress downloads now.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_pause() -> Result<()> {
    let path = default_control_socket_path()?;
    let response = control_socket::send_command(&path, Command::ManualPause).await?;
    println!("Paused {} download(s)", response.count.unwrap_or(0));
    Ok(())
}
