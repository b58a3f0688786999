//! `sdm resume` – resume the downloads the monitor paused.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_resume() -> Result<()> {
    let path = default_control_socket_path()?;
    let response = control_socket::send_command(&path, Command::ManualResume).await?;
    println!("Resumed {} download(s)", response.count.unwrap_or(0));
    Ok(())
}
