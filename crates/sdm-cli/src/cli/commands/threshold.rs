//! `sdm threshold <mbps>` – update the Fast/Slow threshold.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_threshold(mbps: f64) -> Result<()> {
    let path = default_control_socket_path()?;
    let response =
        control_socket::send_command(&path, Command::UpdateThreshold { value: mbps }).await?;
    if !response.success {
        anyhow::bail!(
            "{}",
            response.error.unwrap_or_else(|| "threshold rejected".to_string())
        );
    }
    println!("Threshold set to {} Mbps", mbps);
    Ok(())
}
