//! `sdm status` – show the daemon's current state.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_status() -> Result<()> {
    let path = default_control_socket_path()?;
    let response = control_socket::send_command(&path, Command::GetStatus).await?;
    let Some(status) = response.status else {
        anyhow::bail!("daemon returned no status: {:?}", response.error);
    };

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("Enabled:    {}", yes_no(status.enabled));
    println!("Monitoring: {}", yes_no(status.monitoring));
    println!("Class:      {}", status.network_class);
    println!("Paused:     {}", status.paused_count);
    println!("Threshold:  {} Mbps", status.threshold_mbps);
    Ok(())
}
