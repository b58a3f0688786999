//! `sdm check` – run one classification cycle immediately.

use anyhow::Result;
use sdm_core::config::default_control_socket_path;
use sdm_core::status::Command;

use crate::cli::control_socket;

pub async fn run_check() -> Result<()> {
    let path = default_control_socket_path()?;
    let response = control_socket::send_command(&path, Command::ForceCheck).await?;
    match response.network_class {
        Some(class) => println!("Network class: {}", class),
        None => anyhow::bail!("check failed: {:?}", response.error),
    }
    Ok(())
}
