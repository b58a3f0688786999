//! Notification/badge collaborator: strictly fire-and-forget.
//!
//! Nothing here may fail the caller; a missing notification daemon or an
//! unwritable state dir is logged at debug and otherwise ignored.

use std::path::PathBuf;
use std::process::{Command, Stdio};

pub trait Notifier: Send + Sync {
    /// Shows a user-facing notification.
    fn notify(&self, text: &str);
    /// Sets the status indicator (short text plus a color hex code).
    fn set_badge(&self, text: &str, color: &str);
    /// Clears the status indicator.
    fn clear_badge(&self);
}

/// Desktop notifier: `notify-send` for notifications, badge state mirrored
/// to a file under the XDG state dir so an external indicator can poll it.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    badge_path: Option<PathBuf>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let badge_path = crate::config::state_dir().ok().map(|d| d.join("badge"));
        Self { badge_path }
    }

    fn write_badge(&self, contents: &str) {
        let Some(path) = &self.badge_path else { return };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(path, contents) {
            tracing::debug!("badge write failed: {}", e);
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, text: &str) {
        tracing::info!("notification: {}", text);
        let spawned = Command::new("notify-send")
            .arg("Smart Download Manager")
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                // Collect the exit status off-thread; an unwaited child
                // would linger as a zombie.
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => tracing::debug!("notify-send unavailable: {}", e),
        }
    }

    fn set_badge(&self, text: &str, color: &str) {
        self.write_badge(&format!("{} {}\n", text, color));
    }

    fn clear_badge(&self) {
        self.write_badge("");
    }
}

/// Notifier that only logs. Used in tests and headless setups.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str) {
        tracing::info!("notification: {}", text);
    }

    fn set_badge(&self, text: &str, color: &str) {
        tracing::debug!("badge: {} ({})", text, color);
    }

    fn clear_badge(&self) {
        tracing::debug!("badge cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    /// Counts direct children of this process sitting in the zombie state.
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return 0;
        };
        let mut zombies = 0;
        for entry in entries.flatten() {
            let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            // "pid (comm) state ppid ..."; comm may itself contain spaces.
            let Some(rest) = stat.rfind(')').map(|i| &stat[i + 1..]) else {
                continue;
            };
            let mut fields = rest.split_whitespace();
            let state = fields.next();
            let ppid = fields.next();
            if state == Some("Z") && ppid == Some(me.as_str()) {
                zombies += 1;
            }
        }
        zombies
    }

    #[test]
    fn finished_notify_commands_do_not_linger() {
        // Stand in for notify-send so the spawn succeeds everywhere.
        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("notify-send");
        std::fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        let old_path = std::env::var("PATH").unwrap_or_default();
        std::env::set_var("PATH", format!("{}:{}", dir.path().display(), old_path));

        let notifier = DesktopNotifier::new();
        for _ in 0..3 {
            notifier.notify("transition");
        }

        // Give the children time to exit, then require every one reaped.
        std::thread::sleep(Duration::from_millis(200));
        let mut remaining = zombie_children();
        for _ in 0..50 {
            if remaining == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
            remaining = zombie_children();
        }
        std::env::set_var("PATH", old_path);
        assert_eq!(remaining, 0);
    }
}
