//! Optical drive control through the host's eject tooling.
//!
//! macOS uses `diskutil eject <volume>`; other platforms fall back to
//! `eject <volume>`.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use super::is_macos;
use crate::error::{CoreResult, command_failed_error, command_start_error};
use crate::runner::DriveControl;

/// [`DriveControl`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDrive;

impl SystemDrive {
    fn eject_command(volume: &Path) -> (String, Vec<String>) {
        let target = volume.display().to_string();
        if is_macos() {
            ("diskutil".to_string(), vec!["eject".to_string(), target])
        } else {
            ("eject".to_string(), vec![target])
        }
    }
}

impl DriveControl for SystemDrive {
    fn eject(&self, volume: &Path) -> CoreResult<()> {
        let (tool, args) = Self::eject_command(volume);
        log::debug!("Running {} {}", tool, args.join(" "));

        let output = Command::new(&tool)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| command_start_error(&tool, e))?;

        if output.status.success() {
            Ok(())
        } else {
            log::debug!(
                "{} stderr: {}",
                tool,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Err(command_failed_error(&tool, output.status.code()))
        }
    }

    fn volume_present(&self, volume: &Path) -> bool {
        volume.exists()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Ejects a disc after a run, logging instead of failing.
pub fn eject_quietly(drive: &impl DriveControl, volume: &Path) {
    log::info!("Ejecting disc: {}", volume.display());
    if let Err(e) = drive.eject(volume) {
        log::warn!("Failed to eject disc (continuing anyway): {}", e);
    }
}
