//! Image backend driving `qemu-nbd` through `nbdfuse`
//!
//! `nbdfuse --socket-activation qemu-nbd` exposes any image format qemu
//! understands as a single raw file named `nbd` inside the mount
//! directory. This is the default backend.

use crate::proc::{make_mount_dir, require_tool, spawn, wait_for_mount, DEFAULT_MOUNT_TIMEOUT};
use guestprobe_core::{ImageBackend, MountGuard, RawDevice, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// The raw device file nbdfuse creates inside its mount
const DEVICE_NAME: &str = "nbd";

/// `nbdfuse` + `qemu-nbd` image backend
pub struct NbdFuseBackend {
    timeout: Duration,
}

impl NbdFuseBackend {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_MOUNT_TIMEOUT,
        }
    }

    /// Override the mount-visibility timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for NbdFuseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for NbdFuseBackend {
    fn name(&self) -> &'static str {
        "nbdfuse"
    }

    fn attach(&self, image: &Path) -> Result<RawDevice> {
        require_tool("nbdfuse")?;
        require_tool("qemu-nbd")?;

        let dir = make_mount_dir()?;
        let mut cmd = Command::new("nbdfuse");
        cmd.arg("--readonly")
            .arg(&dir)
            .arg("--socket-activation")
            .arg("qemu-nbd")
            .arg("--read-only")
            .arg(image);

        let child = match spawn(&mut cmd) {
            Ok(child) => child,
            Err(e) => {
                drop(MountGuard::dir_only(dir));
                return Err(e);
            }
        };

        match wait_for_mount(child, &dir, self.timeout) {
            Ok(_daemon) => {
                let device = dir.join(DEVICE_NAME);
                Ok(RawDevice::new(MountGuard::fuse(dir), device))
            }
            Err(e) => {
                drop(MountGuard::dir_only(dir));
                Err(e)
            }
        }
    }
}
