//! Volume-group mounter driving `vslvmmount` from libvslvm
//!
//! Exposes an LVM volume system found at a byte offset inside a raw device
//! as a directory of virtual files, one per logical volume (`lvm1`,
//! `lvm2`, ...). `vslvmmount` daemonizes on its own, so the command either
//! leaves a mount behind or it failed.

use crate::proc::{is_mountpoint, make_mount_dir, require_tool};
use guestprobe_core::{Error, MountGuard, Result, VolumeGroup, VolumeGroupMounter};
use std::path::Path;
use std::process::Command;

/// `vslvmmount` volume-group mounter
pub struct VslvmMounter;

impl VolumeGroupMounter for VslvmMounter {
    fn mount(&self, device: &Path, offset: u64) -> Result<VolumeGroup> {
        require_tool("vslvmmount")?;

        let dir = make_mount_dir()?;
        let output = Command::new("vslvmmount")
            .arg("-o")
            .arg(offset.to_string())
            .arg(device)
            .arg(&dir)
            .output()
            .map_err(|e| Error::mount_failed(format!("failed to execute vslvmmount: {e}")))?;

        if !output.status.success() || !is_mountpoint(&dir) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            drop(MountGuard::dir_only(dir));
            return Err(Error::mount_failed(format!(
                "vslvmmount exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(VolumeGroup::new(MountGuard::fuse(dir)))
    }
}
