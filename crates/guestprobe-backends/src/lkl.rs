//! Filesystem mounter driving `lklfuse`
//!
//! lklfuse runs a Linux-kernel-library instance in userspace and can mount
//! ext2/3/4, xfs, btrfs, vfat and ntfs from a raw image, optionally
//! selecting a partition by number. Everything is mounted read-only.

use crate::proc::{make_mount_dir, require_tool, spawn, wait_for_mount, DEFAULT_MOUNT_TIMEOUT};
use guestprobe_core::{FilesystemMounter, FsKind, FsMount, MountGuard, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// `lklfuse` filesystem mounter
pub struct LklFuseMounter {
    timeout: Duration,
}

impl LklFuseMounter {
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

impl Default for LklFuseMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemMounter for LklFuseMounter {
    fn mount(&self, device: &Path, fs: FsKind, partition: Option<u32>) -> Result<FsMount> {
        require_tool("lklfuse")?;

        let dir = make_mount_dir()?;
        let opts = mount_options(fs, partition);
        let mut cmd = Command::new("lklfuse");
        cmd.arg(device).arg(&dir).arg("-f").arg("-o").arg(&opts);

        let child = match spawn(&mut cmd) {
            Ok(child) => child,
            Err(e) => {
                drop(MountGuard::dir_only(dir));
                return Err(e);
            }
        };

        match wait_for_mount(child, &dir, self.timeout) {
            Ok(_daemon) => Ok(FsMount::new(MountGuard::fuse(dir), fs)),
            Err(e) => {
                drop(MountGuard::dir_only(dir));
                Err(e)
            }
        }
    }
}

/// Build the lklfuse option string for a read-only mount
fn mount_options(fs: FsKind, partition: Option<u32>) -> String {
    let mut opts = format!("ro,type={}", fs.as_str());
    if let Some(nr) = partition {
        opts.push_str(&format!(",part={nr}"));
    }
    match fs {
        // mount without running log recovery, otherwise the mount fails
        // on a dirty filesystem
        FsKind::Xfs => opts.push_str(",opts=norecovery"),
        // skip journal replay so dirty ext3/ext4 filesystems still mount
        FsKind::Ext3 | FsKind::Ext4 => opts.push_str(",opts=noload"),
        _ => {}
    }
    opts
}
