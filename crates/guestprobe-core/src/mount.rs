//! Mount resources and their release discipline
//!
//! Every successful mount produces a [`MountGuard`]. A guard releases its
//! mount point exactly once: `fusermount -u` for FUSE-backed mounts (the
//! image, volume-group and filesystem mounts are all FUSE daemons), then
//! removal of the private mount directory. Release failures are logged and
//! never stop the remaining releases; teardown is best-effort, not
//! transactional.

use crate::types::FsKind;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// How a mount point is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseMode {
    /// Unmount with `fusermount -u`, then remove the empty directory
    Fuse,

    /// Remove the directory tree (nothing was actually mounted on it)
    DirOnly,
}

/// Owned mount-point directory, released exactly once on drop
pub struct MountGuard {
    path: PathBuf,
    mode: ReleaseMode,
    released: bool,
}

impl MountGuard {
    /// Guard a directory with a FUSE mount on top of it
    pub fn fuse(path: PathBuf) -> Self {
        Self {
            path,
            mode: ReleaseMode::Fuse,
            released: false,
        }
    }

    /// Guard a plain directory with no mount on top of it
    ///
    /// Used for mount attempts that failed after the directory was created,
    /// and by test stubs that fake mounts with ordinary directories.
    pub fn dir_only(path: PathBuf) -> Self {
        Self {
            path,
            mode: ReleaseMode::DirOnly,
            released: false,
        }
    }

    /// The guarded directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.mode == ReleaseMode::Fuse {
            match Command::new("fusermount").arg("-u").arg(&self.path).output() {
                Ok(out) if out.status.success() => {
                    debug!(path = %self.path.display(), "unmounted");
                }
                Ok(out) => {
                    warn!(
                        path = %self.path.display(),
                        status = %out.status,
                        stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                        "fusermount failed"
                    );
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "failed to run fusermount");
                }
            }
        }

        let removed = match self.mode {
            ReleaseMode::Fuse => fs::remove_dir(&self.path),
            ReleaseMode::DirOnly => fs::remove_dir_all(&self.path),
        };
        if let Err(e) = removed {
            warn!(path = %self.path.display(), error = %e, "failed to remove mount directory");
        }
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for MountGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountGuard")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

/// A disk image exposed as a raw block-device file
///
/// The device file lives inside the guarded mount directory and disappears
/// with it.
#[derive(Debug)]
pub struct RawDevice {
    device: PathBuf,
    _guard: MountGuard,
}

impl RawDevice {
    pub fn new(guard: MountGuard, device: PathBuf) -> Self {
        Self {
            device,
            _guard: guard,
        }
    }

    /// Path to the raw device file
    pub fn device(&self) -> &Path {
        &self.device
    }
}

/// A mounted filesystem
#[derive(Debug)]
pub struct FsMount {
    kind: FsKind,
    guard: MountGuard,
}

impl FsMount {
    pub fn new(guard: MountGuard, kind: FsKind) -> Self {
        Self { kind, guard }
    }

    /// Root of the mounted filesystem
    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    /// The filesystem kind this mount was created with
    pub fn kind(&self) -> FsKind {
        self.kind
    }
}

/// A mounted LVM volume group
///
/// The mount directory contains one virtual device file per logical volume.
#[derive(Debug)]
pub struct VolumeGroup {
    guard: MountGuard,
}

impl VolumeGroup {
    pub fn new(guard: MountGuard) -> Self {
        Self { guard }
    }

    /// Directory containing the logical-volume device files
    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    /// Device files of the logical volumes, sorted by name
    pub fn volumes(&self) -> crate::Result<Vec<PathBuf>> {
        let mut volumes = Vec::new();
        for entry in fs::read_dir(self.guard.path())? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type()?.is_file() {
                volumes.push(entry.path());
            }
        }
        volumes.sort();
        Ok(volumes)
    }
}
