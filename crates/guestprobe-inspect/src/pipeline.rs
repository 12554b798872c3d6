//! Mount orchestration
//!
//! Assembles the mount stack bottom-up: image to raw device, device to
//! partitions, partitions to filesystem mounts, with an LVM unwrapping
//! detour when a physical volume is present. The resulting [`Session`]
//! owns every mount and tears the stack down in reverse order when
//! dropped.
//!
//! Two failures abort a run: the image itself cannot be exposed as a raw
//! device, or the device yields zero inspectable partitions. Everything
//! past that point degrades: a filesystem that will not mount is skipped,
//! a volume group that will not open contributes no filesystems.

use crate::partitions::classify_partitions;
use crate::report::{inspect_mounted, InspectContext};
use guestprobe_core::{
    Error, FilesystemMounter, FsKind, FsMount, ImageBackend, InspectionReport, Partition,
    PartitionKind, PartitionSource, RawDevice, Result, VolumeGroup, VolumeGroupMounter,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// The mount-stage collaborators, wired together
pub struct Pipeline<'a> {
    pub backend: &'a dyn ImageBackend,
    pub partitions: &'a dyn PartitionSource,
    pub filesystems: &'a dyn FilesystemMounter,
    pub volume_groups: &'a dyn VolumeGroupMounter,
}

/// All mounts belonging to one inspection run
///
/// Dropping the session releases the filesystems first (in reverse mount
/// order), then the volume group, then the raw image device. Field order
/// matters: `image` must be declared last so it drops last.
pub struct Session {
    filesystems: Vec<FsMount>,
    volume_group: Option<VolumeGroup>,
    image: RawDevice,
}

impl Session {
    /// The mounted filesystems, in mount order
    pub fn filesystems(&self) -> &[FsMount] {
        &self.filesystems
    }

    /// The raw device the filesystems were mounted from
    pub fn device(&self) -> &Path {
        self.image.device()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        while let Some(fs) = self.filesystems.pop() {
            drop(fs);
        }
        // volume_group and image drop in declaration order
    }
}

impl<'a> Pipeline<'a> {
    /// Mount everything mountable under `image` and return the session
    pub fn mount(&self, image: &Path) -> Result<Session> {
        info!(image = %image.display(), backend = self.backend.name(), "attaching image");
        let raw = self.backend.attach(image)?;

        let parts = classify_partitions(&self.partitions.list_partitions(raw.device()));
        if parts.is_empty() {
            // raw drops here and detaches the image
            return Err(Error::NoPartitions(raw.device().to_path_buf()));
        }
        for part in &parts {
            debug!(%part, "classified");
        }

        let (volume_group, filesystems) = match parts
            .iter()
            .find(|p| p.kind == PartitionKind::Lvm)
        {
            Some(pv) => self.mount_volume_group(raw.device(), pv),
            None => (None, self.mount_filesystems(raw.device(), &parts)),
        };
        info!(count = filesystems.len(), "filesystems mounted");

        Ok(Session {
            filesystems,
            volume_group,
            image: raw,
        })
    }

    /// Run a full inspection: mount, probe, tear down
    pub fn run(&self, image: &Path, ctx: &InspectContext<'_>) -> Result<InspectionReport> {
        let session = self.mount(image)?;
        let report = inspect_mounted(session.filesystems(), ctx);
        drop(session);
        Ok(report)
    }

    /// Mount every filesystem partition directly from the device
    fn mount_filesystems(&self, device: &Path, parts: &[Partition]) -> Vec<FsMount> {
        let mut mounts = Vec::new();
        for part in parts {
            let PartitionKind::Filesystem(fs) = part.kind else {
                continue;
            };
            match self.filesystems.mount(device, fs, Some(part.number)) {
                Ok(mount) => mounts.push(mount),
                Err(e) => {
                    warn!(%part, error = %e, "filesystem mount failed, skipping");
                }
            }
        }
        mounts
    }

    /// Unwrap an LVM physical volume and mount its logical volumes
    fn mount_volume_group(
        &self,
        device: &Path,
        pv: &Partition,
    ) -> (Option<VolumeGroup>, Vec<FsMount>) {
        let vg = match self.volume_groups.mount(device, pv.offset) {
            Ok(vg) => vg,
            Err(e) => {
                warn!(%pv, error = %e, "volume group mount failed");
                return (None, Vec::new());
            }
        };
        let mounts = self.mount_logical_volumes(&vg);
        (Some(vg), mounts)
    }

    /// Mount the filesystem carried by each logical volume
    ///
    /// Logical volumes are bare filesystems, not partitioned devices: the
    /// partition probe reports each as a single whole-device entry, and the
    /// mount happens without a partition number.
    fn mount_logical_volumes(&self, vg: &VolumeGroup) -> Vec<FsMount> {
        let volumes = match vg.volumes() {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!(path = %vg.path().display(), error = %e, "failed to list logical volumes");
                return Vec::new();
            }
        };

        let mut mounts = Vec::new();
        for volume in volumes {
            let parts = classify_partitions(&self.partitions.list_partitions(&volume));
            let Some(fs) = parts.iter().find_map(|p| match p.kind {
                PartitionKind::Filesystem(fs) => Some(fs),
                PartitionKind::Lvm => None,
            }) else {
                debug!(volume = %volume.display(), "no mountable filesystem on logical volume");
                continue;
            };
            match self.mount_one_volume(&volume, fs) {
                Ok(mount) => mounts.push(mount),
                Err(e) => {
                    debug!(volume = %volume.display(), error = %e, "logical volume mount failed");
                }
            }
        }
        mounts
    }

    fn mount_one_volume(&self, volume: &Path, fs: FsKind) -> Result<FsMount> {
        self.filesystems.mount(volume, fs, None)
    }
}
