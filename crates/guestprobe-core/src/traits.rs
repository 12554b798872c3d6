//! Collaborator contracts
//!
//! The pipeline never talks to a host tool directly; every external
//! mounting and decoding facility sits behind one of these dyn-safe traits
//! so it can be replaced by a stub in tests. Production implementations
//! live in `guestprobe-backends`.

use crate::error::Result;
use crate::mount::{FsMount, RawDevice, VolumeGroup};
use crate::types::{FsKind, Package, RawPartition};
use std::path::Path;

/// Exposes an opaque disk image as a raw block-device file
pub trait ImageBackend {
    /// Backend name, e.g. `nbdfuse`
    fn name(&self) -> &'static str;

    /// Mount the image and return the raw device inside the mount
    ///
    /// Failure here is fatal for the whole run.
    fn attach(&self, image: &Path) -> Result<RawDevice>;
}

/// Enumerates partitions on a raw device
pub trait PartitionSource {
    /// List raw partition descriptors
    ///
    /// Fails closed: any probing error yields an empty list, never an
    /// error.
    fn list_partitions(&self, device: &Path) -> Vec<RawPartition>;
}

/// Mounts one filesystem from a raw device, read-only
pub trait FilesystemMounter {
    /// Mount `partition` (or the whole device when `None`) as `fs`
    ///
    /// Implementations must use read-only options that tolerate a dirty
    /// journal: `norecovery` for xfs, `noload` for ext3/ext4.
    fn mount(&self, device: &Path, fs: FsKind, partition: Option<u32>) -> Result<FsMount>;
}

/// Unwraps an LVM volume system found on a raw device
pub trait VolumeGroupMounter {
    /// Expose the volume group starting at `offset` bytes into `device`
    fn mount(&self, device: &Path, offset: u64) -> Result<VolumeGroup>;
}

/// Queries a native package database that has no stable text grammar (rpm)
pub trait PackageDbEngine {
    /// List installed packages recorded in the database directory
    fn installed(&self, db_dir: &Path) -> Result<Vec<Package>>;
}

/// Opens binary registry hive files
pub trait HiveReader {
    fn open(&self, hive: &Path) -> Result<Box<dyn RegistryView>>;
}

/// Read-only view into an opened registry hive
///
/// Key paths are backslash-separated and relative to the hive root, e.g.
/// `Microsoft\Windows NT\CurrentVersion`.
pub trait RegistryView {
    /// Read a string value, if the key and value exist
    fn string_value(&self, key_path: &str, value_name: &str) -> Option<String>;

    /// Names of the direct subkeys of a key; empty if the key is absent
    fn subkeys(&self, key_path: &str) -> Vec<String>;
}
