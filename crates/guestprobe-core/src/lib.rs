//! # guestprobe Core
//!
//! Shared types, error handling and collaborator contracts for the
//! guestprobe disk-image inspection pipeline.
//!
//! The pipeline itself lives in `guestprobe-inspect`; the host-tool
//! collaborators (qemu-nbd/nbdfuse, lklfuse, vslvmmount, parted, rpm,
//! registry hives) live in `guestprobe-backends`. This crate defines the
//! seams between them:
//!
//! - **Types**: partitions, filesystem kinds, OS identity, packages and the
//!   final report ([`types`])
//! - **Errors**: the pipeline-wide error taxonomy ([`error`])
//! - **Contracts**: dyn-safe traits for every external mounting and
//!   decoding facility, so the pipeline can be driven by stubs in tests
//!   ([`traits`])
//! - **Mount resources**: RAII guards that release each acquired mount
//!   exactly once, in reverse acquisition order ([`mount`])

pub mod error;
pub mod mount;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{Error, Result};
pub use mount::{FsMount, MountGuard, RawDevice, VolumeGroup};
pub use traits::{
    FilesystemMounter, HiveReader, ImageBackend, PackageDbEngine, PartitionSource, RegistryView,
    VolumeGroupMounter,
};
pub use types::{
    FsKind, InspectionReport, OsInfo, Package, PackageManager, Partition, PartitionKind,
    RawPartition,
};
