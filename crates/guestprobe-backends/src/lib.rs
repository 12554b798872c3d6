//! Host-tool collaborator implementations
//!
//! Everything here drives an external facility: `qemu-nbd`/`nbdfuse` and
//! `vmdkmount` to expose images, `parted` to probe partitions, `lklfuse`
//! to mount filesystems, `vslvmmount` to unwrap LVM, `rpm` to query rpm
//! databases, and the `nt_hive` crate to decode registry hives. Each
//! implementation satisfies the corresponding contract in
//! `guestprobe-core::traits`, and the pipeline in `guestprobe-inspect`
//! only ever sees those contracts.

pub mod hive;
pub mod lkl;
pub mod lvm;
pub mod nbd;
pub mod parted;
mod proc;
pub mod rpm;
pub mod vmdk;

pub use hive::NtHiveReader;
pub use lkl::LklFuseMounter;
pub use lvm::VslvmMounter;
pub use nbd::NbdFuseBackend;
pub use parted::PartedSource;
pub use proc::DEFAULT_MOUNT_TIMEOUT;
pub use rpm::RpmExec;
pub use vmdk::LibVmdkBackend;
