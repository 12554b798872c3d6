//! # guestprobe Inspect
//!
//! The inspection pipeline: given a disk image and a set of collaborator
//! implementations, mount whatever filesystems can be mounted, identify
//! the guest operating system, and extract its installed-package
//! inventory.
//!
//! - [`partitions`]: classify raw partition descriptors into the closed
//!   set of mountable kinds
//! - [`pipeline`]: the mount orchestrator and its teardown [`Session`]
//! - [`os`]: OS identification probes (Linux release files, Windows
//!   SOFTWARE hive)
//! - [`apps`]: the six package-database parsers
//! - [`report`]: drives the probes and parsers across all mounted
//!   filesystems and assembles the final report

pub mod apps;
pub mod os;
pub mod partitions;
pub mod pipeline;
pub mod report;

#[cfg(test)]
pub(crate) mod testutil;

pub use partitions::classify_partitions;
pub use pipeline::{Pipeline, Session};
pub use report::{inspect_mounted, InspectContext};
