//! Guest operating system identification
//!
//! One probe per filesystem, chosen by filesystem kind: ntfs gets the
//! Windows registry probe, everything else the Linux release-file probe.
//! The first filesystem that yields a fully populated identity wins and
//! later filesystems are never probed.

pub mod linux;
pub mod windows;

use guestprobe_core::{FsKind, FsMount, HiveReader, OsInfo};

/// Identify the guest OS from an ordered list of mounted filesystems
pub fn identify_os(filesystems: &[FsMount], hives: &dyn HiveReader) -> Option<OsInfo> {
    for fs in filesystems {
        let info = match fs.kind() {
            FsKind::Ntfs => windows::identify(fs.path(), hives),
            _ => linux::identify(fs.path()),
        };
        if info.is_some() {
            return info;
        }
    }
    None
}
