//! Windows installed-programs inventory
//!
//! Reads the Uninstall keys out of the SOFTWARE registry hive, both the
//! native one and the `Wow6432Node` mirror for 32-bit programs on 64-bit
//! Windows. Entries without a display name and version (update markers,
//! orphaned keys) are skipped.

use crate::os::windows::find_software_hive;
use guestprobe_core::{HiveReader, Package};
use std::path::Path;
use tracing::{debug, warn};

const UNINSTALL_KEYS: [&str; 2] = [
    "Microsoft\\Windows\\CurrentVersion\\Uninstall",
    "Wow6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall",
];

/// List programs recorded in the SOFTWARE hive of a mounted filesystem
pub fn list_applications(root: &Path, hives: &dyn HiveReader) -> Vec<Package> {
    let Some(path) = find_software_hive(root) else {
        debug!(root = %root.display(), "SOFTWARE hive not found");
        return Vec::new();
    };
    let view = match hives.open(&path) {
        Ok(view) => view,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open registry hive");
            return Vec::new();
        }
    };

    let mut pkgs = Vec::new();
    for uninstall_key in UNINSTALL_KEYS {
        for subkey in view.subkeys(uninstall_key) {
            let key_path = format!("{uninstall_key}\\{subkey}");
            let name = view.string_value(&key_path, "DisplayName");
            let version = view.string_value(&key_path, "DisplayVersion");
            match (name, version) {
                (Some(name), Some(version)) => pkgs.push(Package::new(name, version)),
                _ => debug!(key = %key_path, "uninstall entry without name or version"),
            }
        }
    }
    pkgs
}
