//! Windows probe
//!
//! Reads name and version from the `CurrentVersion` key of the SOFTWARE
//! registry hive. Two path casings exist on disk: the XP-era layout and
//! everything newer; the first one present wins.

use guestprobe_core::{HiveReader, OsInfo, PackageManager};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk locations of the SOFTWARE hive, oldest layout first
pub(crate) const SOFTWARE_HIVE_LOCATIONS: [&str; 2] = [
    "WINDOWS/system32/config/software", // xp
    "Windows/System32/config/SOFTWARE", // others
];

const CURRENT_VERSION_KEY: &str = "Microsoft\\Windows NT\\CurrentVersion";

/// Locate the SOFTWARE hive on a mounted filesystem
pub(crate) fn find_software_hive(root: &Path) -> Option<PathBuf> {
    SOFTWARE_HIVE_LOCATIONS
        .iter()
        .map(|location| root.join(location))
        .find(|path| path.is_file())
}

/// Probe a mounted filesystem for a Windows identity
pub fn identify(root: &Path, hives: &dyn HiveReader) -> Option<OsInfo> {
    let path = find_software_hive(root)?;
    let view = match hives.open(&path) {
        Ok(view) => view,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open registry hive");
            return None;
        }
    };

    let name = view.string_value(CURRENT_VERSION_KEY, "ProductName")?;
    let version = view.string_value(CURRENT_VERSION_KEY, "CurrentVersion")?;
    if name.is_empty() || version.is_empty() {
        debug!(path = %path.display(), "incomplete CurrentVersion key");
        return None;
    }

    Some(OsInfo {
        name,
        version,
        package_manager: Some(PackageManager::Win),
    })
}
