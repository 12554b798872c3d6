//! Installed-application inventory parsers
//!
//! One parser per package manager, each a function from a mounted
//! filesystem root to a list of packages. Parsers are tolerant of an
//! absent database (empty list, never an error) and of malformed records
//! (the record is dropped, the rest of the database still parses).
//!
//! Selection is driven solely by the package manager resolved during OS
//! identification; parsers never re-inspect the OS name.

pub mod apk;
pub mod dpkg;
pub mod pacman;
pub mod portage;
pub mod rpm;
pub mod windows;

use guestprobe_core::{HiveReader, Package, PackageDbEngine, PackageManager};
use std::fs;
use std::path::{Path, PathBuf};

/// Run the inventory parser matching the resolved package manager
pub fn list_applications(
    manager: PackageManager,
    root: &Path,
    hives: &dyn HiveReader,
    engine: &dyn PackageDbEngine,
) -> Vec<Package> {
    match manager {
        PackageManager::Apk => apk::list_applications(root),
        PackageManager::Dpkg => dpkg::list_applications(root),
        PackageManager::Pacman => pacman::list_applications(root),
        PackageManager::Portage => portage::list_applications(root),
        PackageManager::Rpm => rpm::list_applications(root, engine),
        PackageManager::Win => windows::list_applications(root, hives),
    }
}

/// Non-hidden subdirectories of a directory, sorted by name
pub(crate) fn subdirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}

/// Locate a package database under a mounted filesystem
///
/// Tries each location directly under the root, then one subdirectory
/// level deeper: snapshot-subvolume layouts (e.g. Debian's `@rootfs` on
/// btrfs) nest the whole tree under an extra top-level directory.
pub(crate) fn locate_db(root: &Path, locations: &[&str]) -> Option<PathBuf> {
    for location in locations {
        let db = root.join(location);
        if db.exists() {
            return Some(db);
        }
    }
    for dir in subdirs(root) {
        for location in locations {
            let db = dir.join(location);
            if db.exists() {
                return Some(db);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_db_direct() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("var/lib/dpkg")).unwrap();
        fs::write(root.path().join("var/lib/dpkg/status"), b"").unwrap();

        let db = locate_db(root.path(), &["var/lib/dpkg/status", "lib/dpkg/status"]).unwrap();
        assert_eq!(db, root.path().join("var/lib/dpkg/status"));
    }

    #[test]
    fn test_locate_db_one_level_deeper() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("@rootfs/lib/dpkg")).unwrap();
        fs::write(root.path().join("@rootfs/lib/dpkg/status"), b"").unwrap();

        let db = locate_db(root.path(), &["var/lib/dpkg/status", "lib/dpkg/status"]).unwrap();
        assert_eq!(db, root.path().join("@rootfs/lib/dpkg/status"));
    }

    #[test]
    fn test_locate_db_absent() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(locate_db(root.path(), &["var/lib/dpkg/status"]), None);
    }
}
