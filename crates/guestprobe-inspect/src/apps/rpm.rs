//! rpm inventory
//!
//! The rpm database is binary (Berkeley DB or sqlite depending on the
//! distribution era), so decoding is delegated to a [`PackageDbEngine`].
//! This module only finds the database directory; the search walks the
//! whole filesystem because immutable distributions relocate it, e.g.
//! Fedora Silverblue keeps it under `usr/share/rpm`.

use guestprobe_core::{Package, PackageDbEngine};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const DB_LOCATIONS: [&str; 3] = [
    "usr/share/rpm",
    "usr/lib/sysimage/rpm",
    "var/lib/rpm",
];

/// List packages installed on an rpm-based filesystem
pub fn list_applications(root: &Path, engine: &dyn PackageDbEngine) -> Vec<Package> {
    let Some(db) = find_db(root) else {
        debug!(root = %root.display(), "rpm database not found");
        return Vec::new();
    };
    match engine.installed(&db) {
        Ok(pkgs) => pkgs,
        Err(e) => {
            warn!(db = %db.display(), error = %e, "rpm database query failed");
            Vec::new()
        }
    }
}

/// Locate the rpm database directory under a mounted filesystem
pub(crate) fn find_db(root: &Path) -> Option<PathBuf> {
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
    {
        for location in DB_LOCATIONS {
            let db = entry.path().join(location);
            if db.is_dir() {
                return Some(db);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestprobe_core::Result;
    use std::fs;

    struct FixedEngine(Vec<Package>);

    impl PackageDbEngine for FixedEngine {
        fn installed(&self, _db_dir: &Path) -> Result<Vec<Package>> {
            Ok(self.0.clone())
        }
    }

    struct FailingEngine;

    impl PackageDbEngine for FailingEngine {
        fn installed(&self, _db_dir: &Path) -> Result<Vec<Package>> {
            Err(guestprobe_core::Error::malformed("corrupt rpm database"))
        }
    }

    #[test]
    fn test_find_db_standard_location() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("var/lib/rpm")).unwrap();
        assert_eq!(find_db(root.path()), Some(root.path().join("var/lib/rpm")));
    }

    #[test]
    fn test_find_db_ostree_location() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("ostree/deploy/fedora/usr/share/rpm")).unwrap();
        assert_eq!(
            find_db(root.path()),
            Some(root.path().join("ostree/deploy/fedora/usr/share/rpm"))
        );
    }

    #[test]
    fn test_engine_results_pass_through() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("var/lib/rpm")).unwrap();
        let engine = FixedEngine(vec![Package::new("bash", "5.1.8")]);
        assert_eq!(
            list_applications(root.path(), &engine),
            vec![Package::new("bash", "5.1.8")]
        );
    }

    #[test]
    fn test_engine_failure_is_empty_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("var/lib/rpm")).unwrap();
        assert!(list_applications(root.path(), &FailingEngine).is_empty());
    }

    #[test]
    fn test_absent_database() {
        let root = tempfile::tempdir().unwrap();
        let engine = FixedEngine(vec![Package::new("bash", "5.1.8")]);
        assert!(list_applications(root.path(), &engine).is_empty());
    }
}
