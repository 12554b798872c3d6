//! Portage inventory
//!
//! The database is a two-level directory tree `category/name-version`.
//! Per the Gentoo package-naming convention the version starts at the
//! last hyphen that is followed by a digit, so hyphenated names like
//! `gtk+-extra` split correctly.

use super::{locate_db, subdirs};
use guestprobe_core::Package;
use std::path::Path;
use tracing::debug;

const DB_LOCATIONS: [&str; 2] = [
    "var/db/pkg",
    "db/pkg", // separated /var partition
];

/// List packages installed on a Gentoo filesystem
pub fn list_applications(root: &Path) -> Vec<Package> {
    let Some(db) = locate_db(root, &DB_LOCATIONS) else {
        debug!(root = %root.display(), "portage database not found");
        return Vec::new();
    };

    let mut pkgs = Vec::new();
    for category_dir in subdirs(&db) {
        let Some(category) = category_dir.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        for pkg_dir in subdirs(&category_dir) {
            let Some(dir_name) = pkg_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            if let Some((name, version)) = split_name_version(&dir_name) {
                pkgs.push(Package::new(format!("{category}/{name}"), version));
            }
        }
    }
    pkgs
}

/// Split `name-version` at the last hyphen followed by a digit
pub(crate) fn split_name_version(dir_name: &str) -> Option<(&str, &str)> {
    let mut split = None;
    for (i, _) in dir_name.match_indices('-') {
        if dir_name[i + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
        {
            split = Some(i);
        }
    }
    let i = split?;
    if i == 0 {
        return None;
    }
    Some((&dir_name[..i], &dir_name[i + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_split_simple_version() {
        assert_eq!(split_name_version("bison-3.8.2"), Some(("bison", "3.8.2")));
    }

    #[test]
    fn test_split_with_revision_suffix() {
        assert_eq!(
            split_name_version("openssh-9.1_p1-r2"),
            Some(("openssh", "9.1_p1-r2"))
        );
    }

    #[test]
    fn test_split_hyphenated_name() {
        assert_eq!(
            split_name_version("libXcursor-1.2.1"),
            Some(("libXcursor", "1.2.1"))
        );
        assert_eq!(
            split_name_version("media-gfx-tool-0.5"),
            Some(("media-gfx-tool", "0.5"))
        );
    }

    #[test]
    fn test_split_rejects_versionless_name() {
        assert_eq!(split_name_version("bison"), None);
    }

    #[test]
    fn test_category_prefix_in_name() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("var/db/pkg/sys-devel/bison-3.8.2")).unwrap();
        fs::create_dir_all(root.path().join("var/db/pkg/dev-lang/python-3.11.1")).unwrap();

        let pkgs = list_applications(root.path());
        assert_eq!(
            pkgs,
            vec![
                Package::new("dev-lang/python", "3.11.1"),
                Package::new("sys-devel/bison", "3.8.2"),
            ]
        );
    }
}
