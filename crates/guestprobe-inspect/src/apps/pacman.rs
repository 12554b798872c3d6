//! pacman inventory
//!
//! The local database is one directory per package, each holding a `desc`
//! file of `%FIELD%` blocks with the values on the following lines.

use super::{locate_db, subdirs};
use guestprobe_core::Package;
use std::fs;
use std::path::Path;
use tracing::debug;

const DB_LOCATIONS: [&str; 2] = [
    "var/lib/pacman/local",
    "lib/pacman/local", // separated /var partition
];

/// List packages installed on an Arch-family filesystem
pub fn list_applications(root: &Path) -> Vec<Package> {
    let Some(db) = locate_db(root, &DB_LOCATIONS) else {
        debug!(root = %root.display(), "pacman database not found");
        return Vec::new();
    };

    let mut pkgs = Vec::new();
    for dir in subdirs(&db) {
        let desc = dir.join("desc");
        let raw = match fs::read(&desc) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(desc = %desc.display(), error = %e, "failed to read desc file");
                continue;
            }
        };
        if let Some(pkg) = parse_desc(&String::from_utf8_lossy(&raw)) {
            pkgs.push(pkg);
        }
    }
    pkgs
}

/// Extract name and version from one `desc` file
pub fn parse_desc(text: &str) -> Option<Package> {
    let mut name = None;
    let mut version = None;
    let mut field: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.len() > 2 && line.starts_with('%') && line.ends_with('%') {
            field = Some(line.trim_matches('%').to_string());
            continue;
        }
        if line.is_empty() {
            field = None;
            continue;
        }
        match field.as_deref() {
            Some("NAME") if name.is_none() => name = Some(line.to_string()),
            Some("VERSION") if version.is_none() => version = Some(line.to_string()),
            _ => {}
        }
    }

    Some(Package::new(name?, version?))
}
