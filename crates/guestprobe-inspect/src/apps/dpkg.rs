//! dpkg inventory
//!
//! `status` is a file of blank-line-separated stanzas. A package counts
//! only when its `Status:` field contains the `installed` token; removed
//! packages linger in the file with states like `deinstall ok
//! config-files`.

use super::locate_db;
use guestprobe_core::Package;
use std::fs;
use std::path::Path;
use tracing::debug;

const DB_LOCATIONS: [&str; 2] = [
    "var/lib/dpkg/status",
    "lib/dpkg/status", // separated /var partition
];

/// List packages installed on a Debian-family filesystem
pub fn list_applications(root: &Path) -> Vec<Package> {
    let Some(db) = locate_db(root, &DB_LOCATIONS) else {
        debug!(root = %root.display(), "dpkg database not found");
        return Vec::new();
    };
    match fs::read(&db) {
        Ok(raw) => parse_status(&String::from_utf8_lossy(&raw)),
        Err(e) => {
            debug!(db = %db.display(), error = %e, "failed to read dpkg database");
            Vec::new()
        }
    }
}

/// Parse the dpkg `status` file text
pub fn parse_status(text: &str) -> Vec<Package> {
    let mut pkgs = Vec::new();
    let mut name = String::new();
    let mut version = String::new();
    let mut installed = false;

    let mut flush = |name: &mut String, version: &mut String, installed: &mut bool| {
        if !name.is_empty() && !version.is_empty() && *installed {
            pkgs.push(Package::new(name.clone(), version.clone()));
        }
        name.clear();
        version.clear();
        *installed = false;
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut name, &mut version, &mut installed);
        } else if let Some(value) = line.strip_prefix("Package:") {
            name = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("Status:") {
            installed = value.split_whitespace().any(|token| token == "installed");
        } else if let Some(value) = line.strip_prefix("Version:") {
            version = value.trim().to_string();
        }
    }
    flush(&mut name, &mut version, &mut installed);

    pkgs
}
