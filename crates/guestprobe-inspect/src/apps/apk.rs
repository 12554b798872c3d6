//! Alpine Package Keeper inventory
//!
//! The apk database is one text file of blank-line-separated stanzas;
//! `P:` carries the package name and `V:` the version.

use super::locate_db;
use guestprobe_core::Package;
use std::fs;
use std::path::Path;
use tracing::debug;

const DB_LOCATIONS: [&str; 1] = ["lib/apk/db/installed"];

/// List packages installed on an Alpine filesystem
pub fn list_applications(root: &Path) -> Vec<Package> {
    let Some(db) = locate_db(root, &DB_LOCATIONS) else {
        debug!(root = %root.display(), "apk database not found");
        return Vec::new();
    };
    match fs::read(&db) {
        Ok(raw) => parse_installed(&String::from_utf8_lossy(&raw)),
        Err(e) => {
            debug!(db = %db.display(), error = %e, "failed to read apk database");
            Vec::new()
        }
    }
}

/// Parse the `installed` database text
pub fn parse_installed(text: &str) -> Vec<Package> {
    let mut pkgs = Vec::new();
    let mut name = String::new();
    let mut version = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !name.is_empty() && !version.is_empty() {
                pkgs.push(Package::new(name.clone(), version.clone()));
            }
            name.clear();
            version.clear();
        } else if let Some(value) = line.strip_prefix("P:") {
            name = value.to_string();
        } else if let Some(value) = line.strip_prefix("V:") {
            version = value.to_string();
        }
    }
    // a final stanza without a trailing blank line still counts
    if !name.is_empty() && !version.is_empty() {
        pkgs.push(Package::new(name, version));
    }

    pkgs
}
