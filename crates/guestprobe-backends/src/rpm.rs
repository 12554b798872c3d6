//! rpm database engine driving the host `rpm` binary
//!
//! The rpm database has no stable text grammar (Berkeley DB historically,
//! sqlite today), so the inventory is delegated to the native engine:
//! `rpm --dbpath <dir> -qa` with a query format that emits one
//! tab-separated name/version pair per line.

use guestprobe_core::{Error, Package, PackageDbEngine, Result};
use std::path::Path;
use std::process::Command;

use crate::proc::require_tool;

const QUERY_FORMAT: &str = "%{NAME}\t%{VERSION}\n";

/// Host `rpm` query engine
pub struct RpmExec;

impl PackageDbEngine for RpmExec {
    fn installed(&self, db_dir: &Path) -> Result<Vec<Package>> {
        require_tool("rpm")?;

        let output = Command::new("rpm")
            .arg("--dbpath")
            .arg(db_dir)
            .args(["-qa", "--queryformat", QUERY_FORMAT])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::malformed(format!(
                "rpm query of {} failed: {}",
                db_dir.display(),
                stderr.trim()
            )));
        }

        Ok(parse_query_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_query_output(out: &str) -> Vec<Package> {
    out.lines()
        .filter_map(|line| {
            let (name, version) = line.split_once('\t')?;
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(Package::new(name, version))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_output() {
        let out = "libgcc\t12.0.1\nbash\t5.1.8\n";
        let pkgs = parse_query_output(out);
        assert_eq!(
            pkgs,
            vec![
                Package::new("libgcc", "12.0.1"),
                Package::new("bash", "5.1.8"),
            ]
        );
    }

    #[test]
    fn test_parse_skips_incomplete_lines() {
        let out = "libgcc\t12.0.1\nwarning: some db noise\n\t1.0\n";
        let pkgs = parse_query_output(out);
        assert_eq!(pkgs, vec![Package::new("libgcc", "12.0.1")]);
    }
}
