//! Linux distribution probe
//!
//! Walks the mounted filesystem for a directory holding an `etc` subtree
//! with `*release` files and parses exactly one of them, in fixed
//! priority:
//!
//! 1. `centos-release`: CentOS 6 predates os-release, and AlmaLinux 8 /
//!    Rocky Linux 8 also ship this file; parsing it first keeps their
//!    identities consistent
//! 2. `gentoo-release`: older Gentoo has no `VERSION_ID` in os-release
//! 3. `os-release`: the systemd standard
//! 4. `system-release`: Scientific Linux 6, Oracle Linux 6
//!
//! The result is all-or-nothing: a missing name or version after parsing
//! discards the whole probe.

use guestprobe_core::{OsInfo, PackageManager};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Probe a mounted filesystem for a Linux distribution identity
pub fn identify(root: &Path) -> Option<OsInfo> {
    let files = find_release_files(root)?;
    debug!(?files, "release files");

    let (name, version, package_manager) = if let Some(path) = files.get("centos-release") {
        let (name, version) = parse_name_release_version(&read(path)?)?;
        (name, version, Some(PackageManager::Rpm))
    } else if let Some(path) = files.get("gentoo-release") {
        let (name, version) = parse_gentoo_release(&read(path)?)?;
        (name, version, Some(PackageManager::Portage))
    } else if let Some(path) = files.get("os-release") {
        let kv = parse_os_release(&read(path)?);
        let name = kv.get("NAME").cloned().unwrap_or_default();
        // rolling-release distributions have neither VERSION nor
        // VERSION_ID, only BUILD_ID
        let version = ["VERSION", "VERSION_ID", "BUILD_ID"]
            .iter()
            .find_map(|key| kv.get(*key).filter(|v| !v.is_empty()))
            .cloned()
            .unwrap_or_default();
        (name, version, package_manager_from_families(&kv))
    } else if let Some(path) = files.get("system-release") {
        let (name, version) = parse_name_release_version(&read(path)?)?;
        (name, version, Some(PackageManager::Rpm))
    } else {
        return None;
    };

    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(OsInfo {
        name,
        version,
        package_manager,
    })
}

fn read(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(raw) => Some(String::from_utf8_lossy(&raw).into_owned()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "failed to read release file");
            None
        }
    }
}

/// Find the first directory with an `etc` subtree holding release files
fn find_release_files(root: &Path) -> Option<HashMap<String, PathBuf>> {
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let etc = entry.path().join("etc");
        if !etc.is_dir() {
            continue;
        }
        if let Some(files) = release_files_in(&etc) {
            return Some(files);
        }
    }
    debug!(root = %root.display(), "no release file found");
    None
}

fn release_files_in(etc: &Path) -> Option<HashMap<String, PathBuf>> {
    let mut files = HashMap::new();
    for entry in fs::read_dir(etc).ok()? {
        let entry = entry.ok()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with("release") {
            continue;
        }
        let path = entry.path();
        // immutable operating systems (ostree-style deployments) leave
        // dangling release symlinks behind; such an etc tree is not the
        // booted one, keep walking
        if !path.exists() {
            return None;
        }
        files.insert(name, path);
    }
    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

fn clean(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Parse a `"<name> release <version>"` line
fn parse_name_release_version(text: &str) -> Option<(String, String)> {
    let line = text.lines().next()?;
    let (name, version) = line.rsplit_once(" release ")?;
    Some((clean(name), clean(version)))
}

/// Parse a `"Gentoo ... release <version>"` line
fn parse_gentoo_release(text: &str) -> Option<(String, String)> {
    let line = text.lines().next()?;
    if !line.starts_with("Gentoo") {
        return None;
    }
    let (_, version) = line.rsplit_once("release ")?;
    Some(("Gentoo".to_string(), clean(version)))
}

/// Parse `KEY=VALUE` lines into a map, unquoting values
fn parse_os_release(text: &str) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        kv.insert(key.trim().to_string(), clean(value));
    }
    kv
}

/// Derive the package manager from the distribution families listed in
/// `ID_LIKE` (or `ID` when `ID_LIKE` is absent): first recognized token
/// wins, none recognized means no inventory parser runs
fn package_manager_from_families(kv: &HashMap<String, String>) -> Option<PackageManager> {
    let families = kv
        .get("ID_LIKE")
        .filter(|value| !value.is_empty())
        .or_else(|| kv.get("ID"))?;
    families.split_whitespace().find_map(manager_for_family)
}

fn manager_for_family(family: &str) -> Option<PackageManager> {
    match family {
        "alpine" => Some(PackageManager::Apk),
        "debian" | "ubuntu" => Some(PackageManager::Dpkg),
        "arch" => Some(PackageManager::Pacman),
        "centos" | "fedora" | "rhel" | "opensuse" | "suse" | "ol" => Some(PackageManager::Rpm),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_etc(root: &Path, name: &str, content: &str) {
        let etc = root.join("etc");
        fs::create_dir_all(&etc).unwrap();
        fs::write(etc.join(name), content).unwrap();
    }

    #[test]
    fn test_os_release_ubuntu() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "os-release",
            "NAME=\"Ubuntu\"\nVERSION=\"20.04.4 LTS (Focal Fossa)\"\nID=ubuntu\nID_LIKE=debian\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.name, "Ubuntu");
        assert_eq!(info.version, "20.04.4 LTS (Focal Fossa)");
        assert_eq!(info.package_manager, Some(PackageManager::Dpkg));
    }

    #[test]
    fn test_centos_release_wins_over_os_release() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "centos-release",
            "CentOS Linux release 8.1.1911 (Core)\n",
        );
        write_etc(
            root.path(),
            "os-release",
            "NAME=\"CentOS Stream\"\nVERSION=\"9\"\nID=centos\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.name, "CentOS Linux");
        assert_eq!(info.version, "8.1.1911 (Core)");
        assert_eq!(info.package_manager, Some(PackageManager::Rpm));
    }

    #[test]
    fn test_gentoo_release() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "gentoo-release",
            "Gentoo Base System release 2.7\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.name, "Gentoo");
        assert_eq!(info.version, "2.7");
        assert_eq!(info.package_manager, Some(PackageManager::Portage));
    }

    #[test]
    fn test_rolling_release_uses_build_id() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "os-release",
            "NAME=\"Arch Linux\"\nID=arch\nBUILD_ID=rolling\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.version, "rolling");
        assert_eq!(info.package_manager, Some(PackageManager::Pacman));
    }

    #[test]
    fn test_unknown_family_yields_no_package_manager() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "os-release",
            "NAME=Slackware\nVERSION=\"15.0\"\nID=slackware\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.name, "Slackware");
        assert_eq!(info.package_manager, None);
    }

    #[test]
    fn test_partial_identity_is_discarded() {
        let root = tempfile::tempdir().unwrap();
        write_etc(root.path(), "os-release", "NAME=\"Mystery Linux\"\nID=mystery\n");
        assert_eq!(identify(root.path()), None);
    }

    #[test]
    fn test_etc_one_level_deeper_is_found() {
        let root = tempfile::tempdir().unwrap();
        let subvol = root.path().join("@rootfs");
        fs::create_dir_all(&subvol).unwrap();
        write_etc(
            &subvol,
            "os-release",
            "NAME=\"Debian GNU/Linux\"\nVERSION=\"11 (bullseye)\"\nID=debian\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.name, "Debian GNU/Linux");
        assert_eq!(info.package_manager, Some(PackageManager::Dpkg));
    }

    #[test]
    fn test_dangling_release_symlink_skips_etc_tree() {
        let root = tempfile::tempdir().unwrap();
        let etc = root.path().join("etc");
        fs::create_dir_all(&etc).unwrap();
        std::os::unix::fs::symlink("../usr/lib/os-release", etc.join("os-release")).unwrap();
        assert_eq!(identify(root.path()), None);
    }

    #[test]
    fn test_no_release_files() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("etc")).unwrap();
        assert_eq!(identify(root.path()), None);
    }

    #[test]
    fn test_id_like_beats_id() {
        let root = tempfile::tempdir().unwrap();
        write_etc(
            root.path(),
            "os-release",
            "NAME=\"Linux Mint\"\nVERSION=\"21\"\nID=linuxmint\nID_LIKE=\"ubuntu debian\"\n",
        );
        let info = identify(root.path()).unwrap();
        assert_eq!(info.package_manager, Some(PackageManager::Dpkg));
    }
}
