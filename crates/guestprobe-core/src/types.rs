//! Core types for guestprobe

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem kinds the pipeline knows how to mount
///
/// This is a closed set; partitions carrying anything else are dropped by
/// the classifier before the orchestrator ever sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsKind {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Btrfs,
    Vfat,
    Ntfs,
}

impl FsKind {
    /// Map a filesystem name reported by a partition probe to a kind
    ///
    /// libparted reports FAT volumes as `fat16`/`fat32`; both mount as
    /// `vfat`.
    pub fn from_probe(name: &str) -> Option<Self> {
        match name {
            "ext2" => Some(FsKind::Ext2),
            "ext3" => Some(FsKind::Ext3),
            "ext4" => Some(FsKind::Ext4),
            "xfs" => Some(FsKind::Xfs),
            "btrfs" => Some(FsKind::Btrfs),
            "vfat" | "fat16" | "fat32" => Some(FsKind::Vfat),
            "ntfs" => Some(FsKind::Ntfs),
            _ => None,
        }
    }

    /// The mount type string passed to the filesystem mounter
    pub fn as_str(&self) -> &'static str {
        match self {
            FsKind::Ext2 => "ext2",
            FsKind::Ext3 => "ext3",
            FsKind::Ext4 => "ext4",
            FsKind::Xfs => "xfs",
            FsKind::Btrfs => "btrfs",
            FsKind::Vfat => "vfat",
            FsKind::Ntfs => "ntfs",
        }
    }
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partition descriptor exactly as the partition-table collaborator
/// reports it, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPartition {
    /// Partition number, unique per device
    pub number: u32,

    /// Probed filesystem name, if the probe recognized one
    pub fs_type: Option<String>,

    /// True if the partition carries the LVM flag
    pub lvm: bool,

    /// Offset from the start of the device in bytes
    pub offset: u64,

    /// Length in bytes
    pub size: u64,
}

/// What a classified partition contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    /// A mountable filesystem of the given kind
    Filesystem(FsKind),

    /// An LVM physical volume that must be unwrapped first
    Lvm,
}

/// A classified partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Partition number, unique per device
    pub number: u32,

    /// Classified content
    pub kind: PartitionKind,

    /// Offset from the start of the device in bytes
    pub offset: u64,

    /// Length in bytes
    pub size: u64,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PartitionKind::Filesystem(fs) => fs.as_str(),
            PartitionKind::Lvm => "lvm",
        };
        write!(
            f,
            "partition {} [{} @ {}, {} bytes]",
            self.number, kind, self.offset, self.size
        )
    }
}

/// Package managers with a known inventory database grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apk,
    Dpkg,
    Pacman,
    Portage,
    Rpm,
    Win,
}

impl PackageManager {
    /// The identifier used in the report output
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Apk => "apk",
            PackageManager::Dpkg => "dpkg",
            PackageManager::Pacman => "pacman",
            PackageManager::Portage => "portage",
            PackageManager::Rpm => "rpm",
            PackageManager::Win => "win",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the guest operating system
///
/// Probes return `Option<OsInfo>`: either everything here is populated or
/// the probe yields `None`. A name without a version (or vice versa) is
/// never surfaced. `package_manager` is `None` when the distribution family
/// is unknown, in which case no inventory parser runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    /// Display name, e.g. `Ubuntu` or `Microsoft Windows XP`
    pub name: String,

    /// Version string, e.g. `20.04` or `5.1`
    pub version: String,

    /// Package manager governing the installed-application inventory
    pub package_manager: Option<PackageManager>,
}

/// One installed package or application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// The pipeline's final output record
///
/// Fields are empty strings (and `apps` an empty list) when the run
/// completed but the value could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub name: String,
    pub version: String,
    pub package_manager: String,
    pub apps: Vec<Package>,
}

impl InspectionReport {
    /// Assemble the report from an optional OS identity and an inventory
    pub fn new(os: Option<OsInfo>, apps: Vec<Package>) -> Self {
        match os {
            Some(os) => Self {
                name: os.name,
                version: os.version,
                package_manager: os
                    .package_manager
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                apps,
            },
            None => Self {
                name: String::new(),
                version: String::new(),
                package_manager: String::new(),
                apps,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_kind_from_probe() {
        assert_eq!(FsKind::from_probe("ext4"), Some(FsKind::Ext4));
        assert_eq!(FsKind::from_probe("fat32"), Some(FsKind::Vfat));
        assert_eq!(FsKind::from_probe("fat16"), Some(FsKind::Vfat));
        assert_eq!(FsKind::from_probe("ntfs"), Some(FsKind::Ntfs));
        assert_eq!(FsKind::from_probe("linux-swap(v1)"), None);
        assert_eq!(FsKind::from_probe(""), None);
    }

    #[test]
    fn test_report_from_populated_os() {
        let os = OsInfo {
            name: "Ubuntu".to_string(),
            version: "20.04".to_string(),
            package_manager: Some(PackageManager::Dpkg),
        };
        let report = InspectionReport::new(Some(os), vec![Package::new("bash", "5.0")]);
        assert_eq!(report.name, "Ubuntu");
        assert_eq!(report.package_manager, "dpkg");
        assert_eq!(report.apps.len(), 1);
    }

    #[test]
    fn test_report_undetermined_is_empty_not_null() {
        let report = InspectionReport::new(None, Vec::new());
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"name":"","version":"","package_manager":"","apps":[]}"#
        );
    }

    #[test]
    fn test_report_os_without_manager() {
        let os = OsInfo {
            name: "Slackware".to_string(),
            version: "15.0".to_string(),
            package_manager: None,
        };
        let report = InspectionReport::new(Some(os), Vec::new());
        assert_eq!(report.package_manager, "");
        assert!(report.apps.is_empty());
    }
}
