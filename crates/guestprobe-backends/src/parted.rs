//! Partition source driving `parted`
//!
//! `parted --machine --script <device> unit B print` probes the partition
//! table and the filesystem inside each partition, which is exactly the
//! information the classifier needs. The contract fails closed: any
//! probing problem yields an empty list.

use guestprobe_core::{PartitionSource, RawPartition};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// `parted` partition source
pub struct PartedSource;

impl PartitionSource for PartedSource {
    fn list_partitions(&self, device: &Path) -> Vec<RawPartition> {
        if which::which("parted").is_err() {
            warn!("`parted` is not installed or not on PATH");
            return Vec::new();
        }

        let output = match Command::new("parted")
            .args(["--machine", "--script"])
            .arg(device)
            .args(["unit", "B", "print"])
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(device = %device.display(), error = %e, "failed to execute parted");
                return Vec::new();
            }
        };

        if !output.status.success() {
            // unrecognised disk label, unreadable device, ...
            debug!(
                device = %device.display(),
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "parted could not read a partition table"
            );
            return Vec::new();
        }

        parse_machine_print(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the machine-readable `print` output
///
/// Lines look like `1:1048576B:1073741823B:1072693248B:ext4::;`, meaning
/// number, start, end, size, probed filesystem, partition name/type, flags.
/// The
/// leading `BYT;` line and the device line are skipped because their first
/// field is not a partition number.
pub fn parse_machine_print(out: &str) -> Vec<RawPartition> {
    let mut partitions = Vec::new();

    for line in out.lines() {
        let line = line.trim().trim_end_matches(';');
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 7 {
            continue;
        }
        let Ok(number) = fields[0].parse::<u32>() else {
            continue;
        };
        let (Some(offset), Some(size)) = (parse_bytes(fields[1]), parse_bytes(fields[3])) else {
            continue;
        };

        let fs_type = if fields[4].is_empty() {
            None
        } else {
            Some(fields[4].to_string())
        };
        let lvm = fields[6].split(',').any(|flag| flag.trim() == "lvm");

        partitions.push(RawPartition {
            number,
            fs_type,
            lvm,
            offset,
            size,
        });
    }

    partitions
}

fn parse_bytes(field: &str) -> Option<u64> {
    field.strip_suffix('B')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_msdos_table() {
        let out = "BYT;\n\
                   /tmp/x/nbd:21474836480B:file:512:512:msdos:Virtual disk:;\n\
                   1:1048576B:1073741823B:1072693248B:ext4::boot;\n\
                   2:1073741824B:21474835967B:20400094144B:::lvm;\n";
        let parts = parse_machine_print(out);
        assert_eq!(parts.len(), 2);

        assert_eq!(parts[0].number, 1);
        assert_eq!(parts[0].fs_type.as_deref(), Some("ext4"));
        assert!(!parts[0].lvm);
        assert_eq!(parts[0].offset, 1048576);
        assert_eq!(parts[0].size, 1072693248);

        assert_eq!(parts[1].number, 2);
        assert_eq!(parts[1].fs_type, None);
        assert!(parts[1].lvm);
    }

    #[test]
    fn test_parse_gpt_table_with_multiple_flags() {
        let out = "BYT;\n\
                   /dev/nbd0:10737418240B:file:512:512:gpt:disk:;\n\
                   1:1048576B:537919487B:536870912B:fat32:EFI System Partition:boot, esp;\n\
                   2:537919488B:10737401343B:10199481856B:xfs:root:;\n";
        let parts = parse_machine_print(out);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].fs_type.as_deref(), Some("fat32"));
        assert!(!parts[0].lvm);
        assert_eq!(parts[1].fs_type.as_deref(), Some("xfs"));
    }

    #[test]
    fn test_parse_loop_label_bare_filesystem() {
        // a logical volume carrying a filesystem directly shows up as a
        // loop label with one pseudo-partition
        let out = "BYT;\n\
                   /tmp/vg/lvm1:5368709120B:file:512:512:loop:dev:;\n\
                   1:0B:5368709119B:5368709120B:btrfs::;\n";
        let parts = parse_machine_print(out);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].offset, 0);
        assert_eq!(parts[0].fs_type.as_deref(), Some("btrfs"));
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_machine_print("").is_empty());
        assert!(parse_machine_print("Error: unrecognised disk label\n").is_empty());
    }
}
