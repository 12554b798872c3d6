//! Partition classification
//!
//! Turns the collaborator's raw descriptors into typed records. The drop
//! rule is deliberately a standalone, testable step: a descriptor whose
//! filesystem is outside the supported set and which carries no LVM flag
//! disappears here and is never surfaced anywhere else.

use guestprobe_core::{FsKind, Partition, PartitionKind, RawPartition};
use tracing::debug;

/// Classify raw partition descriptors
///
/// An empty result is valid and means "nothing inspectable on this
/// device". No errors are raised here.
pub fn classify_partitions(raw: &[RawPartition]) -> Vec<Partition> {
    raw.iter()
        .filter_map(|part| {
            let kind = match part.fs_type.as_deref().and_then(FsKind::from_probe) {
                Some(fs) => PartitionKind::Filesystem(fs),
                None if part.lvm => PartitionKind::Lvm,
                None => {
                    debug!(number = part.number, fs_type = ?part.fs_type, "dropping partition");
                    return None;
                }
            };
            Some(Partition {
                number: part.number,
                kind,
                offset: part.offset,
                size: part.size,
            })
        })
        .collect()
}
