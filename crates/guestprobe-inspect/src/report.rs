//! Report assembly
//!
//! Runs the OS probes and inventory parsers over whatever filesystems the
//! pipeline managed to mount and folds the results into one
//! [`InspectionReport`].

use crate::apps;
use crate::os::identify_os;
use guestprobe_core::{FsMount, HiveReader, InspectionReport, Package, PackageDbEngine};
use tracing::{debug, info};

/// Collaborators needed by the probing stage
pub struct InspectContext<'a> {
    pub hives: &'a dyn HiveReader,
    pub rpm: &'a dyn PackageDbEngine,
}

/// Inspect an ordered list of mounted filesystems
///
/// The OS identity comes from the first filesystem that yields one. The
/// inventory comes from the first filesystem whose package database
/// produces a non-empty list; on multi-partition layouts the database may
/// live on a different partition than the release files.
pub fn inspect_mounted(filesystems: &[FsMount], ctx: &InspectContext<'_>) -> InspectionReport {
    let os = identify_os(filesystems, ctx.hives);
    match &os {
        Some(os) => info!(name = %os.name, version = %os.version, "identified guest OS"),
        None => info!("guest OS could not be identified"),
    }

    let mut apps: Vec<Package> = Vec::new();
    if let Some(manager) = os.as_ref().and_then(|os| os.package_manager) {
        for fs in filesystems {
            apps = apps::list_applications(manager, fs.path(), ctx.hives, ctx.rpm);
            if !apps.is_empty() {
                debug!(
                    root = %fs.path().display(),
                    count = apps.len(),
                    "package inventory read"
                );
                break;
            }
        }
    }

    InspectionReport::new(os, apps)
}
