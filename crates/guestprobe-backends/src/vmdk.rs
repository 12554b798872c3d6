//! Image backend driving `vmdkmount` from libvmdk
//!
//! Exposes a VMDK as a raw file named `vmdk1` inside the mount directory.
//! `vmdkmount` daemonizes on its own, so unlike the nbdfuse backend there
//! is no poll loop: the command either leaves a mount behind or it failed.

use crate::proc::{is_mountpoint, make_mount_dir, require_tool};
use guestprobe_core::{Error, ImageBackend, MountGuard, RawDevice, Result};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// The raw device file vmdkmount creates inside its mount
const DEVICE_NAME: &str = "vmdk1";

/// `vmdkmount` image backend for VMDK files
pub struct LibVmdkBackend;

impl ImageBackend for LibVmdkBackend {
    fn name(&self) -> &'static str {
        "libvmdk"
    }

    fn attach(&self, image: &Path) -> Result<RawDevice> {
        require_tool("vmdkmount")?;

        // libvmdk refuses renamed monolithicSparse images whose embedded
        // descriptor still names the original extent file. Mount through a
        // symlink carrying that name when they disagree.
        let link = match renamed_extent(image) {
            Ok(Some(name)) => match ExtentLink::create(image, &name) {
                Ok(link) => {
                    debug!(image = %image.display(), extent = %name, "image has been renamed");
                    Some(link)
                }
                Err(e) => {
                    warn!(image = %image.display(), error = %e, "failed to create extent symlink");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(image = %image.display(), error = %e, "could not read sparse descriptor");
                None
            }
        };
        let target = link
            .as_ref()
            .map(|l| l.path().to_path_buf())
            .unwrap_or_else(|| image.to_path_buf());

        let dir = make_mount_dir()?;
        let output = Command::new("vmdkmount")
            .arg(&target)
            .arg(&dir)
            .output()
            .map_err(|e| Error::mount_failed(format!("failed to execute vmdkmount: {e}")))?;
        drop(link);

        if !output.status.success() || !is_mountpoint(&dir) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            drop(MountGuard::dir_only(dir));
            return Err(Error::mount_failed(format!(
                "vmdkmount exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let device = dir.join(DEVICE_NAME);
        Ok(RawDevice::new(MountGuard::fuse(dir), device))
    }
}

/// Temporary directory holding a symlink with the original extent name
struct ExtentLink {
    dir: PathBuf,
    link: PathBuf,
}

impl ExtentLink {
    fn create(image: &Path, name: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("guestprobe-")
            .tempdir()?
            .into_path();
        let link = dir.join(name);
        std::os::unix::fs::symlink(fs::canonicalize(image)?, &link)?;
        Ok(Self { dir, link })
    }

    fn path(&self) -> &Path {
        &self.link
    }
}

impl Drop for ExtentLink {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.link) {
            warn!(path = %self.link.display(), error = %e, "failed to remove extent symlink");
        }
        if let Err(e) = fs::remove_dir(&self.dir) {
            warn!(path = %self.dir.display(), error = %e, "failed to remove symlink directory");
        }
    }
}

// Sparse extent header layout (VMware Virtual Disk Format 1.1): all fields
// little-endian, sectors of 512 bytes.
const SPARSE_MAGIC: &[u8; 4] = b"KDMV";
const DESC_OFFSET_FIELD: usize = 28;
const DESC_SIZE_FIELD: usize = 36;
const SECTOR_SIZE: u64 = 512;

/// Upper bound on the embedded descriptor size; real descriptors are a few
/// KiB, so a header claiming more than this is corrupt
const MAX_DESC_SECTORS: u64 = 64;

/// Extract the extent file name from an embedded monolithicSparse
/// descriptor, if the image carries one and was renamed away from it
fn renamed_extent(image: &Path) -> std::io::Result<Option<String>> {
    let name = match embedded_extent_name(image)? {
        Some(name) => name,
        None => return Ok(None),
    };
    let current = image.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.is_empty() || name == current {
        return Ok(None);
    }
    Ok(Some(name))
}

fn embedded_extent_name(image: &Path) -> std::io::Result<Option<String>> {
    let mut file = File::open(image)?;

    let mut header = [0u8; 64];
    if file.read_exact(&mut header).is_err() {
        return Ok(None);
    }
    if &header[0..4] != SPARSE_MAGIC {
        return Ok(None);
    }

    let desc_offset = u64::from_le_bytes(
        header[DESC_OFFSET_FIELD..DESC_OFFSET_FIELD + 8]
            .try_into()
            .unwrap(),
    );
    let desc_size = u64::from_le_bytes(
        header[DESC_SIZE_FIELD..DESC_SIZE_FIELD + 8]
            .try_into()
            .unwrap(),
    );
    if desc_offset == 0 || desc_size == 0 {
        // descriptor is not embedded
        return Ok(None);
    }
    // both fields come straight from the file, so treat implausible values
    // as corruption rather than trusting them with an allocation or seek
    if desc_size > MAX_DESC_SECTORS {
        return Ok(None);
    }
    let Some(byte_offset) = desc_offset.checked_mul(SECTOR_SIZE) else {
        return Ok(None);
    };

    file.seek(SeekFrom::Start(byte_offset))?;
    let mut raw = vec![0u8; (desc_size * SECTOR_SIZE) as usize];
    let n = file.read(&mut raw)?;
    raw.truncate(n);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let descriptor = String::from_utf8_lossy(&raw[..end]).into_owned();

    Ok(parse_descriptor(&descriptor))
}

/// Pull the extent file name out of a disk descriptor, but only for
/// monolithicSparse images (other create types keep working when renamed)
fn parse_descriptor(descriptor: &str) -> Option<String> {
    for line in descriptor.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(value) = line.strip_prefix("createType") {
            let value = value.trim_start_matches('=').trim().trim_matches('"');
            if value != "monolithicSparse" {
                return None;
            }
            continue;
        }

        if line.starts_with("RW ") {
            // RW <sectors> SPARSE "<file name>"
            let name = line.splitn(4, ' ').nth(3)?;
            return Some(name.trim().trim_matches('"').to_string());
        }
    }
    None
}
