//! Pipeline error types

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for guestprobe operations
///
/// Only two conditions are fatal for a whole run: a mount failure while
/// exposing the image itself, and a device with zero classified partitions.
/// Every other error degrades to "this source contributes nothing" at the
/// call site.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while touching mount directories or database files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required host tool is not installed
    #[error("`{0}` is not installed or not on PATH")]
    ToolMissing(String),

    /// An external mount process failed or never produced a mount
    #[error("mount failed: {0}")]
    MountFailed(String),

    /// An external mount process kept running but the mount never became
    /// visible within the allowed time
    #[error("mount of {path} not visible after {seconds} s")]
    MountTimeout { path: PathBuf, seconds: u64 },

    /// No inspectable partitions were found on a device
    #[error("no inspectable partitions found on {0}")]
    NoPartitions(PathBuf),

    /// An expected file, directory or registry key is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// A descriptor or database exists but cannot be decoded
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Result type alias for guestprobe operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a tool-missing error
    pub fn tool_missing(tool: impl Into<String>) -> Self {
        Error::ToolMissing(tool.into())
    }

    /// Create a mount failure error
    pub fn mount_failed(msg: impl Into<String>) -> Self {
        Error::MountFailed(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a malformed-data error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}
