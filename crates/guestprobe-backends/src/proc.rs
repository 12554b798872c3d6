//! Subprocess plumbing shared by the FUSE-style mount backends
//!
//! The mount tools (`nbdfuse`, `lklfuse`) are started in foreground mode
//! and return before the mount is guaranteed visible, so callers poll the
//! mount directory until it becomes a mount point. The poll is bounded:
//! if the tool exits first the attempt failed, and if nothing happens
//! within the timeout the child is killed and the attempt reported as
//! timed out.

use guestprobe_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default bound on the wait for a mount to become visible
pub const DEFAULT_MOUNT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fail fast when a required host tool is absent
pub(crate) fn require_tool(name: &str) -> Result<()> {
    which::which(name)
        .map(|_| ())
        .map_err(|_| Error::tool_missing(name))
}

/// Create a private mount-point directory
pub(crate) fn make_mount_dir() -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix("guestprobe-")
        .tempdir()?
        .into_path();
    Ok(dir)
}

/// True if `path` is the root of a mounted filesystem
///
/// A FUSE mount gets its own device id, so comparing against the parent
/// directory is sufficient here.
pub(crate) fn is_mountpoint(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Some(parent) = path.parent() else {
        return false;
    };
    match (fs::metadata(path), fs::metadata(parent)) {
        (Ok(dir), Ok(parent)) => dir.dev() != parent.dev(),
        _ => false,
    }
}

/// Spawn a mount tool with captured output
pub(crate) fn spawn(cmd: &mut Command) -> Result<Child> {
    debug!(?cmd, "spawning mount process");
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::mount_failed(format!("failed to execute {:?}: {e}", cmd.get_program())))
}

/// Wait until `dir` becomes a mount point
///
/// Returns the still-running child on success; the caller keeps the FUSE
/// daemon alive by simply dropping the handle (the process exits when the
/// mount is released, and is reaped with the inspecting process).
pub(crate) fn wait_for_mount(mut child: Child, dir: &Path, timeout: Duration) -> Result<Child> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let output = child.wait_with_output()?;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::mount_failed(format!(
                "mount process exited with {status}: {}",
                stderr.trim()
            )));
        }

        if is_mountpoint(dir) {
            debug!(path = %dir.display(), "mount became visible");
            return Ok(child);
        }

        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            // the mount may have appeared between the check and the kill
            let _ = Command::new("fusermount").arg("-u").arg(dir).output();
            return Err(Error::MountTimeout {
                path: dir.to_path_buf(),
                seconds: timeout.as_secs(),
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_directory_is_not_a_mountpoint() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_mountpoint(dir.path()));
    }

    #[test]
    fn test_wait_reports_exited_process() {
        let dir = tempfile::tempdir().unwrap();
        let child = spawn(Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).unwrap();
        let err = wait_for_mount(child, dir.path(), Duration::from_secs(5)).unwrap_err();
        match err {
            Error::MountFailed(msg) => assert!(msg.contains("boom"), "unexpected message: {msg}"),
            other => panic!("expected MountFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_wait_times_out_and_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let child = spawn(Command::new("sleep").arg("30")).unwrap();
        let start = Instant::now();
        let err = wait_for_mount(child, dir.path(), Duration::from_millis(300)).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        match err {
            Error::MountTimeout { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected MountTimeout, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let err = require_tool("guestprobe-no-such-tool").unwrap_err();
        assert!(matches!(err, Error::ToolMissing(_)));
    }
}
