//! Registry hive reader backed by the `nt_hive` crate
//!
//! Hives are read fully into memory and re-walked per query; the SOFTWARE
//! hive queries the pipeline makes (one fixed key, two uninstall-key
//! enumerations) make that trade well worth the simpler ownership.

use guestprobe_core::{Error, HiveReader, RegistryView, Result};
use nt_hive::Hive;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Opens hive files with `nt_hive`
pub struct NtHiveReader;

impl HiveReader for NtHiveReader {
    fn open(&self, hive: &Path) -> Result<Box<dyn RegistryView>> {
        let data = fs::read(hive)?;
        // validate up front so a truncated or corrupt hive fails at open
        // instead of silently answering every query with nothing
        Hive::new(data.as_slice())
            .map_err(|e| Error::malformed(format!("{}: {e}", hive.display())))?;
        Ok(Box::new(NtHiveView { data }))
    }
}

struct NtHiveView {
    data: Vec<u8>,
}

impl RegistryView for NtHiveView {
    fn string_value(&self, key_path: &str, value_name: &str) -> Option<String> {
        let hive = Hive::new(self.data.as_slice()).ok()?;
        let root = hive.root_key_node().ok()?;
        let key = root.subpath(key_path)?.ok()?;
        let value = key.value(value_name)?.ok()?;
        match value.string_data() {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(key_path, value_name, error = %e, "value is not string data");
                None
            }
        }
    }

    fn subkeys(&self, key_path: &str) -> Vec<String> {
        let Ok(hive) = Hive::new(self.data.as_slice()) else {
            return Vec::new();
        };
        let Ok(root) = hive.root_key_node() else {
            return Vec::new();
        };
        let Some(Ok(key)) = root.subpath(key_path) else {
            return Vec::new();
        };
        let Some(Ok(subkeys)) = key.subkeys() else {
            return Vec::new();
        };
        subkeys
            .filter_map(|subkey| subkey.ok())
            .filter_map(|subkey| subkey.name().ok().map(|name| name.to_string_lossy()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_rejects_non_hive_data() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not a registry hive").unwrap();
        file.flush().unwrap();

        let err = NtHiveReader.open(file.path()).err().unwrap();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let err = NtHiveReader
            .open(Path::new("/nonexistent/SOFTWARE"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
