//! In-memory registry fakes shared by the unit tests

use guestprobe_core::{HiveReader, RegistryView, Result};
use std::collections::HashMap;
use std::path::Path;

/// Map-backed registry view
#[derive(Clone, Default)]
pub(crate) struct FakeRegistry {
    values: HashMap<(String, String), String>,
    children: HashMap<String, Vec<String>>,
}

impl FakeRegistry {
    pub(crate) fn set_value(&mut self, key_path: &str, name: &str, value: &str) {
        self.values
            .insert((key_path.to_string(), name.to_string()), value.to_string());
    }

    pub(crate) fn add_subkey(&mut self, key_path: &str, name: &str) {
        self.children
            .entry(key_path.to_string())
            .or_default()
            .push(name.to_string());
    }
}

impl RegistryView for FakeRegistry {
    fn string_value(&self, key_path: &str, value_name: &str) -> Option<String> {
        self.values
            .get(&(key_path.to_string(), value_name.to_string()))
            .cloned()
    }

    fn subkeys(&self, key_path: &str) -> Vec<String> {
        self.children.get(key_path).cloned().unwrap_or_default()
    }
}

/// Hive reader handing out clones of one fake registry for any path
pub(crate) struct FakeHiveReader {
    registry: FakeRegistry,
}

impl FakeHiveReader {
    pub(crate) fn new(registry: FakeRegistry) -> Self {
        Self { registry }
    }
}

impl HiveReader for FakeHiveReader {
    fn open(&self, _hive: &Path) -> Result<Box<dyn RegistryView>> {
        Ok(Box::new(self.registry.clone()))
    }
}
