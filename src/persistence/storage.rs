use super::files::{atomic_write, backup_file, read_file};
use anyhow::Result;
use std::path::PathBuf;

/// Key-value storage for serialized application state.
///
/// Values are whole documents; a write replaces the previous value.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Keep a copy of an unreadable value before it can be overwritten.
    /// Returns a description of where the copy went, if anywhere.
    fn preserve_item(&mut self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Stores each key as `<key>.json` inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        read_file(self.path_for(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        atomic_write(self.path_for(key), value)
    }

    fn preserve_item(&mut self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let backup = backup_file(&path)?;
        Ok(Some(backup.display().to_string()))
    }
}

/// In-memory storage for tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
