//! Key/value persistence for the mode and pause flag.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ambient_core::EngineError;
use serde_json::{Map, Value};

/// String storage keyed by name, like browser `localStorage`.
pub trait ModeStore {
    /// Returns `Ok(None)` when the key was never written.
    fn load(&self, key: &str) -> Result<Option<String>, EngineError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// In-process store for tests and hosts without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl ModeStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk.
///
/// A missing file reads as empty. A file that is not a JSON object is an
/// `EngineError::Storage` on load and is overwritten on the next save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, EngineError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(EngineError::Storage(format!("{}: {e}", self.path.display()))),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(EngineError::Storage(format!(
                "{}: expected a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(EngineError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }
}

impl ModeStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, EngineError> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), Value::String(value.to_string()));
        let text = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EngineError::Storage(format!("{}: {e}", parent.display())))?;
        }
        fs::write(&self.path, text)
            .map_err(|e| EngineError::Storage(format!("{}: {e}", self.path.display())))
    }
}
