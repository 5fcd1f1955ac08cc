//! `localStorage`-backed [`ModeStore`].

use ambient_core::EngineError;
use ambient_scene::ModeStore;
use web_sys::Storage;

/// Reads and writes the mode keys in the page's `localStorage`. Without
/// storage (private mode, sandboxed frames) reads are empty and writes fail.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStore for LocalStore {
    fn load(&self, key: &str) -> Result<Option<String>, EngineError> {
        match &self.storage {
            Some(s) => s
                .get_item(key)
                .map_err(|e| EngineError::Storage(format!("localStorage read failed: {e:?}"))),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| EngineError::Storage("localStorage unavailable".into()))?;
        storage
            .set_item(key, value)
            .map_err(|e| EngineError::Storage(format!("localStorage write failed: {e:?}")))
    }
}
