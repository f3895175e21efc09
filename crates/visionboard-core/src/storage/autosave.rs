//! Auto-save for boards.
//!
//! Tracks unsaved changes and writes the whole canvas set back to storage
//! once the interval has elapsed.

use crate::canvas::CanvasSet;
use crate::canvas_io::{self, CanvasIoResult, LoadOutcome};
use crate::session::SessionStore;
use crate::storage::{Storage, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key holding a copy of the most recently saved board.
pub const LAST_BOARD_KEY: &str = "__last_board__";

/// Manages automatic board persistence.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether the board has unsaved changes.
    dirty: bool,
    /// Storage key of the board being edited.
    board_key: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            board_key: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the board as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set the key the board is saved under (e.g. `users/<uid>/board`).
    pub fn set_board_key(&mut self, key: Option<String>) {
        self.board_key = key;
    }

    pub fn board_key(&self) -> Option<&str> {
        self.board_key.as_deref()
    }

    /// Whether the board is dirty and the interval has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if [`should_save`](Self::should_save). Returns whether a save happened.
    pub async fn maybe_save(
        &mut self,
        canvases: &CanvasSet,
        sessions: &SessionStore,
    ) -> CanvasIoResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(canvases, sessions).await?;
        Ok(true)
    }

    /// Save immediately under the board key and [`LAST_BOARD_KEY`].
    ///
    /// Without a board key only the last-board copy is written.
    pub async fn save(&mut self, canvases: &CanvasSet, sessions: &SessionStore) -> CanvasIoResult<()> {
        if let Some(key) = &self.board_key {
            canvas_io::save_canvases(self.storage.as_ref(), key, canvases, sessions).await?;
        }
        canvas_io::save_canvases(self.storage.as_ref(), LAST_BOARD_KEY, canvases, sessions).await?;

        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Load the board stored under `key` and make it the current board.
    pub async fn load(&mut self, key: &str, sessions: &mut SessionStore) -> LoadOutcome {
        let outcome = canvas_io::load_canvases(self.storage.as_ref(), key, sessions).await;
        self.board_key = Some(key.to_string());
        self.dirty = false;
        self.last_save = Some(Instant::now());
        outcome
    }

    /// Load the most recently saved board, if any was saved.
    pub async fn load_last(&mut self, sessions: &mut SessionStore) -> Option<LoadOutcome> {
        match self.storage.exists(LAST_BOARD_KEY).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                log::warn!("Could not check for last board: {}", e);
                return None;
            }
        }
        let outcome = canvas_io::load_canvases(self.storage.as_ref(), LAST_BOARD_KEY, sessions).await;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Some(outcome)
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.storage.delete(key).await
    }

    /// List saved board keys, excluding [`LAST_BOARD_KEY`].
    pub async fn list_boards(&self) -> StorageResult<Vec<String>> {
        let mut keys = self.storage.list().await?;
        keys.retain(|key| key != LAST_BOARD_KEY);
        Ok(keys)
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.storage.exists(key).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// Create the platform storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::FileStorage>> {
    Ok(Arc::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = crate::storage::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformAutoSaveManager = AutoSaveManager<PlatformStorage>;

/// Create an auto-save manager over the platform storage.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_autosave_manager() -> StorageResult<PlatformAutoSaveManager> {
    let storage = create_default_storage()?;
    Ok(AutoSaveManager::new(storage))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, CanvasDocument};
    use crate::elements::ElementTemplate;
    use crate::storage::{MemoryStorage, block_on};
    use kurbo::Point;

    fn board(name: &str) -> CanvasSet {
        let mut canvas = Canvas::with_document(CanvasDocument::named(name));
        canvas.add_element(ElementTemplate::Text, Point::new(10.0, 20.0));
        CanvasSet::from_documents(vec![canvas.into_document()])
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_autosave_dirty_flag() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.mark_dirty();
        assert!(manager.is_dirty());
        assert!(manager.should_save());
    }

    #[test]
    fn test_maybe_save_respects_interval() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.set_interval(Duration::from_secs(3600));
        let sessions = SessionStore::new();
        let set = board("Goals");

        assert!(!block_on(manager.maybe_save(&set, &sessions)).unwrap());
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&set, &sessions)).unwrap());
        assert!(!manager.is_dirty());

        manager.mark_dirty();
        assert!(!block_on(manager.maybe_save(&set, &sessions)).unwrap());
    }

    #[test]
    fn test_save_writes_board_and_last_copy() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        manager.set_board_key(Some("users/7/board".into()));
        block_on(manager.save(&board("Goals"), &SessionStore::new())).unwrap();

        assert!(block_on(storage.exists("users/7/board")).unwrap());
        assert!(block_on(storage.exists(LAST_BOARD_KEY)).unwrap());
    }

    #[test]
    fn test_autosave_load_last() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let mut sessions = SessionStore::new();
        assert!(block_on(manager.load_last(&mut sessions)).is_none());

        manager.mark_dirty();
        block_on(manager.save(&board("Test Board"), &sessions)).unwrap();

        let mut other = AutoSaveManager::new(manager.storage().clone());
        let outcome = block_on(other.load_last(&mut sessions)).unwrap();
        assert!(outcome.error.is_none());
        let doc = outcome.deserialized.canvases.iter().next().unwrap();
        assert_eq!(doc.name, "Test Board");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_load_sets_board_key() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let mut sessions = SessionStore::new();
        let outcome = block_on(manager.load("users/1/board", &mut sessions));
        assert!(outcome.deserialized.canvases.is_empty());
        assert_eq!(manager.board_key(), Some("users/1/board"));
    }

    #[test]
    fn test_list_excludes_last_board_key() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.set_board_key(Some("local".into()));
        block_on(manager.save(&board("Goals"), &SessionStore::new())).unwrap();

        let list = block_on(manager.list_boards()).unwrap();
        assert_eq!(list, vec!["local".to_string()]);
    }
}
