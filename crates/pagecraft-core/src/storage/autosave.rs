//! Auto-save of the live page.
//!
//! The editor's history hook hands over every saved snapshot; the manager keeps
//! only the latest one and writes it to the store once the interval has passed.

use crate::storage::{PageUpdate, ProjectStore, StorageError, StorageResult};
use std::sync::{Arc, Mutex};

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Manages automatic page persistence.
pub struct AutoSaveManager<S: ProjectStore> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Latest unsaved page JSON, shared with the persist hook.
    pending: Arc<Mutex<Option<String>>>,
    /// (project id, page id) being edited.
    target: Option<(String, String)>,
}

impl<S: ProjectStore> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            pending: Arc::new(Mutex::new(None)),
            target: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Point the manager at a page. Anything pending for the previous page is dropped.
    pub fn set_target(&mut self, project_id: impl Into<String>, page_id: impl Into<String>) {
        self.target = Some((project_id.into(), page_id.into()));
        if let Ok(mut pending) = self.pending.lock() {
            *pending = None;
        }
    }

    pub fn target(&self) -> Option<(&str, &str)> {
        self.target
            .as_ref()
            .map(|(project, page)| (project.as_str(), page.as_str()))
    }

    /// Callback suitable for [`crate::Editor::set_persist_hook`].
    pub fn persist_hook(&self) -> impl FnMut(&str) + Send + 'static {
        let pending = Arc::clone(&self.pending);
        move |json: &str| match pending.lock() {
            Ok(mut slot) => *slot = Some(json.to_string()),
            Err(e) => log::warn!("Auto-save slot poisoned: {}", e),
        }
    }

    /// Queue a payload directly.
    pub fn mark_dirty(&self, json: impl Into<String>) {
        if let Ok(mut slot) = self.pending.lock() {
            *slot = Some(json.into());
        }
    }

    /// Check if the page has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.pending.lock().map(|p| p.is_some()).unwrap_or(false)
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.is_dirty() || self.target.is_none() {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if dirty and the interval elapsed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save().await
    }

    /// Write the pending payload now. Returns false when there was nothing to write.
    ///
    /// On failure the payload stays pending so the next attempt retries it.
    pub async fn save(&mut self) -> StorageResult<bool> {
        let Some((project_id, page_id)) = self.target.clone() else {
            return Err(StorageError::Invalid("no auto-save target".into()));
        };
        let payload = self
            .pending
            .lock()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?
            .take();
        let Some(json) = payload else {
            return Ok(false);
        };

        let result = self
            .storage
            .update_page(&project_id, &page_id, PageUpdate::content(json.clone()))
            .await;
        if let Err(e) = result {
            log::warn!("Auto-save of page {} failed: {}", page_id, e);
            if let Ok(mut slot) = self.pending.lock() {
                if slot.is_none() {
                    *slot = Some(json);
                }
            }
            return Err(e);
        }

        self.last_save = Some(Instant::now());
        log::debug!("Auto-saved page {}", page_id);
        Ok(true)
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::Editor;
    use crate::shapes::ShapePreset;
    use crate::storage::{MemoryStorage, block_on};

    fn setup() -> (AutoSaveManager<MemoryStorage>, String, String) {
        let storage = Arc::new(MemoryStorage::new());
        let project = block_on(storage.create_project("p", None, 100.0, 100.0)).unwrap();
        let page_id = project.pages[0].id.clone();
        let mut manager = AutoSaveManager::new(storage);
        manager.set_target(project.id.clone(), page_id.clone());
        (manager, project.id, page_id)
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert!(manager.target().is_none());
    }

    #[test]
    fn test_hook_marks_dirty() {
        let (manager, _, _) = setup();
        let mut editor = Editor::new();
        editor.set_persist_hook(manager.persist_hook());

        assert!(!manager.is_dirty());
        editor.add_shape(ShapePreset::Rectangle);
        assert!(manager.is_dirty());
        assert!(manager.should_save());
    }

    #[test]
    fn test_save_writes_latest_payload() {
        let (mut manager, project_id, page_id) = setup();
        let mut editor = Editor::new();
        editor.set_persist_hook(manager.persist_hook());
        editor.add_shape(ShapePreset::Rectangle);
        let id = editor.add_shape(ShapePreset::Circle);

        assert!(block_on(manager.save()).unwrap());
        assert!(!manager.is_dirty());
        assert!(!block_on(manager.save()).unwrap());

        let pages = block_on(manager.storage().get_pages(&project_id)).unwrap();
        assert_eq!(pages[0].id, page_id);
        assert!(pages[0].content.contains(&id));
    }

    #[test]
    fn test_interval_gates_maybe_save() {
        let (mut manager, _, _) = setup();
        manager.set_interval(Duration::from_secs(3600));
        manager.mark_dirty("{}");
        assert!(block_on(manager.maybe_save()).unwrap());

        manager.mark_dirty("{\"objects\":[]}");
        assert!(!manager.should_save());
        assert!(!block_on(manager.maybe_save()).unwrap());
        assert!(manager.is_dirty());
    }

    #[test]
    fn test_failed_save_keeps_payload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage);
        manager.set_target("missing", "page");
        manager.mark_dirty("{}");

        let result = block_on(manager.save());
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(manager.is_dirty());
    }
}
