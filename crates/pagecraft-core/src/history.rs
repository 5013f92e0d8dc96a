//! Linear undo/redo log over serialized scene snapshots.

use crate::scene::Scene;
use std::fmt;

/// Callback invoked with the serialized page payload after every save.
pub type PersistHook = Box<dyn FnMut(&str) + Send>;

/// Undo/redo history.
///
/// Holds immutable JSON snapshots and an index into them. The log is never
/// empty: index 0 is seeded with an empty white scene until [`History::reset`]
/// seeds it with loaded content.
pub struct History {
    entries: Vec<String>,
    index: usize,
    /// Set while a snapshot is being replayed so the replay cannot push entries.
    suppressed: bool,
    limit: Option<usize>,
    persist: Option<PersistHook>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("index", &self.index)
            .field("suppressed", &self.suppressed)
            .field("limit", &self.limit)
            .field("persist", &self.persist.is_some())
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history whose only entry is an empty scene.
    pub fn new() -> Self {
        Self {
            entries: vec![serialize(&Scene::new())],
            index: 0,
            suppressed: false,
            limit: None,
            persist: None,
        }
    }

    /// Create a history that keeps at most `limit` entries (minimum 1).
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::new()
        }
    }

    /// Install the persistence callback.
    pub fn set_persist_hook(&mut self, hook: impl FnMut(&str) + Send + 'static) {
        self.persist = Some(Box::new(hook));
    }

    pub fn clear_persist_hook(&mut self) {
        self.persist = None;
    }

    /// Discard the log and seed it with `scene` as the only entry.
    pub fn reset(&mut self, scene: &Scene) {
        self.entries.clear();
        self.entries.push(serialize(scene));
        self.index = 0;
        self.suppressed = false;
    }

    /// Record a snapshot of `scene`.
    ///
    /// Truncates any redoable entries, appends, and moves the index to the new end.
    /// Returns false (and records nothing) while a replay is in progress.
    pub fn save(&mut self, scene: &Scene) -> bool {
        if self.suppressed {
            log::debug!("History save ignored during replay");
            return false;
        }

        let snapshot = serialize(scene);
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
                self.index -= excess;
            }
        }

        log::debug!("History saved entry {} of {}", self.index + 1, self.entries.len());

        if let Some(persist) = self.persist.as_mut() {
            persist(&self.entries[self.index]);
        }
        true
    }

    /// Step back one entry and return the scene to restore.
    pub fn undo(&mut self) -> Option<Scene> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        log::debug!("History undo to entry {}", self.index);
        self.current()
    }

    /// Step forward one entry and return the scene to restore.
    pub fn redo(&mut self) -> Option<Scene> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        log::debug!("History redo to entry {}", self.index);
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Mark the start of a snapshot replay.
    pub fn begin_replay(&mut self) {
        self.suppressed = true;
    }

    /// Mark the end of a snapshot replay.
    pub fn end_replay(&mut self) {
        self.suppressed = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.suppressed
    }

    /// Scene at the current index.
    pub fn current(&self) -> Option<Scene> {
        let json = self.entries.get(self.index)?;
        match Scene::from_json(json) {
            Ok(scene) => Some(scene),
            Err(e) => {
                log::warn!("Discarding unreadable history entry {}: {}", self.index, e);
                None
            }
        }
    }
}

fn serialize(scene: &Scene) -> String {
    // Scene serialization only fails for non-string map keys, which the model never has.
    serde_json::to_string(scene).unwrap_or_else(|e| {
        log::warn!("Failed to serialize scene snapshot: {}", e);
        String::from("{}")
    })
}
