//! Multi-page projects. Only the live page is mounted in an [`Editor`]; the others
//! are held as serialized JSON.

use crate::animation::AnimationState;
use crate::editor::Editor;
use crate::scene::DEFAULT_BACKGROUND;
use chrono::{DateTime, Utc};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON of an empty white page.
pub fn blank_page_content() -> String {
    serde_json::json!({ "objects": [], "background": DEFAULT_BACKGROUND }).to_string()
}

/// One page of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// 1-based position within the project.
    pub page_number: u32,
    /// Serialized `{objects, background}` document.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animations: Option<AnimationState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(page_number: u32, width: f64, height: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            width,
            height,
            page_number,
            content: blank_page_content(),
            animations: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Replace the content and bump `updated_at`.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
        self.updated_at = Utc::now();
    }

    /// Copy with a new id and fresh timestamps.
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// An ordered collection of pages with one live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub pages: Vec<Page>,
    /// Index of the page mounted in the editor.
    #[serde(default)]
    pub live: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// New project with one blank page.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            pages: vec![Page::new(1, width, height)],
            live: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn live_page(&self) -> Option<&Page> {
        self.pages.get(self.live)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn renumber(&mut self) {
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.page_number = i as u32 + 1;
        }
        self.updated_at = Utc::now();
    }

    /// Append a blank page sized like the last one. Returns its index.
    pub fn add_page(&mut self) -> usize {
        let size = self
            .pages
            .last()
            .map_or(Size::new(1080.0, 1080.0), Page::size);
        self.pages
            .push(Page::new(self.pages.len() as u32 + 1, size.width, size.height));
        self.updated_at = Utc::now();
        self.pages.len() - 1
    }

    /// Insert a copy of the page at `index` right after it. Returns the copy's index.
    pub fn duplicate_page(&mut self, index: usize) -> Option<usize> {
        let copy = self.pages.get(index)?.duplicate();
        self.pages.insert(index + 1, copy);
        if self.live > index {
            self.live += 1;
        }
        self.renumber();
        Some(index + 1)
    }

    /// Remove the page at `index`. The last remaining page cannot be deleted.
    pub fn delete_page(&mut self, index: usize) -> Option<Page> {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return None;
        }
        let removed = self.pages.remove(index);
        if self.live > index || self.live >= self.pages.len() {
            self.live = self.live.saturating_sub(1);
        }
        self.renumber();
        Some(removed)
    }

    /// Write the editor's scene and animation tracks into the live page.
    pub fn store_live(&mut self, editor: &Editor) {
        let Some(page) = self.pages.get_mut(self.live) else {
            return;
        };
        match editor.to_json() {
            Ok(json) => page.set_content(json),
            Err(e) => log::warn!("Failed to serialize live page: {}", e),
        }
        let state = editor.animation().state();
        page.animations = (!state.animations.is_empty()).then_some(state);
    }

    /// Mount the live page into `editor`.
    pub fn mount_live(&self, editor: &mut Editor) {
        let Some(page) = self.live_page() else {
            return;
        };
        editor.set_page_size(page.size());
        editor.load_json_lenient(&page.content);
        editor
            .animation_mut()
            .load_state(page.animations.clone().unwrap_or_default());
    }

    /// Store the live page and mount the page at `index`.
    pub fn switch_to(&mut self, index: usize, editor: &mut Editor) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.store_live(editor);
        self.live = index;
        self.mount_live(editor);
        log::debug!("Switched to page {}", index + 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedProperties, Keyframe};
    use crate::shapes::ShapePreset;

    #[test]
    fn test_new_project_has_blank_page() {
        let project = Project::new("Poster", 800.0, 600.0);
        assert_eq!(project.page_count(), 1);
        let page = project.live_page().unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.size(), Size::new(800.0, 600.0));

        let mut editor = Editor::new();
        editor.load_json(&page.content).unwrap();
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_add_duplicate_delete_renumber() {
        let mut project = Project::new("Deck", 100.0, 100.0);
        assert_eq!(project.add_page(), 1);
        assert_eq!(project.duplicate_page(0), Some(1));
        assert_eq!(project.page_count(), 3);
        let numbers: Vec<u32> = project.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_ne!(project.pages[0].id, project.pages[1].id);

        assert!(project.delete_page(0).is_some());
        assert!(project.delete_page(0).is_some());
        assert!(project.delete_page(0).is_none());
        assert_eq!(project.pages[0].page_number, 1);
    }

    #[test]
    fn test_delete_adjusts_live_index() {
        let mut project = Project::new("Deck", 100.0, 100.0);
        project.add_page();
        project.add_page();
        project.live = 2;
        project.delete_page(2);
        assert_eq!(project.live, 1);
        project.delete_page(0);
        assert_eq!(project.live, 0);
    }

    #[test]
    fn test_switch_preserves_pages() {
        let mut project = Project::new("Deck", 200.0, 200.0);
        project.add_page();
        let mut editor = Editor::new();
        project.mount_live(&mut editor);

        let id = editor.add_shape(ShapePreset::Star);
        editor
            .animation_mut()
            .add_keyframe(&id, Keyframe::new(0.0, AnimatedProperties::at(1.0, 2.0)));
        assert!(project.switch_to(1, &mut editor));
        assert!(editor.scene().is_empty());
        assert!(editor.animation().track(&id).is_none());

        assert!(project.switch_to(0, &mut editor));
        assert!(editor.scene().contains(&id));
        assert!(editor.animation().track(&id).is_some());
        assert!(!project.switch_to(9, &mut editor));
    }

    #[test]
    fn test_page_json_shape() {
        let page = Page::new(3, 10.0, 20.0);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["pageNumber"], 3);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("animations").is_none());
    }
}
