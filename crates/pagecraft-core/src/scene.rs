//! Page scene document: ordered objects plus background.

use crate::animation::AnimatedProperties;
use crate::shapes::{CanvasObject, ObjectId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Background used for new and empty pages.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// Scene errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Malformed scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted page document `{objects, background}`.
///
/// Object order is z-order: later objects draw on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub objects: Vec<CanvasObject>,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a white background.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            background: default_background(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Append an object on top.
    pub fn push(&mut self, object: CanvasObject) {
        self.objects.push(object);
    }

    pub fn get(&self, id: &str) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Z-index of an object.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Remove an object by id.
    pub fn remove(&mut self, id: &str) -> Option<CanvasObject> {
        let idx = self.index_of(id)?;
        Some(self.objects.remove(idx))
    }

    /// Remove every object whose id is in `ids`, returning how many were removed.
    pub fn remove_all(&mut self, ids: &[ObjectId]) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| !ids.contains(&o.id));
        before - self.objects.len()
    }

    /// Move every selected object one step towards the top.
    ///
    /// Walks front-to-back so adjacent selected objects move as a block and keep
    /// their relative order. Returns true if anything moved.
    pub fn bring_forward(&mut self, selected: &[ObjectId]) -> bool {
        let mut moved = false;
        let len = self.objects.len();
        if len < 2 {
            return false;
        }
        for i in (0..len - 1).rev() {
            let here = selected.contains(&self.objects[i].id);
            let above = selected.contains(&self.objects[i + 1].id);
            if here && !above {
                self.objects.swap(i, i + 1);
                moved = true;
            }
        }
        moved
    }

    /// Move every selected object one step towards the bottom (back-to-front pass).
    pub fn send_backwards(&mut self, selected: &[ObjectId]) -> bool {
        let mut moved = false;
        for i in 1..self.objects.len() {
            let here = selected.contains(&self.objects[i].id);
            let below = selected.contains(&self.objects[i - 1].id);
            if here && !below {
                self.objects.swap(i, i - 1);
                moved = true;
            }
        }
        moved
    }

    /// Bounding box of all objects.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(CanvasObject::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Visible objects under a point, topmost first.
    pub fn objects_at_point(&self, point: Point) -> Vec<ObjectId> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.is_visible() && o.bounds().contains(point))
            .map(|o| o.id.clone())
            .collect()
    }

    /// Merge presentation overrides over the stored attributes.
    ///
    /// This is the single point where animation output meets the scene model; ids
    /// in `overrides` that no longer exist are ignored, and properties an
    /// override leaves unset keep their stored values.
    pub fn presented(&self, overrides: &HashMap<ObjectId, AnimatedProperties>) -> Scene {
        let mut scene = self.clone();
        if overrides.is_empty() {
            return scene;
        }
        for object in &mut scene.objects {
            if let Some(props) = overrides.get(&object.id) {
                let mut attrs = object.node_attrs();
                props.apply_to(&mut attrs);
                object.apply_node_attrs(&attrs);
            }
        }
        scene
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty-printed JSON, used for file downloads.
    pub fn to_json_pretty(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the persisted JSON form.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ObjectKind, Paint};

    fn rect(id: &str) -> CanvasObject {
        let mut obj = CanvasObject::new(
            ObjectKind::Rect {
                width: 10.0,
                height: 10.0,
                corner_radius: 0.0,
            },
            Point::ZERO,
            Paint::default(),
        );
        obj.id = id.to_string();
        obj
    }

    fn scene_of(ids: &[&str]) -> Scene {
        let mut scene = Scene::new();
        for id in ids {
            scene.push(rect(id));
        }
        scene
    }

    fn order(scene: &Scene) -> Vec<&str> {
        scene.objects.iter().map(|o| o.id.as_str()).collect()
    }

    fn ids(ids: &[&str]) -> Vec<ObjectId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_scene_is_white_and_empty() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert_eq!(scene.background, "#ffffff");
    }

    #[test]
    fn test_bring_forward_single() {
        let mut scene = scene_of(&["a", "b", "c"]);
        assert!(scene.bring_forward(&ids(&["a"])));
        assert_eq!(order(&scene), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_bring_forward_top_is_noop() {
        let mut scene = scene_of(&["a", "b", "c"]);
        assert!(!scene.bring_forward(&ids(&["c"])));
        assert_eq!(order(&scene), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bring_forward_keeps_block_order() {
        let mut scene = scene_of(&["a", "b", "c", "d"]);
        assert!(scene.bring_forward(&ids(&["a", "b"])));
        assert_eq!(order(&scene), vec!["c", "a", "b", "d"]);

        let mut scene = scene_of(&["a", "b", "c", "d"]);
        assert!(scene.bring_forward(&ids(&["a", "c"])));
        assert_eq!(order(&scene), vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn test_send_backwards() {
        let mut scene = scene_of(&["a", "b", "c", "d"]);
        assert!(!scene.send_backwards(&ids(&["a"])));
        assert!(scene.send_backwards(&ids(&["c", "d"])));
        assert_eq!(order(&scene), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_objects_at_point_topmost_first() {
        let mut scene = scene_of(&["a", "b"]);
        scene.get_mut("b").unwrap().visible = Some(true);
        let hits = scene.objects_at_point(Point::new(5.0, 5.0));
        assert_eq!(hits, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_presented_applies_overrides_without_mutating() {
        let scene = scene_of(&["a", "b"]);
        let mut overrides = HashMap::new();
        let props = AnimatedProperties {
            x: Some(42.0),
            ..Default::default()
        };
        overrides.insert("a".to_string(), props);
        overrides.insert("gone".to_string(), props);

        let shown = scene.presented(&overrides);
        assert_eq!(shown.get("a").unwrap().x, 42.0);
        assert_eq!(shown.get("a").unwrap().y, scene.get("a").unwrap().y);
        assert_eq!(shown.get("b").unwrap().x, 0.0);
        assert_eq!(scene.get("a").unwrap().x, 0.0);
    }

    #[test]
    fn test_json_roundtrip_and_malformed() {
        let scene = scene_of(&["a"]);
        let json = scene.to_json().unwrap();
        assert_eq!(Scene::from_json(&json).unwrap(), scene);
        assert!(matches!(Scene::from_json("{oops"), Err(SceneError::Json(_))));
        let bare = Scene::from_json("{}").unwrap();
        assert_eq!(bare.background, DEFAULT_BACKGROUND);
    }
}
