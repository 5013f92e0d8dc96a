//! Editor session: the live scene plus every command that mutates it.

use crate::animation::{AnimationEngine, AnimationError, CancelToken, FrameSink};
use crate::camera::Camera;
use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::history::History;
use crate::scene::{Scene, SceneError};
use crate::shapes::{
    CanvasObject, ObjectId, ObjectPatch, ShapePreset, StyleDefaults, image_object, new_object_id,
    stroke_object, text_object,
};
use crate::snap::{Guide, SnapState, snap_position};
use kurbo::{Point, Size};

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// One editing session over a single live page.
#[derive(Debug)]
pub struct Editor {
    scene: Scene,
    /// Selected ids; order is irrelevant.
    selection: Vec<ObjectId>,
    style: StyleDefaults,
    history: History,
    clipboard: Clipboard,
    animation: AnimationEngine,
    snap: SnapState,
    camera: Camera,
    page_size: Size,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut editor = Self {
            scene: Scene::new(),
            selection: Vec::new(),
            style: StyleDefaults::default(),
            history: History::with_limit(config.history_limit),
            clipboard: Clipboard::with_offset(config.paste_offset),
            animation: AnimationEngine::with_durations(
                config.default_animation_duration,
                config.min_animation_duration,
            ),
            snap: SnapState::default(),
            camera: Camera::new(),
            page_size: config.page_size(),
            config,
        };
        editor.fit_to_container();
        editor
    }

    // --- Accessors ---

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn selected_objects(&self) -> impl Iterator<Item = &CanvasObject> {
        self.scene
            .objects
            .iter()
            .filter(|o| self.selection.contains(&o.id))
    }

    pub fn style(&self) -> &StyleDefaults {
        &self.style
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn animation(&self) -> &AnimationEngine {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationEngine {
        &mut self.animation
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// Active snapping guides for the current drag.
    pub fn guides(&self) -> &[Guide] {
        self.snap.guides()
    }

    /// The scene with animation overrides merged, as the surface should draw it.
    pub fn presented(&self) -> Scene {
        self.animation.presented(&self.scene)
    }

    /// Forward every history save to `hook` with the serialized page payload.
    pub fn set_persist_hook(&mut self, hook: impl FnMut(&str) + Send + 'static) {
        self.history.set_persist_hook(hook);
    }

    // --- Selection ---

    /// Make `id` the sole selection. Unknown ids clear the selection.
    pub fn select(&mut self, id: &str) {
        self.selection.clear();
        self.add_to_selection(id);
    }

    pub fn add_to_selection(&mut self, id: &str) {
        if self.scene.contains(id) && !self.is_selected(id) {
            self.selection.push(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self) {
        self.selection = self.scene.objects.iter().map(|o| o.id.clone()).collect();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s == id)
    }

    /// Whether the surface should let the user drag `id`.
    pub fn is_draggable(&self, id: &str) -> bool {
        self.is_selected(id)
            && self
                .scene
                .get(id)
                .is_some_and(|o| o.draggable && !o.is_locked())
    }

    // --- Styling defaults ---

    pub fn set_fill(&mut self, color: impl Into<String>) {
        self.style.fill = color.into();
    }

    pub fn set_stroke(&mut self, color: impl Into<String>) {
        self.style.stroke = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.style.stroke_width = width.max(0.0);
    }

    pub fn set_dash(&mut self, dash: Vec<f64>) {
        self.style.dash = dash;
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.style.font_family = family.into();
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.style.font_size = size.max(1.0);
    }

    // --- Object creation ---

    /// Append an object on top with a fresh id, select it alone and snapshot history.
    pub fn add_object(&mut self, mut object: CanvasObject) -> ObjectId {
        object.id = new_object_id();
        let id = object.id.clone();
        log::debug!("Adding {} {}", object.kind.type_name(), id);
        self.scene.push(object);
        self.selection = vec![id.clone()];
        self.save_history();
        id
    }

    pub fn add_shape(&mut self, preset: ShapePreset) -> ObjectId {
        let object = preset.build(&self.style);
        self.add_object(object)
    }

    pub fn add_text(&mut self, text: &str) -> ObjectId {
        let object = text_object(text, &self.style);
        self.add_object(object)
    }

    /// Add an image by URL, sized to the given natural dimensions.
    pub fn add_image(&mut self, src: &str, width: f64, height: f64) -> ObjectId {
        self.add_object(image_object(src, width, height))
    }

    /// Turn a completed freehand stroke into a line object.
    ///
    /// Strokes with fewer than two points are discarded.
    pub fn finish_stroke(&mut self, points: &[Point]) -> Option<ObjectId> {
        let object = stroke_object(points, &self.style)?;
        Some(self.add_object(object))
    }

    // --- Mutation ---

    /// Apply `patch` to every selected object. Does not snapshot history; call
    /// [`Editor::save_history`] once the edit is visually complete.
    pub fn update_selected(&mut self, patch: &ObjectPatch) -> usize {
        let mut updated = 0;
        for object in &mut self.scene.objects {
            if self.selection.contains(&object.id) {
                patch.apply(object);
                updated += 1;
            }
        }
        updated
    }

    /// Record the current scene in history.
    pub fn save_history(&mut self) -> bool {
        self.history.save(&self.scene)
    }

    pub fn bring_forward(&mut self) -> bool {
        let moved = self.scene.bring_forward(&self.selection);
        if moved {
            self.save_history();
        }
        moved
    }

    pub fn send_backwards(&mut self) -> bool {
        let moved = self.scene.send_backwards(&self.selection);
        if moved {
            self.save_history();
        }
        moved
    }

    /// Remove the selected objects. Their animation tracks are kept but inert.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let removed = self.scene.remove_all(&self.selection);
        self.selection.clear();
        self.save_history();
        log::debug!("Deleted {} object(s)", removed);
        removed
    }

    /// Flip `visible` on one object. Returns the new visibility.
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        let object = self.scene.get_mut(id)?;
        let visible = !object.is_visible();
        object.visible = Some(visible);
        self.save_history();
        Some(visible)
    }

    /// Flip `locked` on one object. Returns the new lock state.
    pub fn toggle_lock(&mut self, id: &str) -> Option<bool> {
        let object = self.scene.get_mut(id)?;
        let locked = !object.is_locked();
        object.locked = Some(locked);
        self.save_history();
        Some(locked)
    }

    pub fn set_background(&mut self, color: impl Into<String>) {
        self.scene.background = color.into();
        self.save_history();
    }

    // --- Dragging ---

    /// Set an object's position without snapping or history.
    pub fn move_object(&mut self, id: &str, position: Point) -> bool {
        match self.scene.get_mut(id) {
            Some(object) => {
                object.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Drag `id` to `proposed`, snapping against the page and other objects.
    ///
    /// Returns the applied position, or `None` when the object cannot be dragged.
    pub fn drag_move(&mut self, id: &str, proposed: Point) -> Option<Point> {
        if !self.is_draggable(id) {
            return None;
        }
        let result = snap_position(
            &self.scene.objects,
            self.page_size,
            id,
            proposed,
            self.config.snap_threshold,
        );
        self.move_object(id, result.position);
        self.snap.set(result.guides);
        Some(result.position)
    }

    /// Finish a drag: clear guides and snapshot history.
    ///
    /// Returns `false` without touching history when no drag step ran.
    pub fn drag_end(&mut self) -> bool {
        if !self.snap.finish() {
            return false;
        }
        self.save_history()
    }

    // --- Clipboard ---

    pub fn copy(&mut self) -> usize {
        let selected: Vec<&CanvasObject> = self
            .scene
            .objects
            .iter()
            .filter(|o| self.selection.contains(&o.id))
            .collect();
        self.clipboard.copy(selected);
        self.clipboard.len()
    }

    /// Paste the clipboard, select the pasted objects and snapshot history.
    pub fn paste(&mut self) -> Vec<ObjectId> {
        let pasted = self.clipboard.paste();
        if pasted.is_empty() {
            return Vec::new();
        }
        let ids: Vec<ObjectId> = pasted.iter().map(|o| o.id.clone()).collect();
        for object in pasted {
            self.scene.push(object);
        }
        self.selection = ids.clone();
        self.save_history();
        ids
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(scene) => {
                self.replay(scene);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(scene) => {
                self.replay(scene);
                true
            }
            None => false,
        }
    }

    fn replay(&mut self, scene: Scene) {
        self.history.begin_replay();
        self.scene = scene;
        let scene = &self.scene;
        self.selection.retain(|id| scene.contains(id));
        self.snap.clear();
        self.history.end_replay();
    }

    // --- Load / save ---

    /// Replace the whole scene with `json`, clear selection and refit zoom.
    ///
    /// History is reseeded with the loaded content so the first undo never reverts
    /// past it.
    pub fn load_json(&mut self, json: &str) -> Result<(), SceneError> {
        let scene = Scene::from_json(json)?;
        self.load_scene(scene);
        Ok(())
    }

    /// Like [`Editor::load_json`] but malformed input leaves an empty scene.
    pub fn load_json_lenient(&mut self, json: &str) {
        if let Err(e) = self.load_json(json) {
            log::warn!("Ignoring malformed page content: {}", e);
            self.load_scene(Scene::new());
        }
    }

    pub fn load_scene(&mut self, scene: Scene) {
        self.animation.stop();
        self.scene = scene;
        self.selection.clear();
        self.snap.clear();
        self.history.reset(&self.scene);
        self.fit_to_container();
        log::info!("Loaded page with {} object(s)", self.scene.len());
    }

    /// Serialize `{objects, background}`.
    pub fn to_json(&self) -> Result<String, SceneError> {
        self.scene.to_json()
    }

    // --- View ---

    pub fn set_page_size(&mut self, size: Size) {
        self.page_size = size;
        self.fit_to_container();
    }

    pub fn set_container_size(&mut self, size: Size) {
        self.config.container_width = size.width;
        self.config.container_height = size.height;
        self.fit_to_container();
    }

    /// Refit zoom so the page fills the container.
    pub fn fit_to_container(&mut self) {
        self.camera.fit_page(
            self.page_size,
            self.config.container_size(),
            self.config.fit_padding,
        );
    }

    // --- Animation ---

    pub fn play(&mut self, now: Instant) {
        self.animation.play(now);
    }

    pub fn pause(&mut self) {
        self.animation.pause();
    }

    pub fn stop(&mut self) {
        self.animation.stop();
    }

    pub fn seek_to(&mut self, time: f64) {
        self.animation.seek_to(&self.scene, time);
    }

    /// Advance playback. Returns whether another frame should be scheduled.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.animation.tick(&self.scene, now)
    }

    /// Export the animation through `surface` at the configured frame rate.
    pub fn export_video<S: FrameSink>(
        &self,
        duration: Option<f64>,
        surface: Option<&mut S>,
        cancel: &CancelToken,
    ) -> Result<Option<S::Output>, AnimationError> {
        self.animation
            .export_video(&self.scene, duration, self.config.export_fps, surface, cancel)
    }
}
