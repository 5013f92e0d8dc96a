//! PageCraft Core Library
//!
//! Platform-agnostic scene model, editing commands, history, snapping and
//! animation engine for the PageCraft design editor.

pub mod animation;
pub mod camera;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod history;
pub mod project;
pub mod scene;
pub mod shapes;
pub mod snap;
pub mod storage;

pub use animation::{
    AnimatedProperties, AnimationEngine, AnimationError, AnimationState, CancelToken, Easing,
    FrameSink, Keyframe, ObjectAnimation,
};
pub use camera::Camera;
pub use clipboard::Clipboard;
pub use config::{ConfigError, EditorConfig};
pub use editor::Editor;
pub use history::History;
pub use project::{Page, Project};
pub use scene::{Scene, SceneError};
pub use shapes::{CanvasObject, ObjectId, ObjectKind, ObjectPatch, ShapePreset, StyleDefaults};
pub use snap::{Guide, GuideOrientation, SnapKind, SnapResult, snap_position};
pub use storage::{ProjectStore, StorageError, StorageResult};
