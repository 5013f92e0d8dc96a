//! Keyframe animation: tracks, easing, playback and video export.

mod easing;
mod engine;
mod export;
mod track;

pub use easing::{Easing, UnknownEasing};
pub use engine::{AnimationEngine, AnimationState, PlaybackState};
pub use export::{CancelToken, DEFAULT_EXPORT_FPS, ExportPlan, FrameSink};
pub use track::{AnimatedProperties, Keyframe, ObjectAnimation};

use thiserror::Error;

/// Smallest allowed animation length in milliseconds.
pub const MIN_DURATION_MS: f64 = 100.0;

/// Animation length for new scenes in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 5000.0;

/// Animation errors.
#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("Export cancelled")]
    Cancelled,

    #[error("Invalid export duration: {0}ms")]
    InvalidDuration(f64),

    #[error("Invalid export frame rate: {0}")]
    InvalidFrameRate(u32),

    #[error("Frame sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Malformed animation JSON: {0}")]
    Json(#[from] serde_json::Error),
}
