//! Frame-by-frame video export driver.

use super::AnimationError;
use crate::scene::Scene;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default export frame rate.
pub const DEFAULT_EXPORT_FPS: u32 = 30;

/// Destination for rendered export frames (the render surface's recorder).
pub trait FrameSink {
    /// Encoded result (e.g. WebM bytes).
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once before the first frame.
    fn begin(&mut self, fps: u32, frame_count: usize) -> Result<(), Self::Error>;

    /// Render and record one frame. `frame` already has presentation overrides merged.
    fn push_frame(&mut self, frame: &Scene, index: usize, time_ms: f64) -> Result<(), Self::Error>;

    /// Finalize the recording.
    fn finish(&mut self) -> Result<Self::Output, Self::Error>;

    /// Discard a recording that will not be finished.
    fn abort(&mut self) {}
}

/// Shared flag used to abort an in-flight export from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Timing for an export run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    pub duration_ms: f64,
    pub fps: u32,
}

impl ExportPlan {
    pub fn new(duration_ms: f64, fps: u32) -> Result<Self, AnimationError> {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(AnimationError::InvalidDuration(duration_ms));
        }
        if fps == 0 {
            return Err(AnimationError::InvalidFrameRate(fps));
        }
        Ok(Self { duration_ms, fps })
    }

    /// Number of frames needed to cover the duration.
    pub fn frame_count(&self) -> usize {
        (self.duration_ms * self.fps as f64 / 1000.0).ceil().max(1.0) as usize
    }

    /// Timestamp (ms) of the frame at `index`.
    pub fn frame_time(&self, index: usize) -> f64 {
        (index as f64 * 1000.0 / self.fps as f64).min(self.duration_ms)
    }
}
