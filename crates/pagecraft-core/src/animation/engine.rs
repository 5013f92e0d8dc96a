//! Playback state machine and presentation override layer.

use super::export::{CancelToken, ExportPlan, FrameSink};
use super::track::{AnimatedProperties, Keyframe, ObjectAnimation};
use super::{AnimationError, DEFAULT_DURATION_MS, MIN_DURATION_MS};
use crate::scene::Scene;
use crate::shapes::{NodeAttrs, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Where playback currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Stopped,
    /// Running from `from` ms; `anchor` is the clock value that corresponds to
    /// `from`, captured on the next tick when unset.
    Playing { anchor: Option<Instant>, from: f64 },
    Paused,
}

fn default_total_duration() -> f64 {
    DEFAULT_DURATION_MS
}

/// Serializable animation metadata stored next to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub current_time: f64,
    #[serde(default = "default_total_duration")]
    pub total_duration: f64,
    #[serde(default)]
    pub animations: BTreeMap<ObjectId, ObjectAnimation>,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            total_duration: DEFAULT_DURATION_MS,
            animations: BTreeMap::new(),
        }
    }
}

impl AnimationState {
    pub fn to_json(&self) -> Result<String, AnimationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AnimationError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Keyframe tracks plus playback.
///
/// Interpolated values never touch the scene model. They live in an override map
/// keyed by object id and are merged into a copy of the scene by
/// [`AnimationEngine::presented`] when drawing. Only properties a track animates
/// are overridden; everything else reads through to the scene.
#[derive(Debug, Clone)]
pub struct AnimationEngine {
    animations: BTreeMap<ObjectId, ObjectAnimation>,
    total_duration: f64,
    min_duration: f64,
    current_time: f64,
    playback: PlaybackState,
    overrides: HashMap<ObjectId, AnimatedProperties>,
    /// Attributes captured the first time each object was touched since the last stop.
    originals: HashMap<ObjectId, NodeAttrs>,
}

impl Default for AnimationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::with_durations(DEFAULT_DURATION_MS, MIN_DURATION_MS)
    }

    /// Engine with the given initial length and minimum length (both ms).
    pub fn with_durations(total_duration: f64, min_duration: f64) -> Self {
        let min_duration = if min_duration.is_finite() {
            min_duration.max(0.0)
        } else {
            MIN_DURATION_MS
        };
        let mut engine = Self {
            animations: BTreeMap::new(),
            total_duration: min_duration,
            min_duration,
            current_time: 0.0,
            playback: PlaybackState::Stopped,
            overrides: HashMap::new(),
            originals: HashMap::new(),
        };
        engine.set_duration(total_duration);
        engine
    }

    /// Snapshot of tracks and timing.
    pub fn state(&self) -> AnimationState {
        AnimationState {
            is_playing: self.is_playing(),
            current_time: self.current_time,
            total_duration: self.total_duration,
            animations: self.animations.clone(),
        }
    }

    /// Replace every track and the duration. Playback is stopped first.
    pub fn load_state(&mut self, state: AnimationState) {
        self.stop();
        self.animations = state.animations;
        for track in self.animations.values_mut() {
            track.sort();
        }
        self.set_duration(state.total_duration);
        log::debug!("Loaded {} animation track(s)", self.animations.len());
    }

    // --- Track editing ---

    pub fn add_keyframe(&mut self, id: &str, keyframe: Keyframe) {
        self.animations
            .entry(id.to_string())
            .or_default()
            .insert(keyframe);
    }

    /// Remove the keyframe at `index` (in timestamp order).
    pub fn remove_keyframe(&mut self, id: &str, index: usize) -> Option<Keyframe> {
        let track = self.animations.get_mut(id)?;
        if index >= track.keyframes.len() {
            return None;
        }
        Some(track.keyframes.remove(index))
    }

    /// Replace the keyframe at `index`, re-sorting the track.
    pub fn update_keyframe(&mut self, id: &str, index: usize, keyframe: Keyframe) -> bool {
        let Some(track) = self.animations.get_mut(id) else {
            return false;
        };
        let Some(slot) = track.keyframes.get_mut(index) else {
            return false;
        };
        *slot = keyframe;
        track.sort();
        true
    }

    pub fn set_loop(&mut self, id: &str, looping: bool) {
        self.animations.entry(id.to_string()).or_default().looping = looping;
    }

    pub fn clear_track(&mut self, id: &str) -> Option<ObjectAnimation> {
        self.animations.remove(id)
    }

    pub fn track(&self, id: &str) -> Option<&ObjectAnimation> {
        self.animations.get(id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&ObjectId, &ObjectAnimation)> {
        self.animations.iter()
    }

    /// Drop the tracks of the given objects. Returns how many were removed.
    pub fn remove_tracks_for(&mut self, ids: &[ObjectId]) -> usize {
        let before = self.animations.len();
        self.animations.retain(|id, _| !ids.contains(id));
        before - self.animations.len()
    }

    // --- Timing ---

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Set the animation length, clamped up to the minimum. Keyframes are not rescaled.
    pub fn set_duration(&mut self, duration: f64) -> f64 {
        self.total_duration = if duration.is_finite() {
            duration.max(self.min_duration)
        } else {
            self.min_duration
        };
        self.current_time = self.current_time.min(self.total_duration);
        self.total_duration
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.playback, PlaybackState::Playing { .. })
    }

    // --- Playback ---

    /// Start or resume playback at `now`. Playback that already reached the end
    /// restarts from zero.
    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.current_time >= self.total_duration {
            self.current_time = 0.0;
        }
        self.playback = PlaybackState::Playing {
            anchor: Some(now),
            from: self.current_time,
        };
        log::debug!("Playback started at {}ms", self.current_time);
    }

    /// Halt ticking, keeping the current time and overrides.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.playback = PlaybackState::Paused;
            log::debug!("Playback paused at {}ms", self.current_time);
        }
    }

    /// Halt playback, drop every override and rewind to zero.
    ///
    /// Returns the attributes each touched object had when it was first touched,
    /// for surfaces that wrote interpolated values into their own nodes.
    pub fn stop(&mut self) -> HashMap<ObjectId, NodeAttrs> {
        self.playback = PlaybackState::Stopped;
        self.current_time = 0.0;
        self.overrides.clear();
        std::mem::take(&mut self.originals)
    }

    /// Jump to `time` ms and apply the interpolated values for that instant.
    pub fn seek_to(&mut self, scene: &Scene, time: f64) {
        let time = if time.is_finite() {
            time.clamp(0.0, self.total_duration)
        } else {
            0.0
        };
        self.current_time = time;
        self.apply_at(scene, time);
        if let PlaybackState::Playing { .. } = self.playback {
            self.playback = PlaybackState::Playing {
                anchor: None,
                from: time,
            };
        }
    }

    /// Advance playback to `now`. Returns whether playback is still running.
    ///
    /// Reaching the end pauses on the last frame with `current_time` clamped to
    /// the total duration.
    pub fn tick(&mut self, scene: &Scene, now: Instant) -> bool {
        let PlaybackState::Playing { anchor, from } = self.playback else {
            return false;
        };
        let anchor = match anchor {
            Some(anchor) => anchor,
            None => {
                self.playback = PlaybackState::Playing {
                    anchor: Some(now),
                    from,
                };
                now
            }
        };

        let elapsed = from + now.saturating_duration_since(anchor).as_secs_f64() * 1000.0;
        if elapsed >= self.total_duration {
            self.current_time = self.total_duration;
            self.apply_at(scene, self.total_duration);
            self.playback = PlaybackState::Paused;
            log::debug!("Playback reached the end ({}ms)", self.total_duration);
            return false;
        }

        self.current_time = elapsed;
        self.apply_at(scene, elapsed);
        true
    }

    // --- Presentation ---

    pub fn overrides(&self) -> &HashMap<ObjectId, AnimatedProperties> {
        &self.overrides
    }

    /// The scene as it should be drawn right now.
    pub fn presented(&self, scene: &Scene) -> Scene {
        scene.presented(&self.overrides)
    }

    /// Interpolated attributes at `time` computed from the scene's stored values,
    /// without touching engine state.
    pub fn sample_frame(&self, scene: &Scene, time: f64) -> HashMap<ObjectId, AnimatedProperties> {
        let mut overrides = HashMap::new();
        write_frame(
            &self.animations,
            self.total_duration,
            scene,
            time,
            &mut overrides,
            |_, _| {},
        );
        overrides
    }

    fn apply_at(&mut self, scene: &Scene, time: f64) {
        let originals = &mut self.originals;
        write_frame(
            &self.animations,
            self.total_duration,
            scene,
            time,
            &mut self.overrides,
            |id, attrs| {
                originals.entry(id.to_string()).or_insert(attrs);
            },
        );
    }

    // --- Export ---

    /// Render the animation frame by frame into `surface`.
    ///
    /// `duration` defaults to the total duration. Returns `Ok(None)` when no surface
    /// is available. Playback state and overrides are left untouched.
    pub fn export_video<S: FrameSink>(
        &self,
        scene: &Scene,
        duration: Option<f64>,
        fps: u32,
        surface: Option<&mut S>,
        cancel: &CancelToken,
    ) -> Result<Option<S::Output>, AnimationError> {
        let Some(sink) = surface else {
            log::warn!("Video export skipped: no render surface available");
            return Ok(None);
        };

        let plan = ExportPlan::new(duration.unwrap_or(self.total_duration), fps)?;
        let frame_count = plan.frame_count();
        log::info!(
            "Exporting {} frame(s) at {}fps ({}ms)",
            frame_count,
            plan.fps,
            plan.duration_ms
        );

        sink.begin(plan.fps, frame_count).map_err(sink_error)?;

        let mut overrides = HashMap::new();
        for index in 0..frame_count {
            if cancel.is_cancelled() {
                sink.abort();
                log::info!("Video export cancelled at frame {}", index);
                return Err(AnimationError::Cancelled);
            }
            let time = plan.frame_time(index);
            write_frame(
                &self.animations,
                self.total_duration,
                scene,
                time,
                &mut overrides,
                |_, _| {},
            );
            let frame = scene.presented(&overrides);
            if let Err(e) = sink.push_frame(&frame, index, time) {
                sink.abort();
                return Err(sink_error(e));
            }
        }

        let output = sink.finish().map_err(sink_error)?;
        log::info!("Video export finished");
        Ok(Some(output))
    }
}

fn sink_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> AnimationError {
    AnimationError::Sink(Box::new(e))
}

/// Write one frame's interpolated values into `overrides`.
///
/// Objects with no live node are skipped. `first_touch` sees the stored
/// attributes of each object the first time it receives an override. Values
/// accumulate per property across frames.
fn write_frame(
    animations: &BTreeMap<ObjectId, ObjectAnimation>,
    total_duration: f64,
    scene: &Scene,
    time: f64,
    overrides: &mut HashMap<ObjectId, AnimatedProperties>,
    mut first_touch: impl FnMut(&str, NodeAttrs),
) {
    for (id, track) in animations {
        let Some(props) = track.sample(time, total_duration) else {
            continue;
        };
        let Some(object) = scene.get(id) else {
            log::debug!("Skipping animation track for missing object {}", id);
            continue;
        };
        let current = overrides.entry(id.clone()).or_insert_with(|| {
            first_touch(id.as_str(), object.node_attrs());
            AnimatedProperties::default()
        });
        current.merge(&props);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedProperties, Easing};
    use crate::shapes::{CanvasObject, ObjectKind, Paint};
    use kurbo::Point;
    use std::time::Duration;

    fn scene_with_rect(id: &str) -> Scene {
        let mut obj = CanvasObject::new(
            ObjectKind::Rect {
                width: 50.0,
                height: 50.0,
                corner_radius: 0.0,
            },
            Point::new(20.0, 30.0),
            Paint::default(),
        );
        obj.id = id.to_string();
        obj.rotation = 15.0;
        obj.opacity = 0.8;
        let mut scene = Scene::new();
        scene.push(obj);
        scene
    }

    fn engine_moving(id: &str) -> AnimationEngine {
        let mut engine = AnimationEngine::new();
        engine.add_keyframe(id, Keyframe::new(0.0, AnimatedProperties::at(0.0, 0.0)));
        engine.add_keyframe(
            id,
            Keyframe::new(1000.0, AnimatedProperties::at(100.0, 0.0)).with_easing(Easing::Linear),
        );
        engine
    }

    #[test]
    fn test_seek_interpolates_midpoint() {
        let scene = scene_with_rect("a");
        let mut engine = engine_moving("a");
        engine.seek_to(&scene, 500.0);

        let shown = engine.presented(&scene);
        let a = shown.get("a").unwrap();
        assert!((a.x - 50.0).abs() < 1e-9);
        assert_eq!(a.y, 0.0);
        assert_eq!(engine.current_time(), 500.0);
        // The stored scene is untouched.
        assert_eq!(scene.get("a").unwrap().x, 20.0);
    }

    #[test]
    fn test_set_duration_is_clamped() {
        let mut engine = AnimationEngine::new();
        assert_eq!(engine.set_duration(50.0), 100.0);
        assert_eq!(engine.total_duration(), 100.0);
        engine.set_duration(2500.0);
        assert_eq!(engine.total_duration(), 2500.0);
    }

    #[test]
    fn test_stop_restores_original_attributes() {
        let scene = scene_with_rect("a");
        let before = scene.get("a").unwrap().node_attrs();
        let mut engine = engine_moving("a");

        engine.seek_to(&scene, 2000.0);
        assert_eq!(engine.presented(&scene).get("a").unwrap().x, 100.0);

        let originals = engine.stop();
        assert_eq!(originals.get("a"), Some(&before));
        assert_eq!(engine.presented(&scene), scene);
        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.playback(), PlaybackState::Stopped);
    }

    #[test]
    fn test_play_tick_and_auto_stop() {
        let scene = scene_with_rect("a");
        let mut engine = engine_moving("a");
        engine.set_duration(1000.0);

        let start = Instant::now();
        engine.play(start);
        assert!(engine.is_playing());
        assert!(engine.tick(&scene, start + Duration::from_millis(250)));
        assert!((engine.presented(&scene).get("a").unwrap().x - 25.0).abs() < 1e-6);

        assert!(!engine.tick(&scene, start + Duration::from_millis(1500)));
        assert_eq!(engine.current_time(), 1000.0);
        assert_eq!(engine.playback(), PlaybackState::Paused);
        assert_eq!(engine.presented(&scene).get("a").unwrap().x, 100.0);

        // Playing again from the end restarts at zero.
        let again = start + Duration::from_millis(2000);
        engine.play(again);
        assert!(engine.tick(&scene, again));
        assert_eq!(engine.current_time(), 0.0);
    }

    #[test]
    fn test_pause_keeps_time_and_overrides() {
        let scene = scene_with_rect("a");
        let mut engine = engine_moving("a");
        let start = Instant::now();
        engine.play(start);
        engine.tick(&scene, start + Duration::from_millis(400));
        engine.pause();

        assert!(!engine.tick(&scene, start + Duration::from_millis(900)));
        assert!((engine.current_time() - 400.0).abs() < 1e-6);
        assert!(engine.overrides().contains_key("a"));
    }

    #[test]
    fn test_unanimated_properties_read_through() {
        let mut scene = scene_with_rect("a");
        let mut engine = AnimationEngine::new();
        let x_only = |x| AnimatedProperties {
            x: Some(x),
            ..Default::default()
        };
        engine.add_keyframe("a", Keyframe::new(0.0, x_only(0.0)));
        engine.add_keyframe("a", Keyframe::new(1000.0, x_only(100.0)));
        engine.seek_to(&scene, 500.0);

        let a = scene.get_mut("a").unwrap();
        a.opacity = 0.3;
        a.y = 777.0;

        let shown = engine.presented(&scene);
        let a = shown.get("a").unwrap();
        assert!((a.x - 50.0).abs() < 1e-9);
        assert_eq!(a.y, 777.0);
        assert_eq!(a.opacity, 0.3);
        assert_eq!(engine.overrides()["a"], x_only(50.0));
    }

    #[test]
    fn test_seek_past_end_clamps_before_looping() {
        let scene = scene_with_rect("a");
        let mut engine = engine_moving("a");
        engine.set_loop("a", true);
        engine.set_duration(1000.0);

        engine.seek_to(&scene, 1500.0);
        assert_eq!(engine.current_time(), 1000.0);
        // 1000 wraps to the start of the loop
        assert_eq!(engine.presented(&scene).get("a").unwrap().x, 0.0);

        engine.seek_to(&scene, 250.0);
        assert!((engine.presented(&scene).get("a").unwrap().x - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_object_is_skipped() {
        let scene = Scene::new();
        let mut engine = engine_moving("gone");
        engine.seek_to(&scene, 500.0);
        assert!(engine.overrides().is_empty());
    }

    #[test]
    fn test_track_editing() {
        let mut engine = engine_moving("a");
        assert_eq!(engine.track("a").unwrap().keyframes.len(), 2);

        assert!(engine.update_keyframe("a", 0, Keyframe::new(2000.0, AnimatedProperties::at(5.0, 5.0))));
        let track = engine.track("a").unwrap();
        assert_eq!(track.keyframes[1].timestamp, 2000.0);

        assert!(engine.remove_keyframe("a", 5).is_none());
        assert!(engine.remove_keyframe("a", 0).is_some());
        engine.set_loop("a", true);
        assert!(engine.track("a").unwrap().looping);

        assert_eq!(engine.remove_tracks_for(&["a".to_string()]), 1);
        assert!(engine.track("a").is_none());
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut engine = engine_moving("a");
        engine.set_duration(3000.0);
        let json = engine.state().to_json().unwrap();

        let mut restored = AnimationEngine::new();
        restored.load_state(AnimationState::from_json(&json).unwrap());
        assert_eq!(restored.total_duration(), 3000.0);
        assert_eq!(restored.track("a"), engine.track("a"));

        let sparse = AnimationState::from_json(r#"{"animations":{}}"#).unwrap();
        assert_eq!(sparse.total_duration, DEFAULT_DURATION_MS);
    }

    #[derive(Default)]
    struct RecordingSink {
        fps: u32,
        xs: Vec<f64>,
        fail_at: Option<usize>,
        aborted: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("sink broke")]
    struct SinkBroke;

    impl FrameSink for RecordingSink {
        type Output = usize;
        type Error = SinkBroke;

        fn begin(&mut self, fps: u32, _frame_count: usize) -> Result<(), SinkBroke> {
            self.fps = fps;
            Ok(())
        }

        fn push_frame(&mut self, frame: &Scene, index: usize, _time_ms: f64) -> Result<(), SinkBroke> {
            if self.fail_at == Some(index) {
                return Err(SinkBroke);
            }
            self.xs.push(frame.get("a").map_or(f64::NAN, |o| o.x));
            Ok(())
        }

        fn finish(&mut self) -> Result<usize, SinkBroke> {
            Ok(self.xs.len())
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    #[test]
    fn test_export_renders_every_frame() {
        let scene = scene_with_rect("a");
        let engine = engine_moving("a");
        let mut sink = RecordingSink::default();

        let frames = engine
            .export_video(&scene, Some(1000.0), 10, Some(&mut sink), &CancelToken::new())
            .unwrap();
        assert_eq!(frames, Some(10));
        assert_eq!(sink.fps, 10);
        assert_eq!(sink.xs[0], 0.0);
        assert!((sink.xs[5] - 50.0).abs() < 1e-9);
        assert!(engine.overrides().is_empty());
    }

    #[test]
    fn test_export_without_surface() {
        let engine = engine_moving("a");
        let result = engine
            .export_video::<RecordingSink>(&Scene::new(), None, 30, None, &CancelToken::new())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_export_cancel_and_sink_failure() {
        let scene = scene_with_rect("a");
        let engine = engine_moving("a");

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut sink = RecordingSink::default();
        let err = engine
            .export_video(&scene, Some(1000.0), 10, Some(&mut sink), &cancel)
            .unwrap_err();
        assert!(matches!(err, AnimationError::Cancelled));
        assert!(sink.aborted);

        let mut sink = RecordingSink {
            fail_at: Some(3),
            ..Default::default()
        };
        let err = engine
            .export_video(&scene, Some(1000.0), 10, Some(&mut sink), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, AnimationError::Sink(_)));
        assert!(sink.aborted);
    }
}
