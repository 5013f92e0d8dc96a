//! WebM video recording through a system `ffmpeg` process.

use crate::RenderError;
use crate::raster::Rasterizer;
use crate::svg::{SvgOptions, scene_to_svg};
use kurbo::Size;
use pagecraft_core::{FrameSink, Scene};
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use thiserror::Error;

/// Video recording errors.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("ffmpeg is required for video export, but was not found on PATH")]
    FfmpegMissing,
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[source] io::Error),
    #[error("recording not started")]
    NotStarted,
    #[error("frame size mismatch: got {got_w}x{got_h}, expected {want_w}x{want_h}")]
    FrameSize {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
    #[error("ffmpeg exited with status {status}: {stderr}")]
    Ffmpeg { status: String, stderr: String },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("ffmpeg pipe error: {0}")]
    Io(#[from] io::Error),
}

type Drain = JoinHandle<io::Result<Vec<u8>>>;

/// [`FrameSink`] that rasterizes each frame and streams it into ffmpeg, which
/// encodes VP9 into a WebM container written to its stdout.
pub struct FfmpegWebmSink {
    size: Size,
    pixel_ratio: f64,
    rasterizer: Rasterizer,
    /// Raster size in pixels, known once recording begins.
    dims: Option<(u32, u32)>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,
    frames_written: usize,
}

impl FfmpegWebmSink {
    /// Record a page of `size` at `pixel_ratio`.
    pub fn new(size: Size, pixel_ratio: f64) -> Self {
        Self {
            size,
            pixel_ratio,
            rasterizer: Rasterizer::new(),
            dims: None,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    fn shutdown(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stdout_drain = None;
        self.stderr_drain = None;
        self.dims = None;
    }
}

fn drain(mut source: impl Read + Send + 'static) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<Drain>) -> Result<Vec<u8>, VideoError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| VideoError::Io(io::Error::other("ffmpeg drain thread panicked")))?
            .map_err(VideoError::Io),
        None => Ok(Vec::new()),
    }
}

impl FrameSink for FfmpegWebmSink {
    type Output = Vec<u8>;
    type Error = VideoError;

    fn begin(&mut self, fps: u32, frame_count: usize) -> Result<(), VideoError> {
        if !is_ffmpeg_on_path() {
            return Err(VideoError::FfmpegMissing);
        }
        let width = (self.size.width * self.pixel_ratio).round().max(1.0) as u32;
        let height = (self.size.height * self.pixel_ratio).round().max(1.0) as u32;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", width, height),
            "-r",
            &fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            // yuv420 needs even dimensions
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuva420p",
            "-b:v",
            "0",
            "-crf",
            "32",
            "-f",
            "webm",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(VideoError::Spawn)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VideoError::Io(io::Error::other("failed to open ffmpeg stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VideoError::Io(io::Error::other("failed to open ffmpeg stdout")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VideoError::Io(io::Error::other("failed to open ffmpeg stderr")))?;

        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.dims = Some((width, height));
        self.frames_written = 0;
        log::info!(
            "Recording {} frame(s) at {}x{} {}fps",
            frame_count,
            width,
            height,
            fps
        );
        Ok(())
    }

    fn push_frame(&mut self, frame: &Scene, index: usize, time_ms: f64) -> Result<(), VideoError> {
        let (want_w, want_h) = self.dims.ok_or(VideoError::NotStarted)?;
        let svg = scene_to_svg(frame, self.size, &SvgOptions::default())?;
        let raster =
            self.rasterizer
                .rasterize(&svg, self.size.width, self.size.height, self.pixel_ratio)?;
        if raster.width != want_w || raster.height != want_h {
            return Err(VideoError::FrameSize {
                got_w: raster.width,
                got_h: raster.height,
                want_w,
                want_h,
            });
        }

        let stdin = self.stdin.as_mut().ok_or(VideoError::NotStarted)?;
        stdin.write_all(&raster.data)?;
        self.frames_written += 1;
        log::debug!("Encoded frame {} ({:.1}ms)", index, time_ms);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>, VideoError> {
        drop(self.stdin.take());
        let mut child = self.child.take().ok_or(VideoError::NotStarted)?;
        let status = child.wait()?;
        let stdout = join_drain(self.stdout_drain.take())?;
        let stderr = join_drain(self.stderr_drain.take())?;
        self.dims = None;

        if !status.success() {
            return Err(VideoError::Ffmpeg {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        log::info!(
            "Encoded {} frame(s) into {} bytes of WebM",
            self.frames_written,
            stdout.len()
        );
        Ok(stdout)
    }

    fn abort(&mut self) {
        log::debug!("Aborting recording after {} frame(s)", self.frames_written);
        self.shutdown();
    }
}

impl Drop for FfmpegWebmSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.shutdown();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
