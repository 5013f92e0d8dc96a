//! `pagecraft` command-line entry point: page and animation export.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use kurbo::Size;
use pagecraft_core::{AnimationState, CancelToken, Editor, EditorConfig};
use pagecraft_render::{ExportFormat, FfmpegWebmSink, save_page};

#[derive(Parser, Debug)]
#[command(name = "pagecraft", version)]
struct Cli {
    /// Editor configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a page as PNG, JPEG, SVG or JSON (chosen by the output extension).
    Export(ExportArgs),
    /// Export a page's animation as WebM (requires `ffmpeg` on PATH).
    Video(VideoArgs),
}

#[derive(Parser, Debug)]
struct PageArgs {
    /// Input page document (`{objects, background}`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Page width in pixels (defaults to the configured page size).
    #[arg(long)]
    width: Option<f64>,

    /// Page height in pixels (defaults to the configured page size).
    #[arg(long)]
    height: Option<f64>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Output resolution multiplier for raster formats.
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Animation state JSON (`animations`, `totalDuration`).
    #[arg(long)]
    animations: PathBuf,

    /// Output WebM path.
    #[arg(long)]
    out: PathBuf,

    /// Export duration in ms (defaults to the animation's total duration).
    #[arg(long)]
    duration: Option<f64>,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.cmd {
        Command::Export(args) => cmd_export(config, args),
        Command::Video(args) => cmd_video(config, args),
    }
}

fn load_page(config: EditorConfig, args: &PageArgs) -> anyhow::Result<Editor> {
    let json = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read page '{}'", args.in_path.display()))?;

    let mut editor = Editor::with_config(config);
    let default = editor.page_size();
    editor.set_page_size(Size::new(
        args.width.unwrap_or(default.width),
        args.height.unwrap_or(default.height),
    ));
    editor
        .load_json(&json)
        .with_context(|| format!("parse page '{}'", args.in_path.display()))?;
    log::info!(
        "Loaded {} object(s) from {}",
        editor.scene().len(),
        args.in_path.display()
    );
    Ok(editor)
}

fn cmd_export(config: EditorConfig, args: ExportArgs) -> anyhow::Result<()> {
    let Some(format) = ExportFormat::from_path(&args.out) else {
        bail!(
            "cannot infer export format from '{}' (expected .png, .jpg, .svg or .json)",
            args.out.display()
        );
    };
    let editor = load_page(config, &args.page)?;

    save_page(
        editor.scene(),
        editor.page_size(),
        format,
        args.pixel_ratio,
        &args.out,
    )
    .with_context(|| format!("export '{}'", args.out.display()))?;
    Ok(())
}

fn cmd_video(config: EditorConfig, args: VideoArgs) -> anyhow::Result<()> {
    let mut editor = load_page(config, &args.page)?;

    let json = std::fs::read_to_string(&args.animations)
        .with_context(|| format!("read animations '{}'", args.animations.display()))?;
    let state = AnimationState::from_json(&json)
        .with_context(|| format!("parse animations '{}'", args.animations.display()))?;
    editor.animation_mut().load_state(state);

    let mut sink = FfmpegWebmSink::new(editor.page_size(), args.pixel_ratio);
    let bytes = editor
        .export_video(args.duration, Some(&mut sink), &CancelToken::new())
        .context("export video")?
        .context("no render surface")?;

    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    log::info!("Wrote {} ({} bytes)", args.out.display(), bytes.len());
    Ok(())
}
