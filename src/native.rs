//! Headless driver for native builds.
//!
//! Loads an image into a session, replays a JSON control script (and/or
//! boxes given on the command line) and writes the resulting crop archive.
//! Optionally saves a PNG of the final canvas.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, LogLevel};
use crate::error::{AnnotatorError, Result};
use crate::export::ExportArchive;
use crate::geometry::{Point, Size};
use crate::interaction::PointerEvent;
use crate::model::BoundingBox;
use crate::render::SoftwareSurface;
use crate::session::{AnnotatorSession, Control, ControlOutcome};

/// Crop boxed regions of an image into a ZIP archive of JPEGs.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Image to annotate
    pub image: PathBuf,

    /// JSON file with an array of controls to replay
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Box to draw, as `x,y,width,height` in fitted image space (repeatable)
    #[arg(long = "box", value_name = "X,Y,W,H")]
    pub boxes: Vec<String>,

    /// Where to write the archive (defaults to the configured archive name)
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Save the final canvas as a PNG
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Canvas size as `WIDTHxHEIGHT`
    #[arg(long, value_name = "WxH")]
    pub canvas: Option<String>,

    /// Log verbosity (overrides the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<CliLogLevel>,
}

/// Log level as accepted on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Parse process arguments and run.
pub fn run() -> Result<()> {
    run_with(Args::parse())
}

/// Run with already-parsed arguments.
pub fn run_with(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };
    if let Some(level) = args.log_level {
        config.preferences.log_level = level.into();
    }
    init_logging(config.preferences.log_level);

    let canvas = match &args.canvas {
        Some(value) => parse_canvas(value)?,
        None => Size::from_pixels(
            config.preferences.canvas_width,
            config.preferences.canvas_height,
        ),
    };

    let mut session = AnnotatorSession::new(config.preferences.clone());
    let bytes = std::fs::read(&args.image)?;
    session.load_image(&bytes, canvas)?;

    let mut archive = None;
    if let Some(path) = &args.script {
        let json = std::fs::read_to_string(path)?;
        let controls: Vec<Control> = serde_json::from_str(&json)
            .map_err(|e| AnnotatorError::script(format!("{}: {}", path.display(), e)))?;
        log::info!("▶️ Replaying {} controls from {:?}", controls.len(), path);
        archive = replay(&mut session, &controls)?;
    }

    for value in &args.boxes {
        let bbox = parse_box(value)?;
        draw_box(&mut session, &bbox);
    }

    if let Some(path) = &args.preview {
        let mut surface = SoftwareSurface::with_background(
            canvas.width as u32,
            canvas.height as u32,
            [32, 32, 32, 255],
        );
        session.render(&mut surface);
        surface
            .into_frame()
            .save(path)
            .map_err(AnnotatorError::Preview)?;
        log::info!("🖼️ Saved preview to {:?}", path);
    }

    // Boxes given on the command line come after the script, so export again.
    let archive = match archive {
        Some(archive) if args.boxes.is_empty() => archive,
        _ => session.export()?,
    };
    write_archive(&archive, args.out)
}

/// Apply `controls` in order, returning the last exported archive.
pub fn replay(
    session: &mut AnnotatorSession,
    controls: &[Control],
) -> Result<Option<ExportArchive>> {
    let mut archive = None;
    for control in controls {
        if let ControlOutcome::Exported(exported) = session.apply(*control)? {
            archive = Some(exported);
        }
    }
    Ok(archive)
}

/// Drag out an image-space box through the current view, as a user would.
pub fn draw_box(session: &mut AnnotatorSession, bbox: &BoundingBox) {
    let transform = session.transform();
    let start = transform.image_to_screen(Point::new(bbox.x, bbox.y));
    let end = transform.image_to_screen(Point::new(bbox.x + bbox.width, bbox.y + bbox.height));

    // Drawing needs draw mode; restore the user's mode afterwards.
    let pan_mode = session.pan_mode();
    if pan_mode {
        session.toggle_pan_mode();
    }
    session.handle_pointer(PointerEvent::Down(start));
    session.handle_pointer(PointerEvent::Move(end));
    session.handle_pointer(PointerEvent::Up(end));
    if pan_mode {
        session.toggle_pan_mode();
    }
}

fn write_archive(archive: &ExportArchive, out: Option<PathBuf>) -> Result<()> {
    for warning in &archive.warnings {
        eprintln!("warning: {}", warning);
    }
    let path = out.unwrap_or_else(|| PathBuf::from(&archive.name));
    std::fs::write(&path, &archive.bytes)?;
    println!("Wrote {} crops to {}", archive.entries.len(), path.display());
    Ok(())
}

fn init_logging(level: LogLevel) {
    // RUST_LOG still takes precedence over the configured level.
    let result = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .try_init();
    if let Err(e) = result {
        eprintln!("Logger already initialized: {}", e);
    }
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_canvas(value: &str) -> Result<Size> {
    let invalid = || AnnotatorError::argument(format!("invalid canvas size '{}'", value));
    let (w, h) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(Size::from_pixels(width, height))
}

/// Parse `x,y,width,height`.
pub fn parse_box(value: &str) -> Result<BoundingBox> {
    let invalid = || AnnotatorError::argument(format!("invalid box '{}'", value));
    let values = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    match values.as_slice() {
        [x, y, width, height] if values.iter().all(|v| v.is_finite()) => {
            Ok(BoundingBox::new(*x, *y, *width, *height))
        }
        _ => Err(invalid()),
    }
}
