#[cfg(feature = "opencv")]
mod capture;

use anyhow::{Context, Result, anyhow, bail};
use chroma_picker::config::{FitMode, PickerConfig};
use chroma_picker::core_modules::camera::{CameraController, FeedCamera, Permission, frame_feed};
use chroma_picker::core_modules::collection::{ColorStore, SavedColor};
use chroma_picker::core_modules::color_info::Contrast;
use chroma_picker::core_modules::color_name::name_for_hex;
use chroma_picker::core_modules::coordinate_mapper::{DisplayBox, PointerPosition};
use chroma_picker::core_modules::copy_indicator::Clipboard;
use chroma_picker::core_modules::notice::{Notice, NoticeKind, Notifier};
use chroma_picker::core_modules::storage::JsonFileStorage;
use chroma_picker::core_modules::surface::Frame;
use chroma_picker::core_modules::theme::{Theme, ThemePreference};
use chroma_picker::{ChannelTriple, ColorInfo, PickerSession, Tab};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::path::PathBuf;

type Session = PickerSession<JsonFileStorage, FeedCamera>;

#[derive(Parser)]
#[command(
    name = "chroma-picker",
    version,
    about = "Pick single-pixel colors from images and camera frames"
)]
struct Cli {
    /// Storage file for saved colors and the theme (defaults to $CHROMA_PICKER_STORAGE).
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an image and click it at (x, y) in container coordinates.
    Sample {
        image: PathBuf,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        /// Container width the image is drawn into.
        #[arg(long)]
        width: Option<u32>,
        /// Container height the image is drawn into.
        #[arg(long)]
        height: Option<u32>,
        #[arg(long, value_enum, default_value_t = FitArg::Cover)]
        fit: FitArg,
        /// Save the sampled color to the collection.
        #[arg(long)]
        save: bool,
        #[arg(long, value_enum)]
        copy: Option<CopyArg>,
    },
    /// Describe a hex color.
    Inspect { hex: String },
    /// List saved colors, newest first.
    Saved,
    /// Make a saved color current and show it.
    Select { id: String },
    /// Delete one saved color.
    Delete { id: String },
    /// Delete every saved color.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Show or change the theme.
    Theme {
        #[arg(long, conflicts_with = "set")]
        toggle: bool,
        #[arg(long, value_enum)]
        set: Option<ThemeArg>,
    },
    /// Start the camera and click the live frame at (x, y) in display coordinates.
    Camera {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        /// Serve this image as the camera frame instead of a real device.
        #[arg(long)]
        frame: Option<PathBuf>,
        #[arg(long)]
        device: Option<String>,
        /// Size the frame is displayed at, as WIDTHxHEIGHT. Defaults to the frame size.
        #[arg(long, value_parser = parse_display)]
        display: Option<(f64, f64)>,
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Cover,
    Contain,
}

impl From<FitArg> for FitMode {
    fn from(fit: FitArg) -> Self {
        match fit {
            FitArg::Cover => FitMode::Cover,
            FitArg::Contain => FitMode::Contain,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CopyArg {
    Hex,
    Rgb,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

fn parse_display(value: &str) -> Result<(f64, f64), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: f64 = width.trim().parse().map_err(|_| format!("bad width {width:?}"))?;
    let height: f64 = height.trim().parse().map_err(|_| format!("bad height {height:?}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("display size must be positive".to_string());
    }
    Ok((width, height))
}

/// Prints notices the way a toast would show them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: Notice) {
        let line = match &notice.title {
            Some(title) => format!("{title}: {}", notice.description),
            None => notice.description.clone(),
        };
        match notice.kind {
            NoticeKind::Info => eprintln!("{line}"),
            NoticeKind::Error => eprintln!("error: {line}"),
        }
    }
}

/// There is no system clipboard here; copied text goes to stdout.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn copy_text(&mut self, text: &str) {
        println!("{text}");
    }
}

fn open_session(config: PickerConfig, camera: FeedCamera, display: DisplayBox) -> Session {
    debug!("storage at {}", config.storage_path.display());
    let storage = JsonFileStorage::new(&config.storage_path);
    let store = ColorStore::open(storage.clone());
    let theme = ThemePreference::open(storage);
    PickerSession::new(
        config,
        store,
        theme,
        CameraController::new(camera, display),
        Box::new(StdoutClipboard),
        Box::new(ConsoleNotifier),
    )
}

/// A session whose camera has no devices; for commands that never use it.
fn open_offline_session(config: PickerConfig) -> Session {
    let (camera, _producer) = frame_feed(Vec::new(), Permission::Granted);
    open_session(config, camera, DisplayBox::sized(0.0, 0.0))
}

fn print_color(color: &ColorInfo) {
    println!("hex:      {}", color.hex());
    println!("rgb:      {}", color.rgb());
    if let Some(name) = color.name() {
        println!("name:     {name}");
    }
    println!("contrast: {}", color.contrast());
}

fn print_saved(color: &SavedColor) {
    let when = chrono::DateTime::from_timestamp_millis(color.timestamp())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| color.timestamp().to_string());
    let name = color.color().name().map(|n| n.to_string()).unwrap_or_default();
    println!("{}  {}  {:<18} {:<10} {}", color.id(), color.hex(), color.color().rgb(), name, when);
}

fn warn_if_degraded(session: &Session) {
    if session.persistence_degraded() {
        eprintln!(
            "warning: could not write {}; changes were not saved",
            session.config().storage_path.display()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = PickerConfig::from_env();
    if let Some(path) = cli.storage {
        config.storage_path = path;
    }

    match cli.command {
        Command::Sample { image, x, y, width, height, fit, save, copy } => {
            config.container_width = width.unwrap_or(config.container_width);
            config.container_height = height.unwrap_or(config.container_height);
            config.fit = fit.into();
            let container_width = config.container_width;
            let container_height = config.container_height;

            let mut session = open_offline_session(config);
            session
                .load_image_file(&image)
                .with_context(|| format!("failed to load {}", image.display()))?;
            if session.click_image(PointerPosition::new(x, y)).is_none() {
                bail!("no sample at ({x}, {y}) on the {container_width}x{container_height} canvas");
            }
            finish_sample(&mut session, save, copy);
        }
        Command::Inspect { hex } => match ChannelTriple::from_hex(&hex) {
            Ok(triple) => print_color(&ColorInfo::from(triple)),
            Err(e) => {
                eprintln!("warning: {e}");
                println!("name:     {}", name_for_hex(&hex));
                println!("contrast: {}", Contrast::for_hex(&hex));
            }
        },
        Command::Saved => {
            let session = open_offline_session(config);
            if session.saved().is_empty() {
                println!("No saved colors yet.");
            }
            for color in session.saved() {
                print_saved(color);
            }
        }
        Command::Select { id } => {
            let mut session = open_offline_session(config);
            let color = session
                .select_saved(&id)
                .ok_or_else(|| anyhow!("no saved color with id {id}"))?;
            print_color(color);
        }
        Command::Delete { id } => {
            let mut session = open_offline_session(config);
            if !session.delete_saved(&id) {
                bail!("no saved color with id {id}");
            }
            warn_if_degraded(&session);
        }
        Command::Clear { yes } => {
            let mut session = open_offline_session(config);
            let count = session.saved().len();
            if !yes {
                bail!("refusing to delete {count} saved colors without --yes");
            }
            session.clear_saved();
            warn_if_degraded(&session);
        }
        Command::Theme { toggle, set } => {
            let mut session = open_offline_session(config);
            if toggle {
                session.toggle_theme();
            } else if let Some(theme) = set {
                session.set_theme(theme.into());
            }
            println!("{}", session.theme());
        }
        Command::Camera { x, y, frame, device, display, save } => {
            let (camera, display) = start_camera_source(frame, device.as_deref(), display)?;
            let mut session = open_session(config, camera, display);
            if session.select_tab(Tab::Camera, device.as_deref()).await != Tab::Camera {
                bail!("camera unavailable");
            }
            let sampled = session.click_camera(PointerPosition::new(x, y)).is_some();
            session.select_tab(Tab::Upload, None).await;
            if !sampled {
                bail!(
                    "no sample at ({x}, {y}) on the {}x{} display",
                    display.width,
                    display.height
                );
            }
            finish_sample(&mut session, save, None);
        }
    }
    Ok(())
}

fn finish_sample(session: &mut Session, save: bool, copy: Option<CopyArg>) {
    if let Some(color) = session.current() {
        print_color(color);
    }
    if save {
        if let Some(saved) = session.save_current() {
            println!("id:       {}", saved.id());
        }
        warn_if_degraded(session);
    }
    match copy {
        Some(CopyArg::Hex) => {
            session.copy_hex();
        }
        Some(CopyArg::Rgb) => {
            session.copy_rgb();
        }
        None => {}
    }
}

/// Wires a frame producer to a new camera. `--frame` serves a still image; otherwise
/// a real device is used when built with OpenCV.
fn start_camera_source(
    frame: Option<PathBuf>,
    device: Option<&str>,
    display: Option<(f64, f64)>,
) -> Result<(FeedCamera, DisplayBox)> {
    if let Some(path) = frame {
        let image =
            image::open(&path).with_context(|| format!("failed to load {}", path.display()))?;
        let still = Frame::from(image.to_rgba8());
        let (width, height) = display.unwrap_or((still.width as f64, still.height as f64));
        let devices = vec![device.unwrap_or("still").to_string()];
        let (camera, producer) = frame_feed(devices, Permission::Granted);
        tokio::spawn(producer.serve_still(still));
        return Ok((camera, DisplayBox::sized(width, height)));
    }
    open_device_camera(device, display)
}

#[cfg(feature = "opencv")]
fn open_device_camera(
    device: Option<&str>,
    display: Option<(f64, f64)>,
) -> Result<(FeedCamera, DisplayBox)> {
    let (width, height) = display.context("--display WIDTHxHEIGHT is required with a real camera")?;
    let devices = vec![device.unwrap_or(capture::DEFAULT_DEVICE).to_string()];
    let (camera, producer) = frame_feed(devices, Permission::Granted);
    tokio::spawn(capture::serve_device(producer));
    Ok((camera, DisplayBox::sized(width, height)))
}

#[cfg(not(feature = "opencv"))]
fn open_device_camera(
    _device: Option<&str>,
    _display: Option<(f64, f64)>,
) -> Result<(FeedCamera, DisplayBox)> {
    bail!("no camera source: pass --frame <image> or build with the `opencv` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_sizes_parse() {
        assert_eq!(parse_display("960x540"), Ok((960.0, 540.0)));
        assert_eq!(parse_display("640X480"), Ok((640.0, 480.0)));
        assert!(parse_display("960").is_err());
        assert!(parse_display("0x10").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn theme_flags_conflict() {
        let both = ["chroma-picker", "theme", "--toggle", "--set", "dark"];
        assert!(Cli::try_parse_from(both).is_err());
        let sample = [
            "chroma-picker", "sample", "a.png", "--x", "1", "--y", "2", "--fit", "contain",
        ];
        assert!(Cli::try_parse_from(sample).is_ok());
    }
}
