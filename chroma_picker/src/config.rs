//! Configuration for the picker: storage keys, surface defaults and the
//! tunables a host may override.

use std::path::PathBuf;
use std::time::Duration;

/// Storage key holding the saved collection (JSON array, newest first).
pub const SAVED_COLORS_KEY: &str = "savedColors";

/// Storage key holding the theme preference ("light" or "dark").
pub const THEME_KEY: &str = "color-picker-theme";

/// Default width of the upload container, in display pixels.
pub const DEFAULT_CONTAINER_WIDTH: u32 = 480;

/// Default height of the upload container, in display pixels.
/// Matches the fixed 300px picking area.
pub const DEFAULT_CONTAINER_HEIGHT: u32 = 300;

/// How long the "copied" indicator stays raised after a copy.
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

/// Environment variable naming the storage file.
pub const STORAGE_PATH_ENV: &str = "CHROMA_PICKER_STORAGE";

/// Storage file used when nothing else is configured.
pub const DEFAULT_STORAGE_FILE: &str = ".chroma_picker/storage.json";

/// How an uploaded image is drawn into the container canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale until the container is covered; the overflow is cropped evenly.
    #[default]
    Cover,
    /// Scale until the image fits; the uncovered bars stay transparent.
    Contain,
}

/// Configuration for a `PickerSession`.
#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub container_width: u32,
    pub container_height: u32,
    pub fit: FitMode,
    pub storage_path: PathBuf,
    pub copied_indicator: Duration,
}

impl PickerConfig {
    /// Defaults, with the storage path taken from `CHROMA_PICKER_STORAGE` when set.
    pub fn from_env() -> Self {
        let storage_path = std::env::var_os(STORAGE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE));
        Self {
            storage_path,
            ..Self::default()
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            container_width: DEFAULT_CONTAINER_WIDTH,
            container_height: DEFAULT_CONTAINER_HEIGHT,
            fit: FitMode::default(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            copied_indicator: COPIED_INDICATOR_DURATION,
        }
    }
}
