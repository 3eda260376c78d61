// THEORY:
// This file is the main entry point for the `chroma_picker` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API exposed to hosts (the `chroma-picker` CLI, a GUI shell, tests).
//
// The crate is layered:
//
// 1.  **`core_modules`**: the stateless color math (channel triples, naming,
//     contrast), the coordinate mapper and pixel reader, and the stateful
//     collaborators (storage, saved collection, theme, camera, copy indicator).
// 2.  **`sampler`**: one call from pointer position to derived color, plus the
//     `CurrentColor` it feeds.
// 3.  **`session`**: `PickerSession`, the single owner of all picker state that a
//     display layer drives with user gestures.
//
// Hosts should normally only need `session`, `config` and the re-exports below.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod sampler;
pub mod session;

pub use config::{FitMode, PickerConfig};
pub use error::{CameraError, HexParseError, SampleError, StorageError, SurfaceError};
pub use sampler::{
    ChannelTriple, ColorInfo, ColorName, Contrast, CurrentColor, Sample, sample_surface,
};
pub use session::{PickerSession, Pointer, Tab};
