// THEORY:
// The `sampler` module is the top-level API of the sampling core. It wires the
// three stateless stages into one call:
//
//   pointer --(CoordinateMapper)--> pixel coordinate
//           --(pixel reader)------> ChannelTriple
//           --(Color Deriver)-----> ColorInfo
//
// and defines `CurrentColor`, the single piece of state the core feeds. A failed
// sample never touches `CurrentColor`; it is replaced wholesale only by a
// successful one, or emptied by an explicit clear.

use crate::core_modules::coordinate_mapper::{PixelCoordinate, PointerPosition};
use crate::core_modules::pixel_reader::read_pixel;
use crate::core_modules::surface::VisualSurface;
use crate::error::SampleError;
use log::{debug, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::channel::channel::ChannelTriple;
pub use crate::core_modules::color_info::{ColorInfo, Contrast};
pub use crate::core_modules::color_name::ColorName;

/// One successful sample: where it was read and what was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub at: PixelCoordinate,
    pub color: ColorInfo,
}

/// Samples `surface` under a pointer given relative to the surface's top-left.
pub fn sample_surface<S: VisualSurface + ?Sized>(
    surface: &S,
    pointer: PointerPosition,
) -> Result<Sample, SampleError> {
    let at = surface.mapper().map(pointer)?;
    let frame = surface.frame().inspect_err(|e| {
        if *e == SampleError::AccessDenied {
            warn!("pixel read at ({}, {}) blocked by the surface", at.x, at.y);
        }
    })?;
    let triple = read_pixel(&frame, at)?;
    let color = ColorInfo::from(triple);
    debug!("sampled {} at ({}, {})", color.hex(), at.x, at.y);
    Ok(Sample { at, color })
}

/// The most recent successful sample, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentColor {
    color: Option<ColorInfo>,
}

impl CurrentColor {
    pub fn get(&self) -> Option<&ColorInfo> {
        self.color.as_ref()
    }

    pub fn set(&mut self, color: ColorInfo) {
        self.color = Some(color);
    }

    pub fn clear(&mut self) {
        self.color = None;
    }

    /// Replaces the color on success; leaves it untouched on failure.
    pub fn apply(&mut self, result: Result<Sample, SampleError>) -> Option<Sample> {
        match result {
            Ok(sample) => {
                self.color = Some(sample.color.clone());
                Some(sample)
            }
            Err(e) => {
                debug!("no sample: {e}");
                None
            }
        }
    }
}
