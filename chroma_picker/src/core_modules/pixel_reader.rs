// THEORY:
// The pixel reader is the only producer of `ChannelTriple`s from image data. It
// addresses a raw, row-major RGBA8 buffer as `byte_index = ((y * width) + x) * 4`.
// It reads one pixel, drops alpha, and never looks at a neighbor.
//
// Every failure is reported as a `SampleError` instead of a panic, so a click near
// an edge or on a half-initialized surface is just "no sample".

use crate::core_modules::channel::channel::ChannelTriple;
use crate::core_modules::coordinate_mapper::PixelCoordinate;
use crate::error::SampleError;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// A borrowed view of a raw RGBA8 buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self { width, height, data }
    }

    /// A buffer is drawable once it has area and holds exactly `width * height` pixels.
    pub fn is_drawable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.width as usize * self.height as usize * CHANNELS
    }
}

/// Reads the (r, g, b) at `at`. Alpha is ignored.
pub fn read_pixel(
    frame: &FrameView<'_>,
    at: PixelCoordinate,
) -> Result<ChannelTriple, SampleError> {
    if !frame.is_drawable() {
        return Err(SampleError::NotReady);
    }
    if at.x >= frame.width || at.y >= frame.height {
        return Err(SampleError::OutOfBounds);
    }
    let byte_index = ((at.y as usize * frame.width as usize) + at.x as usize) * CHANNELS;
    let pixel = frame
        .data
        .get(byte_index..byte_index + CHANNELS)
        .ok_or(SampleError::OutOfBounds)?;
    Ok(ChannelTriple::new(pixel[0], pixel[1], pixel[2]))
}
