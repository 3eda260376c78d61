// THEORY:
// The `CoordinateMapper` bridges screen space and buffer space. A pointer lands
// somewhere on a rendered surface; the pixel reader needs an integer (x, y) in the
// raw buffer behind it. Two situations exist:
//
// 1.  **Identity**: the buffer *is* what is shown, pixel for pixel. This is the
//     upload path, where the image was already composited into a container-sized
//     canvas (letterbox or crop offsets baked in at draw time).
// 2.  **Scaled**: the buffer is shown at a different resolution, as with a live
//     camera frame stretched into its container. Each axis gets its own factor
//     (intrinsic / displayed). The top-left of the displayed box is assumed to be the
//     buffer origin; no letterbox offset is subtracted on this path.
//
// Whatever the mode, the result must land inside the buffer. Out-of-range points
// are rejected, never clamped onto an edge pixel and never wrapped.

use crate::error::SampleError;

/// Where and how large a surface is drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A box at the origin, `width` x `height` in size.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Converts a client (window) coordinate into one relative to this box's top-left.
    pub fn relative(&self, client_x: f64, client_y: f64) -> PointerPosition {
        PointerPosition {
            x: client_x - self.left,
            y: client_y - self.top,
        }
    }

    fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A pointer position relative to the displayed surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An integer coordinate in raw-buffer space, guaranteed in bounds when produced by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoordinate {
    pub x: u32,
    pub y: u32,
}

/// How the raw buffer relates to the displayed box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    Identity,
    Scaled,
}

/// Maps pointer positions on one surface into its raw buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    display: DisplayBox,
    intrinsic_width: u32,
    intrinsic_height: u32,
    mode: MappingMode,
}

impl CoordinateMapper {
    pub fn new(
        display: DisplayBox,
        intrinsic_width: u32,
        intrinsic_height: u32,
        mode: MappingMode,
    ) -> Self {
        Self {
            display,
            intrinsic_width,
            intrinsic_height,
            mode,
        }
    }

    /// Identity mapper for a buffer drawn 1:1 into a `width` x `height` box.
    pub fn identity(width: u32, height: u32) -> Self {
        Self::new(
            DisplayBox::sized(width as f64, height as f64),
            width,
            height,
            MappingMode::Identity,
        )
    }

    /// Per-axis scale factors (intrinsic / displayed). `None` for a box with no area.
    pub fn scale(&self) -> Option<(f64, f64)> {
        match self.mode {
            MappingMode::Identity => Some((1.0, 1.0)),
            MappingMode::Scaled if self.display.has_area() => Some((
                self.intrinsic_width as f64 / self.display.width,
                self.intrinsic_height as f64 / self.display.height,
            )),
            MappingMode::Scaled => None,
        }
    }

    /// Maps a box-relative pointer into the buffer, or rejects it.
    pub fn map(&self, pointer: PointerPosition) -> Result<PixelCoordinate, SampleError> {
        if self.intrinsic_width == 0 || self.intrinsic_height == 0 {
            return Err(SampleError::NotReady);
        }
        let (scale_x, scale_y) = self.scale().ok_or(SampleError::NotReady)?;
        let x = Self::to_index(pointer.x * scale_x, self.intrinsic_width)?;
        let y = Self::to_index(pointer.y * scale_y, self.intrinsic_height)?;
        Ok(PixelCoordinate { x, y })
    }

    /// Same as `map`, taking a client coordinate and subtracting the box offset first.
    pub fn map_client(&self, client_x: f64, client_y: f64) -> Result<PixelCoordinate, SampleError> {
        self.map(self.display.relative(client_x, client_y))
    }

    fn to_index(value: f64, limit: u32) -> Result<u32, SampleError> {
        let floored = value.floor();
        if !floored.is_finite() || floored < 0.0 || floored >= limit as f64 {
            return Err(SampleError::OutOfBounds);
        }
        Ok(floored as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Mapper = CoordinateMapper;

    fn scaled(width: f64, height: f64, intrinsic_width: u32, intrinsic_height: u32) -> Mapper {
        CoordinateMapper::new(
            DisplayBox::sized(width, height),
            intrinsic_width,
            intrinsic_height,
            MappingMode::Scaled,
        )
    }

    #[test]
    fn identity_floors_fractional_positions() {
        let mapper = CoordinateMapper::identity(300, 200);
        assert_eq!(
            mapper.map(PointerPosition::new(10.9, 0.2)),
            Ok(PixelCoordinate { x: 10, y: 0 })
        );
        assert_eq!(
            mapper.map(PointerPosition::new(299.99, 199.5)),
            Ok(PixelCoordinate { x: 299, y: 199 })
        );
    }

    #[test]
    fn scaled_full_hd_frame_shown_at_half_size() {
        let mapper = scaled(960.0, 540.0, 1920, 1080);
        assert_eq!(
            mapper.map(PointerPosition::new(100.0, 50.0)),
            Ok(PixelCoordinate { x: 200, y: 100 })
        );
    }

    #[test]
    fn scaled_axes_are_independent() {
        let mapper = scaled(400.0, 300.0, 640, 480);
        assert_eq!(mapper.scale(), Some((1.6, 1.6)));
        let stretched = scaled(320.0, 480.0, 640, 480);
        assert_eq!(
            stretched.map(PointerPosition::new(10.0, 10.0)),
            Ok(PixelCoordinate { x: 20, y: 10 })
        );
    }

    #[test]
    fn out_of_bounds_is_rejected_not_clamped() {
        let mapper = CoordinateMapper::identity(100, 100);
        let outside = [
            (-0.5, 10.0),
            (10.0, -1.0),
            (100.0, 5.0),
            (5.0, 100.0),
            (f64::NAN, 1.0),
            (f64::INFINITY, 1.0),
        ];
        for (x, y) in outside {
            assert_eq!(mapper.map(PointerPosition::new(x, y)), Err(SampleError::OutOfBounds));
        }

        let half = scaled(960.0, 540.0, 1920, 1080);
        assert_eq!(half.map(PointerPosition::new(960.0, 10.0)), Err(SampleError::OutOfBounds));
    }

    #[test]
    fn empty_boxes_and_buffers_are_not_ready() {
        let no_box = scaled(0.0, 540.0, 1920, 1080);
        assert_eq!(no_box.map(PointerPosition::new(1.0, 1.0)), Err(SampleError::NotReady));
        let no_buffer = scaled(10.0, 10.0, 0, 0);
        assert_eq!(no_buffer.map(PointerPosition::new(1.0, 1.0)), Err(SampleError::NotReady));
    }

    #[test]
    fn client_coordinates_subtract_the_box_offset() {
        let display = DisplayBox::new(40.0, 25.0, 200.0, 100.0);
        let mapper = CoordinateMapper::new(display, 200, 100, MappingMode::Identity);
        assert_eq!(mapper.map_client(45.5, 30.0), Ok(PixelCoordinate { x: 5, y: 5 }));
        assert_eq!(mapper.map_client(39.0, 30.0), Err(SampleError::OutOfBounds));
    }
}
