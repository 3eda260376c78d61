// THEORY:
// A visual surface is whatever the user is pointing at: the canvas holding an
// uploaded image, or the element showing the live camera. The sampler never cares
// which; it asks the surface three things through `VisualSurface`:
//
// 1.  the raw pixel buffer (which may be missing, or refused),
// 2.  the on-screen box the buffer is displayed in,
// 3.  how the buffer relates to that box (`MappingMode`).
//
// `ImageCanvas` (upload path) composites the decoded image into a container-sized
// RGBA canvas up front, with the fit offsets baked into the draw. After that the
// canvas *is* the display, so the mapping is the identity.
//
// `VideoSurface` (camera path) holds the latest camera frame at its intrinsic
// resolution and the box it is displayed in. The mapping is scaled per axis and
// assumes the box origin is the frame origin: an `object-contain` style letterbox
// is not compensated for on this path. This is a known asymmetry with the upload
// path, kept on purpose.

use crate::config::FitMode;
use crate::core_modules::coordinate_mapper::{CoordinateMapper, DisplayBox, MappingMode};
use crate::core_modules::pixel_reader::FrameView;
use crate::error::{SampleError, SurfaceError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// Whether the host lets us read a surface's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferAccess {
    #[default]
    Granted,
    /// Reads are refused, e.g. the source is cross-origin tainted.
    Denied,
}

/// The collaborator interface every sampleable surface provides.
pub trait VisualSurface {
    /// The raw RGBA8 buffer behind the surface.
    fn frame(&self) -> Result<FrameView<'_>, SampleError>;
    /// Where the surface is drawn on screen.
    fn display_box(&self) -> DisplayBox;
    /// Width and height of the raw buffer.
    fn intrinsic_size(&self) -> (u32, u32);
    fn mapping_mode(&self) -> MappingMode;

    fn mapper(&self) -> CoordinateMapper {
        let (width, height) = self.intrinsic_size();
        CoordinateMapper::new(self.display_box(), width, height, self.mapping_mode())
    }
}

/// An owned RGBA8 frame, cheap to clone and share between the camera feed and the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// A frame filled with a single opaque color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data: Vec<u8> = (0..width as usize * height as usize)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], u8::MAX])
            .collect();
        Self::new(width, height, data)
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView::new(self.width, self.height, &self.data)
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

/// Where an image lands inside its container, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub draw_width: f64,
    pub draw_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Placement {
    /// Centers an `image_width` x `image_height` image in the container, preserving aspect ratio.
    pub fn compute(
        image_width: u32,
        image_height: u32,
        container_width: u32,
        container_height: u32,
        fit: FitMode,
    ) -> Self {
        let (iw, ih) = (image_width as f64, image_height as f64);
        let (cw, ch) = (container_width as f64, container_height as f64);
        let image_aspect = iw / ih;
        let container_aspect = cw / ch;
        let wider = image_aspect > container_aspect;

        // Cover pins the short side, contain pins the long side.
        let pin_height = match fit {
            FitMode::Cover => wider,
            FitMode::Contain => !wider,
        };
        let (draw_width, draw_height) = if pin_height {
            (ch * image_aspect, ch)
        } else {
            (cw, cw / image_aspect)
        };
        Self {
            draw_width,
            draw_height,
            offset_x: (cw - draw_width) / 2.0,
            offset_y: (ch - draw_height) / 2.0,
        }
    }
}

/// The source pixels `[start, end)` along one axis that are visible in the container.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    start: u32,
    end: u32,
    /// Container pixels per source pixel.
    scale: f64,
    /// Container position of the first visible source pixel (may be negative).
    drawn_at: f64,
}

impl Span {
    fn visible(source_len: u32, draw_len: f64, offset: f64, container_len: u32) -> Self {
        let last = source_len as f64;
        let scale = draw_len / last;
        let first_visible = (offset.max(0.0) - offset) / scale;
        let end_visible = ((container_len as f64).min(offset + draw_len) - offset) / scale;
        let start = first_visible.floor().clamp(0.0, last - 1.0);
        let end = end_visible.ceil().clamp(start + 1.0, last);
        Self {
            start: start as u32,
            end: end as u32,
            scale,
            drawn_at: offset + start * scale,
        }
    }

    fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Size of the visible region once drawn, at least one pixel.
    fn drawn_len(&self) -> u32 {
        ((self.len() as f64 * self.scale).round() as u32).max(1)
    }
}

/// The upload surface: an image pre-composited into a container-sized canvas.
#[derive(Debug, Clone)]
pub struct ImageCanvas {
    canvas: RgbaImage,
    display: DisplayBox,
    placement: Placement,
    access: BufferAccess,
}

impl ImageCanvas {
    /// Reads and decodes an image file, then composites it.
    pub fn open(
        path: impl AsRef<Path>,
        container_width: u32,
        container_height: u32,
        fit: FitMode,
    ) -> Result<Self, SurfaceError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, container_width, container_height, fit)
    }

    /// Decodes an in-memory upload (format guessed from its contents).
    pub fn from_bytes(
        bytes: &[u8],
        container_width: u32,
        container_height: u32,
        fit: FitMode,
    ) -> Result<Self, SurfaceError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_image(&image, container_width, container_height, fit)
    }

    pub fn from_image(
        image: &DynamicImage,
        container_width: u32,
        container_height: u32,
        fit: FitMode,
    ) -> Result<Self, SurfaceError> {
        let (image_width, image_height) = (image.width(), image.height());
        if image_width == 0 || image_height == 0 {
            return Err(SurfaceError::Empty {
                width: image_width,
                height: image_height,
            });
        }
        if container_width == 0 || container_height == 0 {
            return Err(SurfaceError::Empty {
                width: container_width,
                height: container_height,
            });
        }

        let placement = Placement::compute(
            image_width,
            image_height,
            container_width,
            container_height,
            fit,
        );

        // Only the source pixels that land inside the container are scaled, so a cover
        // fit of an extreme aspect ratio never materializes its off-canvas overflow.
        let columns = Span::visible(
            image_width,
            placement.draw_width,
            placement.offset_x,
            container_width,
        );
        let rows = Span::visible(
            image_height,
            placement.draw_height,
            placement.offset_y,
            container_height,
        );
        let source = image.to_rgba8();
        let region = imageops::crop_imm(
            &source,
            columns.start,
            rows.start,
            columns.len(),
            rows.len(),
        )
        .to_image();
        let scaled = imageops::resize(
            &region,
            columns.drawn_len(),
            rows.drawn_len(),
            FilterType::Triangle,
        );

        // Start from a cleared (fully transparent) canvas, then draw centered.
        let mut canvas = RgbaImage::new(container_width, container_height);
        imageops::overlay(
            &mut canvas,
            &scaled,
            columns.drawn_at.round() as i64,
            rows.drawn_at.round() as i64,
        );

        Ok(Self {
            canvas,
            display: DisplayBox::sized(container_width as f64, container_height as f64),
            placement,
            access: BufferAccess::Granted,
        })
    }

    /// Moves the canvas on screen; pointer math stays relative to its top-left.
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.display.left = left;
        self.display.top = top;
        self
    }

    pub fn with_access(mut self, access: BufferAccess) -> Self {
        self.access = access;
        self
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }
}

impl VisualSurface for ImageCanvas {
    fn frame(&self) -> Result<FrameView<'_>, SampleError> {
        if self.access == BufferAccess::Denied {
            return Err(SampleError::AccessDenied);
        }
        Ok(FrameView::new(self.canvas.width(), self.canvas.height(), self.canvas.as_raw()))
    }

    fn display_box(&self) -> DisplayBox {
        self.display
    }

    fn intrinsic_size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn mapping_mode(&self) -> MappingMode {
        MappingMode::Identity
    }
}

/// The camera surface: the current frame at intrinsic resolution, shown in `display`.
#[derive(Debug, Clone)]
pub struct VideoSurface {
    frame: Option<Frame>,
    display: DisplayBox,
    access: BufferAccess,
}

impl VideoSurface {
    pub fn new(frame: Option<Frame>, display: DisplayBox) -> Self {
        Self {
            frame,
            display,
            access: BufferAccess::Granted,
        }
    }

    pub fn with_access(mut self, access: BufferAccess) -> Self {
        self.access = access;
        self
    }
}

impl VisualSurface for VideoSurface {
    fn frame(&self) -> Result<FrameView<'_>, SampleError> {
        if self.access == BufferAccess::Denied {
            return Err(SampleError::AccessDenied);
        }
        self.frame.as_ref().map(Frame::view).ok_or(SampleError::NotReady)
    }

    fn display_box(&self) -> DisplayBox {
        self.display
    }

    fn intrinsic_size(&self) -> (u32, u32) {
        self.frame.as_ref().map(|f| (f.width, f.height)).unwrap_or((0, 0))
    }

    fn mapping_mode(&self) -> MappingMode {
        MappingMode::Scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 200x100: left half red, right half blue.
    fn split_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(200, 100, |x, _| {
            if x < 100 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        }))
    }

    fn rgb_at(canvas: &ImageCanvas, x: u32, y: u32) -> [u8; 3] {
        let p = canvas.canvas().get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    #[test]
    fn cover_placement_crops_the_long_side() {
        let placement = Placement::compute(200, 100, 100, 100, FitMode::Cover);
        assert_eq!(placement.draw_width, 200.0);
        assert_eq!(placement.draw_height, 100.0);
        assert_eq!(placement.offset_x, -50.0);
        assert_eq!(placement.offset_y, 0.0);
    }

    #[test]
    fn contain_placement_letterboxes() {
        let placement = Placement::compute(200, 100, 100, 100, FitMode::Contain);
        assert_eq!(placement.draw_width, 100.0);
        assert_eq!(placement.draw_height, 50.0);
        assert_eq!(placement.offset_y, 25.0);

        let tall = Placement::compute(100, 200, 100, 100, FitMode::Contain);
        assert_eq!(tall.draw_width, 50.0);
        assert_eq!(tall.offset_x, 25.0);
    }

    #[test]
    fn cover_canvas_shows_the_centered_region() {
        let canvas = ImageCanvas::from_image(&split_image(), 100, 100, FitMode::Cover).unwrap();
        assert_eq!(canvas.intrinsic_size(), (100, 100));
        assert_eq!(rgb_at(&canvas, 10, 50), [255, 0, 0]);
        assert_eq!(rgb_at(&canvas, 90, 50), [0, 0, 255]);
    }

    #[test]
    fn contain_canvas_leaves_transparent_bars() {
        let canvas = ImageCanvas::from_image(&split_image(), 100, 100, FitMode::Contain).unwrap();
        assert_eq!(canvas.canvas().get_pixel(50, 5)[3], 0);
        assert_eq!(rgb_at(&canvas, 10, 50), [255, 0, 0]);
    }

    #[test]
    fn extreme_aspect_cover_only_scales_the_visible_strip() {
        // 20000x1: red left half, blue right half. Covering 480x300 draws it
        // 6_000_000 pixels wide; only the few source pixels in view get scaled.
        let strip = DynamicImage::ImageRgba8(RgbaImage::from_fn(20_000, 1, |x, _| {
            if x < 10_000 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        }));
        let canvas = ImageCanvas::from_image(&strip, 480, 300, FitMode::Cover).unwrap();
        assert_eq!(canvas.intrinsic_size(), (480, 300));
        assert_eq!(canvas.placement().draw_width, 6_000_000.0);
        assert_eq!(rgb_at(&canvas, 10, 150), [255, 0, 0]);
        assert_eq!(rgb_at(&canvas, 470, 150), [0, 0, 255]);
        assert_eq!(canvas.canvas().get_pixel(0, 0)[3], 255);
        assert_eq!(canvas.canvas().get_pixel(479, 299)[3], 255);

        let green = Rgba([0, 200, 0, 255]);
        let tall = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 20_000, green));
        let canvas = ImageCanvas::from_image(&tall, 480, 300, FitMode::Contain).unwrap();
        assert_eq!(rgb_at(&canvas, 240, 150), [0, 200, 0]);
        assert_eq!(canvas.canvas().get_pixel(10, 150)[3], 0);
    }

    #[test]
    fn visible_span_covers_the_container() {
        // 200 source pixels drawn 200 wide at -50 in a 100 wide container.
        let span = Span::visible(200, 200.0, -50.0, 100);
        assert_eq!((span.start, span.end, span.drawn_at), (50, 150, 0.0));
        assert_eq!(span.drawn_len(), 100);
    }

    #[test]
    fn denied_canvas_refuses_reads() {
        let canvas = ImageCanvas::from_image(&split_image(), 100, 100, FitMode::Cover)
            .unwrap()
            .with_access(BufferAccess::Denied);
        assert_eq!(canvas.frame().err(), Some(SampleError::AccessDenied));
    }

    #[test]
    fn empty_container_is_an_error() {
        assert!(matches!(
            ImageCanvas::from_image(&split_image(), 0, 100, FitMode::Cover),
            Err(SurfaceError::Empty { .. })
        ));
    }

    #[test]
    fn undecodable_upload_is_an_error() {
        assert!(matches!(
            ImageCanvas::from_bytes(b"definitely not an image", 100, 100, FitMode::Cover),
            Err(SurfaceError::Decode(_))
        ));
    }

    #[test]
    fn video_surface_without_frame_is_not_ready() {
        let surface = VideoSurface::new(None, DisplayBox::sized(640.0, 480.0));
        assert_eq!(surface.frame().err(), Some(SampleError::NotReady));
        assert_eq!(surface.intrinsic_size(), (0, 0));
    }

    #[test]
    fn video_surface_uses_scaled_mapping() {
        let frame = Frame::solid(1920, 1080, [1, 2, 3]);
        let surface = VideoSurface::new(Some(frame), DisplayBox::sized(960.0, 540.0));
        assert_eq!(surface.mapping_mode(), MappingMode::Scaled);
        assert_eq!(surface.mapper().scale(), Some((2.0, 2.0)));
    }
}
