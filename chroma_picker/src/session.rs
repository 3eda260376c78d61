// THEORY:
// The `session` module is the top-level API for a host. `PickerSession` is the one
// owner of every piece of picker state; a display layer (GUI, CLI, test) forwards
// user gestures to it and reads back what to render.
//
// Key architectural principles:
// 1.  **Explicit ownership:** the collection store, theme preference and camera are
//     built by the host and handed over at construction. There is no ambient
//     global to forget to install.
// 2.  **Gestures never fail:** every operation is a no-op or a notice on failure.
//     Sampling misses are silent, camera failures notify and fall back to the
//     upload tab, persistence failures are logged by the store.
// 3.  **Single writer:** every mutation takes `&mut self`, so a pending camera
//     start cannot interleave with a sample or a save.

use crate::config::PickerConfig;
use crate::core_modules::camera::{CameraController, CameraProvider, CameraState};
use crate::core_modules::collection::{ColorStore, SavedColor};
use crate::core_modules::coordinate_mapper::{DisplayBox, PointerPosition};
use crate::core_modules::copy_indicator::{Clipboard, CopiedField, CopyIndicator};
use crate::core_modules::notice::{Notice, Notifier};
use crate::core_modules::storage::KeyValueStorage;
use crate::core_modules::surface::ImageCanvas;
use crate::core_modules::theme::{Theme, ThemePreference};
use crate::error::{CameraError, SurfaceError};
use crate::sampler::{ColorInfo, Contrast, CurrentColor, Sample, sample_surface};
use log::{debug, info, warn};
use std::path::Path;

/// Which picking surface is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Upload,
    Camera,
}

/// The marker drawn where the user last clicked, relative to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

pub struct PickerSession<S: KeyValueStorage, P: CameraProvider> {
    config: PickerConfig,
    store: ColorStore<S>,
    theme: ThemePreference<S>,
    camera: CameraController<P>,
    clipboard: Box<dyn Clipboard>,
    notifier: Box<dyn Notifier>,
    copied: CopyIndicator,
    tab: Tab,
    image: Option<ImageCanvas>,
    pointer: Pointer,
    current: CurrentColor,
}

impl<S: KeyValueStorage, P: CameraProvider> PickerSession<S, P> {
    pub fn new(
        config: PickerConfig,
        store: ColorStore<S>,
        theme: ThemePreference<S>,
        camera: CameraController<P>,
        clipboard: Box<dyn Clipboard>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let copied = CopyIndicator::new(config.copied_indicator);
        Self {
            config,
            store,
            theme,
            camera,
            clipboard,
            notifier,
            copied,
            tab: Tab::Upload,
            image: None,
            pointer: Pointer::default(),
            current: CurrentColor::default(),
        }
    }

    // --- Upload surface ---

    /// Shows `canvas` on the upload tab and hides the old pointer marker.
    pub fn load_image(&mut self, canvas: ImageCanvas) {
        debug!(
            "image loaded into a {}x{} canvas",
            canvas.canvas().width(),
            canvas.canvas().height()
        );
        self.image = Some(canvas);
        self.pointer = Pointer::default();
    }

    /// Decodes an upload and composites it with the configured container size and fit.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        let canvas = ImageCanvas::from_bytes(
            bytes,
            self.config.container_width,
            self.config.container_height,
            self.config.fit,
        )?;
        self.load_image(canvas);
        Ok(())
    }

    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<(), SurfaceError> {
        let canvas = ImageCanvas::open(
            path,
            self.config.container_width,
            self.config.container_height,
            self.config.fit,
        )?;
        self.load_image(canvas);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.pointer = Pointer::default();
    }

    pub fn image(&self) -> Option<&ImageCanvas> {
        self.image.as_ref()
    }

    /// A click on the upload canvas. Returns the sample when one was taken.
    pub fn click_image(&mut self, pointer: PointerPosition) -> Option<Sample> {
        if self.tab != Tab::Upload {
            return None;
        }
        let canvas = self.image.as_ref()?;
        self.pointer = Pointer {
            x: pointer.x,
            y: pointer.y,
            visible: true,
        };
        let result = sample_surface(canvas, pointer);
        self.current.apply(result)
    }

    // --- Camera surface ---

    /// Switches tabs. Entering the camera tab requests the stream; if that fails the
    /// user is told, the device is released and the session falls back to upload.
    pub async fn select_tab(&mut self, tab: Tab, device_id: Option<&str>) -> Tab {
        match tab {
            Tab::Upload => {
                self.camera.stop();
                self.tab = Tab::Upload;
            }
            Tab::Camera if !self.camera.has_camera() => {
                self.camera_unavailable(&CameraError::NoDevice {
                    requested: device_id.map(str::to_string),
                });
            }
            Tab::Camera => {
                self.tab = Tab::Camera;
                self.pointer = Pointer::default();
                if let Err(e) = self.camera.start(device_id).await {
                    self.camera_unavailable(&e);
                }
            }
        }
        self.tab
    }

    fn camera_unavailable(&mut self, error: &CameraError) {
        warn!("camera unavailable: {error}");
        self.camera.stop();
        self.tab = Tab::Upload;
        self.notifier.notify(Notice::error(
            "Camera error",
            "Could not access the camera. Allow permission or use another device.",
        ));
    }

    /// Updates where the video is shown, e.g. after a resize.
    pub fn set_camera_display(&mut self, display: DisplayBox) {
        self.camera.set_display(display);
    }

    /// A click on the live video. Ignored while the stream is loading or not live.
    pub fn click_camera(&mut self, pointer: PointerPosition) -> Option<Sample> {
        if self.tab != Tab::Camera || self.camera.is_loading() {
            return None;
        }
        let surface = self.camera.surface().ok()?;
        self.pointer = Pointer {
            x: pointer.x,
            y: pointer.y,
            visible: true,
        };
        let result = sample_surface(&surface, pointer);
        self.current.apply(result)
    }

    pub fn has_camera(&self) -> bool {
        self.camera.has_camera()
    }

    pub fn camera_state(&self) -> &CameraState {
        self.camera.state()
    }

    // --- Current color ---

    pub fn current(&self) -> Option<&ColorInfo> {
        self.current.get()
    }

    pub fn set_current(&mut self, color: ColorInfo) {
        self.current.set(color);
    }

    pub fn clear_current(&mut self) {
        self.current.clear();
    }

    pub fn contrast_for_current(&self) -> Option<Contrast> {
        self.current.get().map(ColorInfo::contrast)
    }

    // --- Collection ---

    pub fn saved(&self) -> &[SavedColor] {
        self.store.saved()
    }

    pub fn persistence_degraded(&self) -> bool {
        self.store.persistence_degraded()
    }

    /// Saves the current color. Nothing happens without one.
    pub fn save_current(&mut self) -> Option<&SavedColor> {
        let color = self.current.get()?.clone();
        self.store.save(&color);
        info!("saved {}", color.hex());
        self.notifier.notify(Notice::info(
            Some("Color Saved"),
            format!("Color {} has been saved.", color.hex()),
        ));
        self.store.saved().first()
    }

    /// Deletes a saved color. Returns `false` for an unknown id.
    pub fn delete_saved(&mut self, id: &str) -> bool {
        if self.store.get(id).is_none() {
            debug!("delete of unknown id {id} ignored");
            return false;
        }
        self.store.delete(id);
        self.notifier.notify(Notice::info(
            Some("Color Deleted"),
            "Color has been removed from your collection.",
        ));
        true
    }

    pub fn clear_saved(&mut self) {
        self.store.clear();
        self.notifier.notify(Notice::info(
            Some("All Colors Deleted"),
            "All saved colors have been deleted.",
        ));
    }

    /// Makes a saved color current again.
    pub fn select_saved(&mut self, id: &str) -> Option<&ColorInfo> {
        let color = self.store.get(id)?.color().clone();
        self.current.set(color);
        self.current.get()
    }

    // --- Copy ---

    pub fn copy_hex(&mut self) -> bool {
        self.copy(CopiedField::Hex)
    }

    pub fn copy_rgb(&mut self) -> bool {
        self.copy(CopiedField::Rgb)
    }

    fn copy(&mut self, field: CopiedField) -> bool {
        let Some(color) = self.current.get() else {
            return false;
        };
        let (text, what) = match field {
            CopiedField::Hex => (color.hex().to_string(), "HEX"),
            CopiedField::Rgb => (color.rgb().to_string(), "RGB"),
        };
        self.clipboard.copy_text(&text);
        self.copied.raise(field);
        self.notifier.notify(Notice::info(None, format!("{what} code copied!")));
        true
    }

    /// Which field was copied within the indicator window, if any.
    pub fn copied(&self) -> Option<CopiedField> {
        self.copied.copied()
    }

    // --- Theme ---

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Theme {
        self.theme.set(theme)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle()
    }

    // --- Display state ---

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn store(&self) -> &ColorStore<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::camera::{FeedCamera, Permission, frame_feed};
    use crate::core_modules::notice::{NoticeKind, NoticeLog};
    use crate::core_modules::storage::MemoryStorage;
    use crate::core_modules::surface::Frame;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::{Arc, Mutex};

    /// Shares notices with the test while the session owns the notifier.
    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<NoticeLog>>);

    impl Notifier for SharedLog {
        fn notify(&mut self, notice: Notice) {
            self.0.lock().unwrap().notify(notice);
        }
    }

    impl SharedLog {
        fn titles(&self) -> Vec<Option<String>> {
            self.0.lock().unwrap().notices.iter().map(|n| n.title.clone()).collect()
        }

        fn last(&self) -> Option<Notice> {
            self.0.lock().unwrap().last().cloned()
        }
    }

    #[derive(Clone, Default)]
    struct SharedClipboard(Arc<Mutex<Option<String>>>);

    impl Clipboard for SharedClipboard {
        fn copy_text(&mut self, text: &str) {
            *self.0.lock().unwrap() = Some(text.to_string());
        }
    }

    type TestSession = PickerSession<MemoryStorage, FeedCamera>;

    fn session_with(camera: FeedCamera) -> (TestSession, SharedLog, SharedClipboard) {
        let log = SharedLog::default();
        let clipboard = SharedClipboard::default();
        let storage = MemoryStorage::new();
        let session = PickerSession::new(
            PickerConfig::default(),
            ColorStore::open(storage.clone()),
            ThemePreference::open(storage),
            CameraController::new(camera, DisplayBox::sized(200.0, 100.0)),
            Box::new(clipboard.clone()),
            Box::new(log.clone()),
        );
        (session, log, clipboard)
    }

    fn session() -> (TestSession, SharedLog, SharedClipboard) {
        let (camera, _producer) = frame_feed(Vec::new(), Permission::Granted);
        session_with(camera)
    }

    fn red_square() -> ImageCanvas {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let image = DynamicImage::ImageRgba8(image);
        ImageCanvas::from_image(&image, 100, 100, crate::config::FitMode::Cover).unwrap()
    }

    #[test]
    fn clicking_an_image_sets_the_current_color_and_marker() {
        let (mut session, _, _) = session();
        assert_eq!(session.click_image(PointerPosition::new(5.0, 5.0)), None);

        session.load_image(red_square());
        let sample = session.click_image(PointerPosition::new(50.5, 20.0)).unwrap();
        assert_eq!(sample.color.hex(), "#ff0000");
        assert_eq!(session.current().map(ColorInfo::hex), Some("#ff0000"));
        assert_eq!(session.contrast_for_current(), Some(Contrast::White));
        assert_eq!(session.pointer(), Pointer { x: 50.5, y: 20.0, visible: true });

        // A miss keeps the color.
        assert_eq!(session.click_image(PointerPosition::new(100.0, 5.0)), None);
        assert_eq!(session.current().map(ColorInfo::hex), Some("#ff0000"));

        session.clear_image();
        assert!(!session.pointer().visible);
        assert!(session.image().is_none());
    }

    #[test]
    fn save_delete_and_clear_notify() {
        let (mut session, log, _) = session();
        assert!(session.save_current().is_none());

        session.set_current(ColorInfo::from(crate::sampler::ChannelTriple::new(0, 128, 255)));
        let id = session.save_current().map(|c| c.id().to_string()).unwrap();
        assert_eq!(
            log.last().map(|n| n.description),
            Some("Color #0080ff has been saved.".to_string())
        );

        session.clear_current();
        assert_eq!(session.select_saved(&id).map(ColorInfo::hex), Some("#0080ff"));
        assert!(session.select_saved("missing").is_none());

        assert!(!session.delete_saved("missing"));
        assert!(session.delete_saved(&id));
        assert!(session.saved().is_empty());

        session.save_current();
        session.clear_saved();
        assert!(session.saved().is_empty());
        assert_eq!(
            log.titles(),
            vec![
                Some("Color Saved".to_string()),
                Some("Color Deleted".to_string()),
                Some("Color Saved".to_string()),
                Some("All Colors Deleted".to_string()),
            ]
        );
    }

    #[test]
    fn copy_needs_a_current_color() {
        let (mut session, log, clipboard) = session();
        assert!(!session.copy_hex());
        assert_eq!(session.copied(), None);

        session.set_current(ColorInfo::from(crate::sampler::ChannelTriple::new(255, 0, 0)));
        assert!(session.copy_rgb());
        assert_eq!(clipboard.0.lock().unwrap().as_deref(), Some("rgb(255, 0, 0)"));
        assert_eq!(session.copied(), Some(CopiedField::Rgb));
        assert!(session.copy_hex());
        assert_eq!(clipboard.0.lock().unwrap().as_deref(), Some("#ff0000"));
        assert_eq!(log.last().map(|n| n.description), Some("HEX code copied!".to_string()));
    }

    #[test]
    fn theme_toggles_and_persists() {
        let (mut session, _, _) = session();
        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(session.set_theme(Theme::Light), Theme::Light);
    }

    #[tokio::test]
    async fn camera_without_devices_falls_back_to_upload() {
        let (mut session, log, _) = session();
        assert!(!session.has_camera());
        assert_eq!(session.select_tab(Tab::Camera, None).await, Tab::Upload);
        assert_eq!(log.last().map(|n| n.kind), Some(NoticeKind::Error));
    }

    #[tokio::test]
    async fn denied_camera_falls_back_and_releases() {
        let (camera, producer) = frame_feed(vec!["front".to_string()], Permission::Denied);
        let (mut session, log, _) = session_with(camera);
        assert_eq!(session.select_tab(Tab::Camera, None).await, Tab::Upload);
        assert_eq!(session.camera_state(), &CameraState::Idle);
        assert_eq!(log.titles(), vec![Some("Camera error".to_string())]);
        assert!(!producer.is_on());
    }

    #[tokio::test]
    async fn live_camera_samples_in_intrinsic_space() {
        let (camera, producer) = frame_feed(vec!["front".to_string()], Permission::Granted);
        // 4x2 frame: left half black, right half white.
        let mut data = Vec::new();
        for _row in 0..2 {
            data.extend_from_slice(&[
                0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255, 255,
            ]);
        }
        tokio::spawn(producer.serve_still(Frame::new(4, 2, data)));

        let (mut session, _, _) = session_with(camera);
        assert_eq!(session.click_camera(PointerPosition::new(1.0, 1.0)), None);
        assert_eq!(session.select_tab(Tab::Camera, Some("front")).await, Tab::Camera);
        assert_eq!(session.camera_state(), &CameraState::Live);

        // Displayed at 200x100, so x=150 lands on intrinsic column 3.
        let sample = session.click_camera(PointerPosition::new(150.0, 10.0)).unwrap();
        assert_eq!(sample.color.hex(), "#ffffff");
        assert_eq!(session.contrast_for_current(), Some(Contrast::Black));
        assert_eq!(session.click_image(PointerPosition::new(1.0, 1.0)), None);

        assert_eq!(session.select_tab(Tab::Upload, None).await, Tab::Upload);
        assert_eq!(session.camera_state(), &CameraState::Idle);
        assert_eq!(session.click_camera(PointerPosition::new(150.0, 10.0)), None);
        assert_eq!(session.current().map(ColorInfo::hex), Some("#ffffff"));
    }

    const TAB_SWITCH_LIMIT: std::time::Duration = std::time::Duration::from_secs(2);

    async fn switch(session: &mut TestSession, tab: Tab) -> Tab {
        tokio::time::timeout(TAB_SWITCH_LIMIT, session.select_tab(tab, None))
            .await
            .expect("tab switch hung")
    }

    #[tokio::test]
    async fn camera_can_be_reentered_after_upload() {
        let (camera, producer) = frame_feed(vec!["front".to_string()], Permission::Granted);
        tokio::spawn(producer.serve_still(Frame::solid(4, 2, [0, 0, 255])));
        let (mut session, log, _) = session_with(camera);

        for _ in 0..3 {
            assert_eq!(switch(&mut session, Tab::Camera).await, Tab::Camera);
            assert_eq!(session.camera_state(), &CameraState::Live);
            let sample = session.click_camera(PointerPosition::new(10.0, 10.0)).unwrap();
            assert_eq!(sample.color.hex(), "#0000ff");

            assert_eq!(switch(&mut session, Tab::Upload).await, Tab::Upload);
            assert_eq!(session.click_camera(PointerPosition::new(10.0, 10.0)), None);
        }
        assert!(log.titles().is_empty());
    }

    #[tokio::test]
    async fn selecting_the_live_camera_again_restarts_it() {
        let (camera, producer) = frame_feed(vec!["front".to_string()], Permission::Granted);
        tokio::spawn(producer.serve_still(Frame::solid(4, 2, [0, 0, 255])));
        let (mut session, _, _) = session_with(camera);

        assert_eq!(switch(&mut session, Tab::Camera).await, Tab::Camera);
        assert_eq!(switch(&mut session, Tab::Camera).await, Tab::Camera);
        assert_eq!(session.camera_state(), &CameraState::Live);
        assert!(session.click_camera(PointerPosition::new(199.0, 99.0)).is_some());
    }
}
