// THEORY:
// The camera is the one asynchronous boundary in the picker. Acquiring a stream is
// a one-shot request-and-wait that the user's permission gates; releasing it must be
// synchronous and must happen on every exit path, or the device stays lit.
//
// The module has three layers:
//
// 1.  **`CameraProvider`**: the collaborator interface. `start` is async (it resolves
//     when the first frame arrives or the request fails), `stop` is sync.
// 2.  **`FeedCamera` / `FeedProducer`**: a provider built on two tokio `watch`
//     channels, a power line beside a frame line. The camera side flips `Power`.
//     The producer side (a capture loop, a still file, a test) waits for power,
//     publishes frames, and observes power-off to release its hardware.
//     Every power-on carries a fresh session number and every frame is stamped with
//     the session it was captured for. A stop immediately followed by a start can
//     coalesce into a single `watch` update, so the producer watches for a new
//     session rather than for `Off`, and a start only accepts frames of its own.
// 3.  **`CameraController`**: the state machine the session drives:
//     Idle -> Loading -> Live | Failed. Any failure releases the device. Dropping the
//     controller releases it too.

use crate::core_modules::coordinate_mapper::DisplayBox;
use crate::core_modules::surface::{Frame, VideoSurface};
use crate::error::{CameraError, SampleError};
use futures::future::BoxFuture;
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

/// The collaborator interface for a live camera.
pub trait CameraProvider: Send {
    /// Whether any camera can be requested at all.
    fn has_camera(&self) -> bool;
    /// Requests the stream (optionally a specific device) and waits for its first frame.
    fn start<'a>(
        &'a mut self,
        device_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), CameraError>>;
    /// Releases the device. Synchronous, idempotent.
    fn stop(&mut self);
    fn is_active(&self) -> bool;
    /// The most recent frame while active.
    fn latest_frame(&self) -> Option<Frame>;
}

/// Whether the user allowed camera access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    #[default]
    Granted,
    Denied,
}

/// Numbers each power-on of a feed.
pub type FeedSession = u64;

/// The power line from camera to producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Power {
    Off,
    On {
        device: Option<String>,
        session: FeedSession,
    },
}

impl Power {
    fn session(&self) -> Option<FeedSession> {
        match self {
            Power::On { session, .. } => Some(*session),
            Power::Off => None,
        }
    }
}

/// A power-on as the producer receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerRequest {
    pub device: Option<String>,
    pub session: FeedSession,
}

/// What the producer last reported, stamped with the session it belongs to.
#[derive(Debug, Clone)]
pub enum FeedState {
    Idle,
    Frame { frame: Frame, session: FeedSession },
    Failed { error: CameraError, session: FeedSession },
}

/// Creates a connected camera/producer pair.
pub fn frame_feed(devices: Vec<String>, permission: Permission) -> (FeedCamera, FeedProducer) {
    let (frames_tx, frames_rx) = watch::channel(FeedState::Idle);
    let (power_tx, power_rx) = watch::channel(Power::Off);
    let camera = FeedCamera {
        frames_rx,
        power_tx: Arc::new(power_tx),
        devices,
        permission,
        active: false,
        sessions: 0,
    };
    let producer = FeedProducer {
        frames_tx,
        power_rx,
        serving: None,
    };
    (camera, producer)
}

/// Turns the device back off if a start request is abandoned midway.
struct PowerGuard {
    power_tx: Arc<watch::Sender<Power>>,
    armed: bool,
}

impl Drop for PowerGuard {
    fn drop(&mut self) {
        if self.armed {
            self.power_tx.send_replace(Power::Off);
        }
    }
}

/// Camera side of a frame feed.
pub struct FeedCamera {
    frames_rx: watch::Receiver<FeedState>,
    power_tx: Arc<watch::Sender<Power>>,
    devices: Vec<String>,
    permission: Permission,
    active: bool,
    sessions: FeedSession,
}

impl FeedCamera {
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    async fn acquire(&mut self, device_id: Option<&str>) -> Result<(), CameraError> {
        if self.permission == Permission::Denied {
            return Err(CameraError::PermissionDenied);
        }
        let requested = device_id.map(str::to_string);
        let known = match &requested {
            Some(id) => self.devices.iter().any(|d| d == id),
            None => !self.devices.is_empty(),
        };
        if !known {
            return Err(CameraError::NoDevice { requested });
        }

        self.sessions += 1;
        let session = self.sessions;
        let mut guard = PowerGuard {
            power_tx: Arc::clone(&self.power_tx),
            armed: true,
        };
        self.power_tx.send_replace(Power::On {
            device: requested,
            session,
        });

        loop {
            match &*self.frames_rx.borrow_and_update() {
                FeedState::Frame { session: s, .. } if *s == session => break,
                FeedState::Failed { error, session: s } if *s == session => {
                    return Err(error.clone());
                }
                _ => {}
            }
            if self.frames_rx.changed().await.is_err() {
                return Err(CameraError::Busy);
            }
        }
        guard.armed = false;
        Ok(())
    }
}

impl CameraProvider for FeedCamera {
    fn has_camera(&self) -> bool {
        !self.devices.is_empty()
    }

    fn start<'a>(
        &'a mut self,
        device_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), CameraError>> {
        Box::pin(async move {
            self.stop();
            let result = self.acquire(device_id).await;
            self.active = result.is_ok();
            result
        })
    }

    fn stop(&mut self) {
        if self.active || *self.power_tx.borrow() != Power::Off {
            debug!("releasing camera");
        }
        self.power_tx.send_replace(Power::Off);
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn latest_frame(&self) -> Option<Frame> {
        if !self.active {
            return None;
        }
        let current = self.power_tx.borrow().session();
        match &*self.frames_rx.borrow() {
            FeedState::Frame { frame, session } if Some(*session) == current => Some(frame.clone()),
            _ => None,
        }
    }
}

impl Drop for FeedCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer side of a frame feed: whatever actually captures frames.
pub struct FeedProducer {
    frames_tx: watch::Sender<FeedState>,
    power_rx: watch::Receiver<Power>,
    /// The session last handed out by `wait_for_power_on`.
    serving: Option<FeedSession>,
}

impl FeedProducer {
    pub fn power(&self) -> Power {
        self.power_rx.borrow().clone()
    }

    pub fn is_on(&self) -> bool {
        matches!(*self.power_rx.borrow(), Power::On { .. })
    }

    /// Waits for a power-on this producer has not served yet. Returns the request,
    /// or `None` once the camera side is gone.
    pub async fn wait_for_power_on(&mut self) -> Option<PowerRequest> {
        let served = self.serving;
        let power = self
            .power_rx
            .wait_for(|p| p.session().is_some_and(|s| Some(s) != served))
            .await
            .ok()?;
        let request = match &*power {
            Power::On { device, session } => PowerRequest {
                device: device.clone(),
                session: *session,
            },
            Power::Off => return None,
        };
        drop(power);
        self.serving = Some(request.session);
        Some(request)
    }

    /// Waits until the session being served ends: the device is turned off or a
    /// newer session replaces it. Returns `false` once the camera side is gone.
    pub async fn wait_for_power_off(&mut self) -> bool {
        let served = self.serving;
        self.power_rx
            .wait_for(|p| served.is_none() || p.session() != served)
            .await
            .is_ok()
    }

    /// Publishes a frame for the session being served. Returns `false` when that
    /// session is no longer powered.
    pub fn publish(&self, frame: Frame) -> bool {
        let powered = self.power_rx.borrow().session();
        let Some(session) = self.serving.filter(|s| Some(*s) == powered) else {
            return false;
        };
        self.frames_tx.send_replace(FeedState::Frame { frame, session });
        true
    }

    /// Reports that the device could not be opened for the session being served.
    pub fn fail(&self, error: CameraError) {
        if let Some(session) = self.serving {
            self.frames_tx.send_replace(FeedState::Failed { error, session });
        }
    }

    /// Marks the feed idle after the device was released.
    pub fn release(&self) {
        self.frames_tx.send_replace(FeedState::Idle);
    }

    /// Serves one still frame every time the camera is powered, until the camera is dropped.
    pub async fn serve_still(mut self, frame: Frame) {
        while self.wait_for_power_on().await.is_some() {
            self.publish(frame.clone());
            if !self.wait_for_power_off().await {
                break;
            }
            self.release();
        }
    }
}

/// Camera lifecycle as the session sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraState {
    Idle,
    Loading,
    Live,
    Failed(CameraError),
}

/// Drives a `CameraProvider` and guarantees release on every exit path.
pub struct CameraController<P: CameraProvider> {
    provider: P,
    state: CameraState,
    display: DisplayBox,
}

impl<P: CameraProvider> CameraController<P> {
    pub fn new(provider: P, display: DisplayBox) -> Self {
        Self {
            provider,
            state: CameraState::Idle,
            display,
        }
    }

    pub fn has_camera(&self) -> bool {
        self.provider.has_camera()
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == CameraState::Loading
    }

    pub fn is_live(&self) -> bool {
        self.state == CameraState::Live && self.provider.is_active()
    }

    pub fn set_display(&mut self, display: DisplayBox) {
        self.display = display;
    }

    pub fn display(&self) -> DisplayBox {
        self.display
    }

    /// Requests the stream. On failure the device is released and the error returned.
    pub async fn start(&mut self, device_id: Option<&str>) -> Result<(), CameraError> {
        self.state = CameraState::Loading;
        debug!("requesting camera {device_id:?}");
        match self.provider.start(device_id).await {
            Ok(()) => {
                self.state = CameraState::Live;
                Ok(())
            }
            Err(e) => {
                self.provider.stop();
                self.state = CameraState::Failed(e.clone());
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        self.provider.stop();
        self.state = CameraState::Idle;
    }

    /// The current frame as a sampleable surface. Not ready unless live.
    pub fn surface(&self) -> Result<VideoSurface, SampleError> {
        if !self.is_live() {
            return Err(SampleError::NotReady);
        }
        Ok(VideoSurface::new(self.provider.latest_frame(), self.display))
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: CameraProvider> Drop for CameraController<P> {
    fn drop(&mut self) {
        self.provider.stop();
    }
}
