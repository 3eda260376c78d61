//! Real camera capture through OpenCV, feeding a `FeedProducer`.

use chroma_picker::core_modules::camera::FeedProducer;
use chroma_picker::core_modules::surface::Frame;
use chroma_picker::error::CameraError;
use log::{debug, warn};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

/// Device index used when the camera is started without one.
pub const DEFAULT_DEVICE: &str = "0";

/// Opens the requested device for every new power-on, grabs a frame and publishes
/// it, then waits for the camera to be released or restarted.
pub async fn serve_device(mut producer: FeedProducer) {
    while let Some(request) = producer.wait_for_power_on().await {
        let device = request.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string());
        let grabbed = tokio::task::spawn_blocking(move || grab_frame(&device)).await;
        match grabbed {
            Ok(Ok(frame)) => {
                producer.publish(frame);
            }
            Ok(Err(e)) => producer.fail(e),
            Err(e) => producer.fail(CameraError::Other(e.to_string())),
        }
        if !producer.wait_for_power_off().await {
            break;
        }
        producer.release();
    }
}

fn grab_frame(device: &str) -> Result<Frame, CameraError> {
    let index: i32 = device.parse().map_err(|_| CameraError::NoDevice {
        requested: Some(device.to_string()),
    })?;
    let mut cap = VideoCapture::new(index, videoio::CAP_ANY).map_err(opencv_error)?;
    if !cap.is_opened().map_err(opencv_error)? {
        return Err(CameraError::NoDevice {
            requested: Some(device.to_string()),
        });
    }

    let mut frame = Mat::default();
    // The first reads of a freshly opened device are often black; keep the last of a few.
    for _ in 0..5 {
        if !cap.read(&mut frame).map_err(opencv_error)? {
            warn!("camera {device} returned no frame");
            return Err(CameraError::Busy);
        }
    }
    if frame.empty() {
        return Err(CameraError::Busy);
    }

    // Convert the OpenCV Mat (BGR) to the RGBA buffer the picker samples.
    let mut rgba = Mat::default();
    imgproc::cvt_color(&frame, &mut rgba, imgproc::COLOR_BGR2RGBA, 0).map_err(opencv_error)?;
    let (width, height) = (rgba.cols() as u32, rgba.rows() as u32);
    let data = rgba.data_bytes().map_err(opencv_error)?.to_vec();
    debug!("captured {width}x{height} from camera {device}");
    Ok(Frame::new(width, height, data))
}

fn opencv_error(e: opencv::Error) -> CameraError {
    CameraError::Other(e.to_string())
}
