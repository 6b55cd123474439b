// This is free and unencumbered software released into the public domain.

use super::{CameraConfig, CameraError, CameraListener, CameraThread, RenderSurface};
use std::sync::Arc;

/// Queue depth of the camera thread.
const MESSAGE_CAPACITY: usize = 16;

/// Opens the platform camera service and starts its camera thread.
///
/// The camera itself is opened by sending [`CameraThread::open`].
pub fn open_camera(
    config: CameraConfig,
    surface: Arc<dyn RenderSurface>,
    listener: Arc<dyn CameraListener>,
) -> Result<CameraThread, CameraError> {
    cfg_if::cfg_if! {
        if #[cfg(all(feature = "android", target_os = "android"))] {
            use super::{CameraSession, drivers::camera2::Camera2Platform};
            CameraThread::spawn(MESSAGE_CAPACITY, move |tx| {
                let platform = Camera2Platform::new(tx)?;
                Ok(CameraSession::new(platform, config, surface, listener))
            })
        } else {
            let _ = (MESSAGE_CAPACITY, config, surface, listener);
            Err(CameraError::NoDriver)
        }
    }
}
