// This is free and unencumbered software released into the public domain.

//! Camera2 NDK binding.
//!
//! Calls that complete synchronously report their outcome to the caller.
//! NDK callbacks queue a [`SessionMsg`] for the camera thread to drain;
//! nothing here touches session state directly.

mod camera_capture_session;
pub use camera_capture_session::*;

mod camera_device;
pub use camera_device::*;

mod camera_manager;
pub use camera_manager::*;

mod camera_metadata;
pub use camera_metadata::*;

mod camera_output_target;
pub use camera_output_target::*;

mod camera_status;
pub use camera_status::*;

mod capture_request;
pub use capture_request::*;

mod capture_session_output;
pub use capture_session_output::*;

mod capture_session_output_container;
pub use capture_session_output_container::*;

mod image;
pub use image::*;

mod image_reader;
pub use image_reader::*;

mod media_status;
pub use media_status::*;

mod message_context;
pub use message_context::*;

mod native_window;
pub use native_window::*;

use crate::shared::{
    CameraCharacteristics, CameraError, CameraPlatform, CaptureRequestSettings, DeviceOpen,
    OutputTarget, SessionMsg, SessionSetup, Size, YuvImage,
};
use alloc::borrow::Cow;
use ndk_sys::android_get_device_api_level;
use std::sync::mpsc::SyncSender;
use tracing::{debug, info, warn};

#[link(name = "camera2ndk")]
unsafe extern "C" {}

#[link(name = "mediandk")]
unsafe extern "C" {}

/// [`CameraPlatform`] over the Camera2 NDK.
///
/// The host supplies the preview texture's window through
/// [`with_preview_window`](Self::with_preview_window); without one only the
/// image reader is streamed to.
#[derive(Debug)]
pub struct Camera2Platform {
    api_level: u32,
    permission_granted: bool,
    // Declaration order is drop order: everything registered with the
    // context and the manager goes first.
    session: Option<CameraCaptureSession>,
    device: Option<CameraDevice>,
    reader: Option<ImageReader>,
    preview_window: Option<NativeWindow>,
    manager: CameraManager,
    context: MessageContext,
}

// The raw NDK handles are only touched from the camera thread that owns
// the platform.
unsafe impl Send for Camera2Platform {}

impl Camera2Platform {
    pub fn new(tx: SyncSender<SessionMsg>) -> Result<Self, CameraError> {
        let api_level = unsafe { android_get_device_api_level() }.max(0) as u32;
        let manager = CameraManager::new()
            .map_err(|e| e.into_camera_error("creating camera manager"))?;
        debug!(api_level, "camera2 platform created");
        Ok(Self {
            api_level,
            permission_granted: true,
            session: None,
            device: None,
            reader: None,
            preview_window: None,
            manager,
            context: MessageContext::new(tx),
        })
    }

    /// Records the host's `CAMERA` permission state.
    pub fn with_camera_permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }

    pub fn with_preview_window(mut self, window: NativeWindow) -> Self {
        self.preview_window = Some(window);
        self
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    fn build_request(
        &self,
        device: &CameraDevice,
        settings: &CaptureRequestSettings,
    ) -> Result<CaptureRequest, CameraError> {
        let context = "building capture request";
        let mut request = CaptureRequest::new(device, settings.template)
            .map_err(|e| e.into_camera_error(context))?;
        for target in &settings.targets {
            let Some(window) = self.target_window(*target)? else {
                continue;
            };
            let target =
                CameraOutputTarget::new(&window).map_err(|e| e.into_camera_error(context))?;
            request
                .add_target(target)
                .map_err(|e| e.into_camera_error(context))?;
        }
        request.apply(settings).map_err(|e| e.into_camera_error(context))?;
        Ok(request)
    }

    fn target_window(&self, target: OutputTarget) -> Result<Option<NativeWindow>, CameraError> {
        match target {
            OutputTarget::PreviewTexture(texture_id) => match &self.preview_window {
                Some(window) => Ok(Some(NativeWindow::borrowed(window.handle))),
                None => {
                    warn!(texture_id, "no preview window, skipping texture target");
                    Ok(None)
                },
            },
            OutputTarget::ImageReader => {
                let reader = self.reader.as_ref().ok_or(CameraError::NotConfigured)?;
                let window = reader
                    .window()
                    .map_err(|e| e.into_camera_error("getting image reader window"))?;
                Ok(Some(window))
            },
        }
    }
}

impl dogma::Named for Camera2Platform {
    fn name(&self) -> Cow<'_, str> {
        "camera2".into()
    }
}

impl CameraPlatform for Camera2Platform {
    fn has_camera_permission(&self) -> bool {
        self.permission_granted
    }

    fn camera_ids(&mut self) -> Result<Vec<String>, CameraError> {
        self.manager
            .camera_ids()
            .map_err(|e| e.into_camera_error("listing cameras"))
    }

    fn characteristics(&mut self, id: &str) -> Result<CameraCharacteristics, CameraError> {
        let metadata = self
            .manager
            .characteristics(id)
            .map_err(|e| e.into_camera_error("reading camera characteristics"))?;
        Ok(metadata.to_characteristics())
    }

    fn create_image_reader(&mut self, size: Size, max_images: usize) -> Result<(), CameraError> {
        self.reader = None;
        let reader = ImageReader::new(size, max_images, &self.context)
            .map_err(|e| e.into_camera_error("creating image reader"))?;
        debug!(%size, max_images, "image reader created");
        self.reader = Some(reader);
        Ok(())
    }

    fn open_device(&mut self, id: &str) -> Result<DeviceOpen, CameraError> {
        let device = CameraDevice::open(&self.manager, id, &self.context)
            .map_err(|e| e.into_camera_error("opening camera"))?;
        info!(%id, "camera device opened");
        self.device = Some(device);
        // The NDK opens synchronously.
        Ok(DeviceOpen::Opened)
    }

    fn create_capture_session(
        &mut self,
        request: &CaptureRequestSettings,
    ) -> Result<SessionSetup, CameraError> {
        let device = self.device.as_ref().ok_or(CameraError::NotConfigured)?;
        self.session = None;

        let context = "creating capture session outputs";
        let mut outputs =
            CaptureSessionOutputContainer::new().map_err(|e| e.into_camera_error(context))?;
        for target in &request.targets {
            let Some(window) = self.target_window(*target)? else {
                continue;
            };
            let output =
                CaptureSessionOutput::new(&window).map_err(|e| e.into_camera_error(context))?;
            outputs.add(output).map_err(|e| e.into_camera_error(context))?;
        }

        match CameraCaptureSession::open(device, outputs, &self.context) {
            Ok(session) => {
                self.session = Some(session);
                Ok(SessionSetup::Configured)
            },
            Err(status) => {
                warn!(%status, "capture session configuration failed");
                Ok(SessionSetup::ConfigureFailed)
            },
        }
    }

    fn set_repeating_request(
        &mut self,
        settings: &CaptureRequestSettings,
    ) -> Result<(), CameraError> {
        let device = self.device.as_ref().ok_or(CameraError::NotConfigured)?;
        let request = self.build_request(device, settings)?;
        let session = self.session.as_mut().ok_or(CameraError::NotConfigured)?;
        session
            .set_repeating_request(request)
            .map_err(|e| e.into_camera_error("setting repeating request"))
    }

    fn with_latest_image(
        &mut self,
        f: &mut dyn FnMut(&YuvImage<'_>) -> Result<(), CameraError>,
    ) -> Result<bool, CameraError> {
        let Some(reader) = self.reader.as_ref() else {
            return Ok(false);
        };
        let context = "acquiring camera image";
        let Some(image) = reader
            .acquire_latest_image()
            .map_err(|e| e.into_camera_error(context))?
        else {
            return Ok(false);
        };
        let yuv = image.as_yuv().map_err(|e| e.into_camera_error(context))?;
        f(&yuv)?;
        Ok(true)
    }

    fn close_session(&mut self) {
        self.session = None;
    }

    fn close_device(&mut self) {
        self.session = None;
        self.device = None;
    }

    fn close_image_reader(&mut self) {
        self.reader = None;
    }

    fn drain_events(&mut self) -> Vec<SessionMsg> {
        self.context.drain()
    }
}
