// This is free and unencumbered software released into the public domain.

//! The seams between the session state machine and its surroundings: the
//! camera service below it, the render surface and host listener above.

use crate::shared::{CameraError, Facing, FpsRange, Frame, SessionMsg, Size, YuvImage};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CameraCharacteristics {
    pub facing: Option<Facing>,
    pub sensor_orientation: Option<u32>,
    /// Sizes the camera can stream to a GPU texture.
    pub output_sizes: Vec<Size>,
    pub fps_ranges: Vec<FpsRange>,
    pub max_af_regions: Option<u32>,
}

impl CameraCharacteristics {
    pub fn is_metering_area_af_supported(&self) -> bool {
        self.max_af_regions.is_some_and(|n| n >= 1)
    }
}

// Only the values a preview request uses; discriminants follow the camera
// metadata values.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestTemplate {
    #[default]
    Preview = 1,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    Auto = 1,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AeMode {
    #[default]
    On = 1,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AfMode {
    #[default]
    ContinuousVideo = 3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AfTrigger {
    #[default]
    Idle = 0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// The host's camera texture, sampled by the renderer.
    PreviewTexture(u32),
    /// The YUV reader feeding the converter.
    ImageReader,
}

/// What a repeating preview request asks of the camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureRequestSettings {
    pub template: RequestTemplate,
    pub target_fps_range: Option<FpsRange>,
    pub control_mode: ControlMode,
    pub ae_lock: bool,
    pub ae_mode: AeMode,
    pub af_mode: AfMode,
    pub af_trigger: Option<AfTrigger>,
    pub targets: Vec<OutputTarget>,
}

impl CaptureRequestSettings {
    pub fn preview(target_fps_range: Option<FpsRange>, texture_id: u32) -> Self {
        Self {
            template: RequestTemplate::Preview,
            target_fps_range,
            control_mode: ControlMode::Auto,
            ae_lock: false,
            ae_mode: AeMode::On,
            af_mode: AfMode::ContinuousVideo,
            af_trigger: Some(AfTrigger::Idle),
            targets: vec![
                OutputTarget::PreviewTexture(texture_id),
                OutputTarget::ImageReader,
            ],
        }
    }
}

/// How far `open_device` got before returning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceOpen {
    Opened,
    /// Completion follows as [`SessionMsg::DeviceOpened`].
    Pending,
}

/// How far `create_capture_session` got before returning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionSetup {
    Configured,
    ConfigureFailed,
    /// Completion follows as [`SessionMsg::SessionConfigured`] or
    /// [`SessionMsg::SessionConfigureFailed`].
    Pending,
}

/// The camera service, as seen from the session state machine.
///
/// Operations that complete synchronously say so in their return value and
/// the session applies the outcome inline. Asynchronous completions and
/// device callbacks arrive as [`SessionMsg`]s, either on the camera thread's
/// queue or through [`drain_events`](Self::drain_events).
pub trait CameraPlatform: dogma::Named + Send {
    fn has_camera_permission(&self) -> bool;

    fn camera_ids(&mut self) -> Result<Vec<String>, CameraError>;

    fn characteristics(&mut self, id: &str) -> Result<CameraCharacteristics, CameraError>;

    fn create_image_reader(&mut self, size: Size, max_images: usize) -> Result<(), CameraError>;

    fn open_device(&mut self, id: &str) -> Result<DeviceOpen, CameraError>;

    fn create_capture_session(
        &mut self,
        request: &CaptureRequestSettings,
    ) -> Result<SessionSetup, CameraError>;

    fn set_repeating_request(&mut self, request: &CaptureRequestSettings)
    -> Result<(), CameraError>;

    /// Hands the newest pending image to `f`, discarding older ones, and
    /// releases it afterwards. Returns `false` when no image was pending.
    fn with_latest_image(
        &mut self,
        f: &mut dyn FnMut(&YuvImage<'_>) -> Result<(), CameraError>,
    ) -> Result<bool, CameraError>;

    fn close_session(&mut self);

    fn close_device(&mut self);

    fn close_image_reader(&mut self);

    /// Callbacks queued by platform threads since the last call.
    fn drain_events(&mut self) -> Vec<SessionMsg> {
        Vec::new()
    }
}

/// The GPU surface the camera streams into.
pub trait RenderSurface: Send + Sync {
    /// Texture the preview is bound to, once the GL side has created it.
    fn camera_texture_id(&self) -> Option<u32>;

    /// Called on the camera thread when a new NV21 frame is ready.
    fn request_render(&self, frame: &Frame);
}

pub trait CameraListener: Send + Sync {
    fn on_camera_opened(&self, width: u32, height: u32);

    fn on_camera_changed(&self, facing: Facing, orientation: u32);

    fn on_camera_error(&self, message: &str);
}
