// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraCharacteristics, CameraConfig, CameraError, CameraEvent, CameraListener,
    CameraPlatform, CaptureRequestSettings, DeviceOpen, Facing, Frame, FramePool, FrameSinks,
    Nv21Converter, RenderSurface, SessionSetup, Size, choose_optimal_size, select_fps_range_with,
};
use derive_more::Display;
use std::sync::{Arc, mpsc::SyncSender};
use tracing::{debug, error, info, trace, warn};

pub const CAMERA_OPEN_FAILED: &str = "camera open failed";
pub const CAMERA_PREVIEW_FAILED: &str = "camera preview failed";
pub const CAMERA_DEVICE_ERROR: &str = "camera device error";

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    #[display("closed")]
    Closed,
    #[display("opening")]
    Opening,
    #[display("opened")]
    Opened,
    #[display("configuring session")]
    SessionConfiguring,
    #[display("previewing")]
    Previewing,
    #[display("closing")]
    Closing,
}

/// Everything the camera thread processes: host commands and platform
/// callbacks, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionMsg {
    Open { facing: Facing },
    Close,
    StartPreview,
    ChangeResolution { width: u32, height: u32 },
    SwitchCamera,
    DeviceOpened,
    DeviceDisconnected,
    DeviceError { code: i32 },
    SessionConfigured,
    SessionConfigureFailed,
    CaptureSequenceCompleted { sequence_id: i32, frame_number: i64 },
    ImageAvailable,
    /// Wakes the camera thread to drain [`CameraPlatform::drain_events`].
    PlatformEvents,
    Shutdown,
}

#[derive(Clone, Debug)]
struct CameraInfo {
    id: String,
    orientation: u32,
    characteristics: CameraCharacteristics,
}

pub struct CameraSession<P: CameraPlatform> {
    platform: P,
    config: CameraConfig,
    surface: Arc<dyn RenderSurface>,
    listener: Arc<dyn CameraListener>,
    sinks: FrameSinks,
    events: Option<SyncSender<CameraEvent>>,
    state: SessionState,
    facing: Facing,
    front: Option<CameraInfo>,
    back: Option<CameraInfo>,
    camera_info_loaded: bool,
    preview_size: Size,
    converter: Nv21Converter,
    pool: FramePool,
    request: Option<CaptureRequestSettings>,
    frames_stopped: bool,
    sequence: u64,
}

impl<P: CameraPlatform> core::fmt::Debug for CameraSession<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CameraSession")
            .field("platform", &self.platform.name())
            .field("state", &self.state)
            .field("facing", &self.facing)
            .field("preview_size", &self.preview_size)
            .finish()
    }
}

impl<P: CameraPlatform> CameraSession<P> {
    pub fn new(
        platform: P,
        config: CameraConfig,
        surface: Arc<dyn RenderSurface>,
        listener: Arc<dyn CameraListener>,
    ) -> Self {
        let facing = config.facing;
        let preview_size = config.desired_size();
        Self {
            platform,
            config,
            surface,
            listener,
            sinks: FrameSinks::default(),
            events: None,
            state: SessionState::Closed,
            facing,
            front: None,
            back: None,
            camera_info_loaded: false,
            preview_size,
            converter: Nv21Converter::new(),
            pool: FramePool::default(),
            request: None,
            frames_stopped: false,
            sequence: 0,
        }
    }

    pub fn set_events(&mut self, events: SyncSender<CameraEvent>) {
        self.events = Some(events);
    }

    pub fn sinks(&self) -> FrameSinks {
        self.sinks.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn preview_size(&self) -> Size {
        self.preview_size
    }

    pub fn orientation(&self) -> u32 {
        self.camera_info(self.facing)
            .map(|info| info.orientation)
            .unwrap_or_else(|| self.facing.default_orientation())
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn is_previewing(&self) -> bool {
        matches!(
            self.state,
            SessionState::SessionConfiguring | SessionState::Previewing
        )
    }

    /// The repeating request of the current preview, if any.
    pub fn request(&self) -> Option<&CaptureRequestSettings> {
        self.request.as_ref()
    }

    pub fn handle(&mut self, msg: SessionMsg) -> Result<(), CameraError> {
        let handled = self.handle_one(msg);
        self.drain_platform_events();
        handled
    }

    fn handle_one(&mut self, msg: SessionMsg) -> Result<(), CameraError> {
        match msg {
            SessionMsg::Open { facing } => self.open(facing)?,
            SessionMsg::Close | SessionMsg::Shutdown => self.close(),
            SessionMsg::StartPreview => self.start_preview(),
            SessionMsg::ChangeResolution { width, height } => {
                self.change_resolution(width, height)?
            },
            SessionMsg::SwitchCamera => self.switch_camera()?,
            SessionMsg::DeviceOpened => self.on_device_opened(),
            SessionMsg::DeviceDisconnected => self.on_device_disconnected(),
            SessionMsg::DeviceError { code } => self.on_device_error(code),
            SessionMsg::SessionConfigured => self.on_session_configured(),
            SessionMsg::SessionConfigureFailed => self.on_session_configure_failed(),
            SessionMsg::CaptureSequenceCompleted {
                sequence_id,
                frame_number,
            } => self.on_capture_sequence_completed(sequence_id, frame_number),
            SessionMsg::ImageAvailable => self.on_image_available(),
            SessionMsg::PlatformEvents => {},
        }
        Ok(())
    }

    /// Handles callbacks the platform queued outside the camera thread's
    /// message queue.
    fn drain_platform_events(&mut self) {
        loop {
            let events = self.platform.drain_events();
            if events.is_empty() {
                return;
            }
            for msg in events {
                trace!(?msg, "platform event");
                if let Err(err) = self.handle_one(msg) {
                    error!(%err, "platform event failed");
                    self.emit(CameraEvent::Error { error: err });
                }
            }
        }
    }

    /// Records the front and back camera ids and orientations.
    ///
    /// Fails only when the device has no camera at all; lookup errors for
    /// individual cameras are logged and skipped.
    pub fn init_camera_info(&mut self) -> Result<(), CameraError> {
        let ids = self.platform.camera_ids()?;
        if ids.is_empty() {
            return Err(CameraError::NoCamera);
        }

        for id in ids {
            let characteristics = match self.platform.characteristics(&id) {
                Ok(c) => c,
                Err(err) => {
                    warn!(%id, %err, "failed to query camera characteristics");
                    continue;
                },
            };
            let Some(facing) = characteristics.facing else {
                continue;
            };
            let info = CameraInfo {
                id,
                orientation: characteristics
                    .sensor_orientation
                    .unwrap_or_else(|| facing.default_orientation()),
                characteristics,
            };
            match facing {
                Facing::Front => self.front = Some(info),
                Facing::Back => self.back = Some(info),
            }
        }
        self.camera_info_loaded = true;

        info!(
            front = ?self.front.as_ref().map(|c| (&c.id, c.orientation)),
            back = ?self.back.as_ref().map(|c| (&c.id, c.orientation)),
            "camera info initialized"
        );
        Ok(())
    }

    /// Starts opening the camera facing `facing`.
    ///
    /// Missing permission and missing cameras are returned to the caller.
    /// Platform failures are reported to the listener and leave the session
    /// closed.
    pub fn open(&mut self, facing: Facing) -> Result<(), CameraError> {
        if !self.platform.has_camera_permission() {
            return Err(CameraError::PermissionDenied);
        }
        if self.state != SessionState::Closed {
            debug!(state = %self.state, "camera already open");
            return Ok(());
        }
        if !self.camera_info_loaded {
            self.init_camera_info()?;
        }
        self.facing = facing;

        let Some(info) = self.camera_info(facing).cloned() else {
            self.listener.on_camera_error(CAMERA_OPEN_FAILED);
            return Err(CameraError::NoCamera);
        };

        // With no advertised sizes this is the requested size.
        let desired = self.config.desired_size();
        self.preview_size = choose_optimal_size(
            &info.characteristics.output_sizes,
            desired,
            self.config.max_preview,
            desired,
        );
        info!(
            %facing,
            orientation = info.orientation,
            preview = %self.preview_size,
            "opening camera"
        );

        let Size { width, height } = self.preview_size;
        let buffer_frames = self.config.buffer_frames;
        self.pool
            .reallocate(buffer_frames, width as usize, height as usize);
        self.set_state(SessionState::Opening);

        let opened = self
            .platform
            .create_image_reader(self.preview_size, self.config.buffer_frames)
            .and_then(|()| self.platform.open_device(&info.id));
        match opened {
            Ok(DeviceOpen::Opened) => self.on_device_opened(),
            Ok(DeviceOpen::Pending) => {},
            Err(err) if err.is_fatal() => {
                self.teardown();
                return Err(err);
            },
            Err(err) => {
                self.report_error(CAMERA_OPEN_FAILED, err);
                self.teardown();
            },
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if self.state == SessionState::Closed && !self.pool.is_allocated() {
            return;
        }
        debug!(state = %self.state, "closing camera");
        self.set_state(SessionState::Closing);
        self.teardown();
    }

    /// Creates the capture session once a texture and an open device exist.
    pub fn start_preview(&mut self) {
        let texture_id = self.surface.camera_texture_id().filter(|&id| id > 0);
        debug!(?texture_id, state = %self.state, "start preview");
        let Some(texture_id) = texture_id else {
            return;
        };
        if self.state != SessionState::Opened {
            return;
        }

        let ranges = self
            .camera_info(self.facing)
            .map(|info| info.characteristics.fps_ranges.clone())
            .unwrap_or_default();
        let fps_range =
            select_fps_range_with(&ranges, self.config.min_fps, self.config.low_light_fps);
        debug!(?fps_range, "selected target fps range");

        let request = CaptureRequestSettings::preview(fps_range, texture_id);
        self.set_state(SessionState::SessionConfiguring);
        match self.platform.create_capture_session(&request) {
            Ok(setup) => {
                self.request = Some(request);
                match setup {
                    SessionSetup::Configured => self.on_session_configured(),
                    SessionSetup::ConfigureFailed => self.on_session_configure_failed(),
                    SessionSetup::Pending => {},
                }
            },
            Err(err) => {
                self.report_error(CAMERA_PREVIEW_FAILED, err);
                self.set_state(SessionState::Opened);
            },
        }
    }

    /// Reopens the camera at a new resolution.
    ///
    /// Frame delivery is stopped and the buffers released before the device
    /// is reopened, so no consumer sees a buffer of the old size afterwards.
    pub fn change_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        info!(width, height, "changing resolution");
        self.frames_stopped = true;
        self.config.width = width;
        self.config.height = height;
        self.close();

        let reopened = self.open(self.facing);
        if reopened.is_ok() {
            self.listener
                .on_camera_changed(self.facing, self.orientation());
            self.start_preview();
        }
        self.frames_stopped = false;
        reopened
    }

    pub fn switch_camera(&mut self) -> Result<(), CameraError> {
        let facing = self.facing.flip();
        info!(%facing, "switching camera");
        self.frames_stopped = true;
        self.close();
        let reopened = self.open(facing);
        if reopened.is_ok() {
            self.listener.on_camera_changed(facing, self.orientation());
        }
        self.frames_stopped = false;
        reopened
    }

    fn on_device_opened(&mut self) {
        if self.state != SessionState::Opening {
            warn!(state = %self.state, "unexpected device open");
            return;
        }
        self.set_state(SessionState::Opened);
        let Size { width, height } = self.preview_size;
        self.listener.on_camera_opened(width, height);
        self.start_preview();
    }

    fn on_device_disconnected(&mut self) {
        warn!(state = %self.state, "camera disconnected");
        self.platform.close_session();
        self.platform.close_device();
        self.request = None;
        self.set_state(SessionState::Closed);
    }

    fn on_device_error(&mut self, code: i32) {
        self.platform.close_session();
        self.platform.close_device();
        self.request = None;
        self.set_state(SessionState::Closed);
        self.report_error(
            CAMERA_DEVICE_ERROR,
            CameraError::other(format!("camera device error {code}")),
        );
    }

    fn on_session_configured(&mut self) {
        if self.state != SessionState::SessionConfiguring {
            warn!(state = %self.state, "unexpected session configuration");
            return;
        }
        let Some(request) = self.request.as_ref() else {
            return;
        };
        match self.platform.set_repeating_request(request) {
            Ok(()) => self.set_state(SessionState::Previewing),
            Err(err) => error!(%err, "failed to set repeating request"),
        }
    }

    fn on_session_configure_failed(&mut self) {
        warn!("capture session configuration failed");
        self.request = None;
        if self.is_previewing() {
            self.set_state(SessionState::Opened);
        }
    }

    fn on_capture_sequence_completed(&mut self, sequence_id: i32, frame_number: i64) {
        trace!(sequence_id, frame_number, "capture sequence completed");
        if let Some(request) = self.request.as_mut() {
            request.af_trigger = None;
        }
    }

    fn on_image_available(&mut self) {
        let frames_stopped = self.frames_stopped;
        let pool_len = self.pool.buffer_len();
        let started = self.config.diagnostics.then(std::time::Instant::now);
        let mut converted: Option<Frame> = None;
        let mut dropped = false;

        let acquired = self.platform.with_latest_image(&mut |image| {
            if frames_stopped {
                return Ok(());
            }
            image.validate()?;
            if image.nv21_len() > pool_len {
                return Err(CameraError::invalid_frame(format!(
                    "{}x{} frame does not fit a {pool_len} byte buffer",
                    image.width(),
                    image.height()
                )));
            }
            let converter = &mut self.converter;
            match self.pool.fill_next(|buf| converter.convert(image, buf)) {
                Some(data) => {
                    let data = data.slice(..image.nv21_len());
                    converted = Some(
                        Frame::new_nv21(data, image.width(), image.height())
                            .with_timestamp_ns(image.timestamp_ns),
                    );
                },
                None => dropped = true,
            }
            Ok(())
        });

        match acquired {
            Ok(_) => {},
            Err(err) => {
                error!(%err, "failed to process camera image");
                self.emit(CameraEvent::Error { error: err });
                return;
            },
        }

        if dropped {
            debug!(sequence = self.sequence, "preview buffer still in use, frame dropped");
            self.emit(CameraEvent::FrameDropped {
                sequence: self.sequence,
            });
            return;
        }
        if let Some(frame) = converted {
            let frame = frame.with_sequence(self.sequence);
            self.sequence += 1;
            match started {
                Some(started) => debug!(
                    sequence = frame.sequence,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "frame converted"
                ),
                None => trace!(sequence = frame.sequence, "frame converted"),
            }
            self.sinks.publish(&frame);
            self.surface.request_render(&frame);
        }
    }

    fn camera_info(&self, facing: Facing) -> Option<&CameraInfo> {
        match facing {
            Facing::Front => self.front.as_ref(),
            Facing::Back => self.back.as_ref(),
        }
    }

    /// Releases everything the platform holds for this session.
    fn teardown(&mut self) {
        self.platform.close_session();
        self.platform.close_device();
        self.platform.close_image_reader();
        self.pool.release();
        self.request = None;
        self.set_state(SessionState::Closed);
    }

    fn report_error(&self, message: &'static str, err: CameraError) {
        error!(%err, "{message}");
        self.listener.on_camera_error(message);
        self.emit(CameraEvent::Error { error: err });
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "session state");
        let from = core::mem::replace(&mut self.state, state);
        self.emit(CameraEvent::StateChanged { from, to: state });
    }

    fn emit(&self, event: CameraEvent) {
        if let Some(events) = &self.events {
            let _ = events.try_send(event);
        }
    }
}
