// This is free and unencumbered software released into the public domain.

#![allow(dead_code)]

use asimov_camera2_module::shared::{
    CameraCharacteristics, CameraError, CameraListener, CameraPlatform, CaptureRequestSettings,
    CropRect, DeviceOpen, Facing, FpsRange, Frame, Plane, RenderSurface, SessionMsg, SessionSetup,
    Size, YuvImage,
};
use std::{
    borrow::Cow,
    collections::VecDeque,
    sync::{Arc, Mutex},
};

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A planar YUV_420_888 image with tightly packed planes.
#[derive(Clone, Debug)]
pub struct TestImage {
    pub width: usize,
    pub height: usize,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub timestamp_ns: u64,
}

impl TestImage {
    /// Luma samples are `seed + index`, chroma `seed + 100 + index` (U)
    /// and `seed + 200 + index` (V), all wrapping.
    pub fn patterned(width: usize, height: usize, seed: u8) -> Self {
        let chroma = (width / 2) * (height / 2);
        Self {
            width,
            height,
            y: (0..width * height).map(|i| seed.wrapping_add(i as u8)).collect(),
            u: (0..chroma).map(|i| seed.wrapping_add(100).wrapping_add(i as u8)).collect(),
            v: (0..chroma).map(|i| seed.wrapping_add(200).wrapping_add(i as u8)).collect(),
            timestamp_ns: 0,
        }
    }

    pub fn with_timestamp_ns(mut self, ts: u64) -> Self {
        self.timestamp_ns = ts;
        self
    }

    pub fn as_yuv(&self) -> YuvImage<'_> {
        YuvImage::new(
            CropRect::full(self.width, self.height),
            [
                Plane::new(&self.y, self.width, 1),
                Plane::new(&self.u, self.width / 2, 1),
                Plane::new(&self.v, self.width / 2, 1),
            ],
        )
        .with_timestamp_ns(self.timestamp_ns)
    }

    /// The NV21 bytes this image converts into.
    pub fn expected_nv21(&self) -> Vec<u8> {
        let mut out = self.y.clone();
        for (v, u) in self.v.iter().zip(&self.u) {
            out.push(*v);
            out.push(*u);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Failures {
    pub open_device: bool,
    pub image_reader: bool,
    pub capture_session: bool,
    pub configure: bool,
    pub repeating_request: bool,
}

/// State shared between a test and the platform it handed to the session.
#[derive(Debug, Default)]
pub struct Script {
    pub calls: Vec<String>,
    pub images: VecDeque<TestImage>,
    pub requests: Vec<CaptureRequestSettings>,
    pub reader_size: Option<Size>,
    pub failures: Failures,
    /// Callback events waiting for the session to drain them.
    pub events: Vec<SessionMsg>,
}

/// A camera service that records every call and answers from a script.
///
/// When synchronous it completes opens and configurations inline the way
/// the NDK binding does; otherwise they stay pending and the test delivers
/// the completion messages itself.
pub struct ScriptedPlatform {
    pub permission: bool,
    pub cameras: Vec<(String, CameraCharacteristics)>,
    pub script: Arc<Mutex<Script>>,
    synchronous: bool,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            permission: true,
            cameras: vec![
                ("0".into(), characteristics(Facing::Back, 90)),
                ("1".into(), characteristics(Facing::Front, 270)),
            ],
            script: Arc::default(),
            synchronous: false,
        }
    }

    pub fn synchronous(mut self) -> Self {
        self.synchronous = true;
        self
    }

    pub fn without_permission(mut self) -> Self {
        self.permission = false;
        self
    }

    pub fn without_cameras(mut self) -> Self {
        self.cameras.clear();
        self
    }

    pub fn with_failures(self, failures: Failures) -> Self {
        self.script.lock().unwrap().failures = failures;
        self
    }

    pub fn script(&self) -> Arc<Mutex<Script>> {
        Arc::clone(&self.script)
    }

    fn record(&self, call: impl Into<String>) {
        self.script.lock().unwrap().calls.push(call.into());
    }

    fn failures(&self) -> Failures {
        self.script.lock().unwrap().failures
    }
}

pub fn characteristics(facing: Facing, orientation: u32) -> CameraCharacteristics {
    CameraCharacteristics {
        facing: Some(facing),
        sensor_orientation: Some(orientation),
        output_sizes: vec![
            Size::new(1920, 1080),
            Size::new(1280, 720),
            Size::new(640, 480),
            Size::new(320, 240),
            Size::new(8, 6),
            Size::new(4, 4),
        ],
        fps_ranges: vec![
            FpsRange::new(7, 30),
            FpsRange::new(15, 15),
            FpsRange::new(15, 30),
            FpsRange::new(30, 30),
        ],
        max_af_regions: Some(1),
    }
}

fn injected(what: &'static str) -> CameraError {
    CameraError::driver(what, std::io::Error::other("injected failure"))
}

impl dogma::Named for ScriptedPlatform {
    fn name(&self) -> Cow<'_, str> {
        "scripted".into()
    }
}

impl CameraPlatform for ScriptedPlatform {
    fn has_camera_permission(&self) -> bool {
        self.permission
    }

    fn camera_ids(&mut self) -> Result<Vec<String>, CameraError> {
        self.record("camera_ids");
        Ok(self.cameras.iter().map(|(id, _)| id.clone()).collect())
    }

    fn characteristics(&mut self, id: &str) -> Result<CameraCharacteristics, CameraError> {
        self.cameras
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, c)| c.clone())
            .ok_or(CameraError::NoCamera)
    }

    fn create_image_reader(&mut self, size: Size, max_images: usize) -> Result<(), CameraError> {
        self.record(format!("create_image_reader {size} {max_images}"));
        if self.failures().image_reader {
            return Err(injected("creating image reader"));
        }
        self.script.lock().unwrap().reader_size = Some(size);
        Ok(())
    }

    fn open_device(&mut self, id: &str) -> Result<DeviceOpen, CameraError> {
        self.record(format!("open_device {id}"));
        if self.failures().open_device {
            return Err(injected("opening camera"));
        }
        Ok(if self.synchronous {
            DeviceOpen::Opened
        } else {
            DeviceOpen::Pending
        })
    }

    fn create_capture_session(
        &mut self,
        request: &CaptureRequestSettings,
    ) -> Result<SessionSetup, CameraError> {
        self.record("create_capture_session");
        let failures = self.failures();
        if failures.capture_session {
            return Err(injected("creating capture session"));
        }
        self.script.lock().unwrap().requests.push(request.clone());
        Ok(match (self.synchronous, failures.configure) {
            (false, _) => SessionSetup::Pending,
            (true, false) => SessionSetup::Configured,
            (true, true) => SessionSetup::ConfigureFailed,
        })
    }

    fn set_repeating_request(
        &mut self,
        request: &CaptureRequestSettings,
    ) -> Result<(), CameraError> {
        self.record("set_repeating_request");
        if self.failures().repeating_request {
            return Err(injected("setting repeating request"));
        }
        self.script.lock().unwrap().requests.push(request.clone());
        Ok(())
    }

    fn with_latest_image(
        &mut self,
        f: &mut dyn FnMut(&YuvImage<'_>) -> Result<(), CameraError>,
    ) -> Result<bool, CameraError> {
        let latest = {
            let mut script = self.script.lock().unwrap();
            let latest = script.images.pop_back();
            script.images.clear();
            latest
        };
        match latest {
            Some(image) => {
                f(&image.as_yuv())?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn close_session(&mut self) {
        self.record("close_session");
    }

    fn close_device(&mut self) {
        self.record("close_device");
    }

    fn close_image_reader(&mut self) {
        self.record("close_image_reader");
        self.script.lock().unwrap().reader_size = None;
    }

    fn drain_events(&mut self) -> Vec<SessionMsg> {
        core::mem::take(&mut self.script.lock().unwrap().events)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerEvent {
    Opened(u32, u32),
    Changed(Facing, u32),
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }
}

impl CameraListener for RecordingListener {
    fn on_camera_opened(&self, width: u32, height: u32) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::Opened(width, height));
    }

    fn on_camera_changed(&self, facing: Facing, orientation: u32) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::Changed(facing, orientation));
    }

    fn on_camera_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::Error(message.into()));
    }
}

/// Keeps every rendered frame, and with it the pool slot it points to.
#[derive(Debug)]
pub struct RecordingSurface {
    pub texture_id: Mutex<Option<u32>>,
    pub frames: Mutex<Vec<Frame>>,
}

impl RecordingSurface {
    pub fn new(texture_id: Option<u32>) -> Self {
        Self {
            texture_id: Mutex::new(texture_id),
            frames: Mutex::default(),
        }
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    /// Lets go of rendered frames so their buffers can be reused.
    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn camera_texture_id(&self) -> Option<u32> {
        *self.texture_id.lock().unwrap()
    }

    fn request_render(&self, frame: &Frame) {
        self.frames.lock().unwrap().push(frame.clone());
    }
}
