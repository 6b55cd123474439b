// This is free and unencumbered software released into the public domain.

use super::{CameraDevice, CameraOutputTarget, CameraResult, CameraStatus};
use crate::shared::{CaptureRequestSettings, RequestTemplate};
use core::ptr::null_mut;
use ndk_sys::{
    ACameraDevice_createCaptureRequest, ACameraDevice_request_template, ACaptureRequest,
    ACaptureRequest_addTarget, ACaptureRequest_free, ACaptureRequest_setEntry_i32,
    ACaptureRequest_setEntry_u8, acamera_metadata_tag as Tag,
};

#[derive(Debug)]
pub struct CaptureRequest {
    pub(crate) handle: *mut ACaptureRequest,
    // Targets must outlive the request.
    targets: Vec<CameraOutputTarget>,
}

impl Drop for CaptureRequest {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACaptureRequest_free(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl CaptureRequest {
    pub fn new(device: &CameraDevice, template: RequestTemplate) -> CameraResult<Self> {
        let template = match template {
            RequestTemplate::Preview => ACameraDevice_request_template::TEMPLATE_PREVIEW,
        };
        let mut handle = null_mut();
        CameraStatus::check(unsafe {
            ACameraDevice_createCaptureRequest(device.handle, template, &mut handle)
        })?;
        Ok(Self {
            handle,
            targets: Vec::new(),
        })
    }

    pub fn add_target(&mut self, target: CameraOutputTarget) -> CameraResult {
        CameraStatus::check(unsafe { ACaptureRequest_addTarget(self.handle, target.handle) })?;
        self.targets.push(target);
        Ok(())
    }

    fn set_u8(&mut self, tag: Tag, value: u8) -> CameraResult {
        CameraStatus::check(unsafe { ACaptureRequest_setEntry_u8(self.handle, tag.0, 1, &value) })
    }

    fn set_i32s(&mut self, tag: Tag, values: &[i32]) -> CameraResult {
        CameraStatus::check(unsafe {
            ACaptureRequest_setEntry_i32(self.handle, tag.0, values.len() as u32, values.as_ptr())
        })
    }

    /// Writes the control entries of `settings` into the request.
    pub fn apply(&mut self, settings: &CaptureRequestSettings) -> CameraResult {
        if let Some(range) = settings.target_fps_range {
            self.set_i32s(Tag::ACAMERA_CONTROL_AE_TARGET_FPS_RANGE, &[range.lower, range.upper])?;
        }
        self.set_u8(Tag::ACAMERA_CONTROL_MODE, settings.control_mode as u8)?;
        self.set_u8(Tag::ACAMERA_CONTROL_AE_LOCK, settings.ae_lock as u8)?;
        self.set_u8(Tag::ACAMERA_CONTROL_AE_MODE, settings.ae_mode as u8)?;
        self.set_u8(Tag::ACAMERA_CONTROL_AF_MODE, settings.af_mode as u8)?;
        if let Some(trigger) = settings.af_trigger {
            self.set_u8(Tag::ACAMERA_CONTROL_AF_TRIGGER, trigger as u8)?;
        }
        Ok(())
    }
}
