// This is free and unencumbered software released into the public domain.

use super::{CameraManager, CameraResult, CameraStatus, MessageContext};
use crate::shared::SessionMsg;
use alloc::ffi::CString;
use core::{
    ffi::{c_int, c_void},
    mem::zeroed,
    ptr::null_mut,
};
use ndk_sys::{ACameraDevice, ACameraDevice_StateCallbacks, ACameraDevice_close};
use tracing::{debug, warn};

/// An open camera device. Disconnects and errors are posted to the camera
/// thread through the [`MessageContext`] it was opened with.
#[derive(Debug)]
pub struct CameraDevice {
    pub(crate) handle: *mut ACameraDevice,
    id: CString,
    // The NDK keeps a pointer to these until the device is closed.
    _state_callbacks: Box<ACameraDevice_StateCallbacks>,
}

impl Drop for CameraDevice {
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        // See: https://developer.android.com/ndk/reference/group/camera#acameradevice_close
        if let Err(status) = CameraStatus::check(unsafe { ACameraDevice_close(self.handle) }) {
            warn!(id = ?self.id, %status, "failed to close camera device");
        }
        self.handle = null_mut();
    }
}

impl CameraDevice {
    pub fn open(
        manager: &CameraManager,
        id: &str,
        context: &MessageContext,
    ) -> CameraResult<Self> {
        let id = CString::new(id).map_err(|_| CameraStatus::invalid_parameter())?;

        unsafe extern "C" fn on_disconnected(context: *mut c_void, device: *mut ACameraDevice) {
            debug!(?device, "camera device disconnected");
            unsafe { MessageContext::post(context, SessionMsg::DeviceDisconnected) };
        }

        unsafe extern "C" fn on_error(
            context: *mut c_void,
            device: *mut ACameraDevice,
            error: c_int,
        ) {
            debug!(?device, error, "camera device error");
            unsafe { MessageContext::post(context, SessionMsg::DeviceError { code: error }) };
        }

        let mut callbacks: Box<ACameraDevice_StateCallbacks> = Box::new(unsafe { zeroed() });
        callbacks.context = context.as_ptr();
        callbacks.onDisconnected = Some(on_disconnected);
        callbacks.onError = Some(on_error);

        let mut handle = null_mut();
        manager.open_camera(&id, &mut callbacks, &mut handle)?;
        Ok(Self {
            handle,
            id,
            _state_callbacks: callbacks,
        })
    }
}
