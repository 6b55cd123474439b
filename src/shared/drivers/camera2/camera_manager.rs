// This is free and unencumbered software released into the public domain.

use super::{CameraMetadata, CameraResult, CameraStatus};
use alloc::ffi::CString;
use core::{ffi::CStr, ptr::null_mut};
use ndk_sys::{
    ACameraDevice, ACameraDevice_StateCallbacks, ACameraManager, ACameraManager_create,
    ACameraManager_delete, ACameraManager_deleteCameraIdList,
    ACameraManager_getCameraCharacteristics, ACameraManager_getCameraIdList,
    ACameraManager_openCamera,
};
use scopeguard::defer;

#[derive(Debug)]
pub struct CameraManager {
    pub(crate) handle: *mut ACameraManager,
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraManager_delete(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl CameraManager {
    pub fn new() -> CameraResult<Self> {
        // See: https://developer.android.com/ndk/reference/group/camera#acameramanager_create
        let handle = unsafe { ACameraManager_create() };
        if handle.is_null() {
            return Err(CameraStatus::invalid_parameter());
        }
        Ok(Self { handle })
    }

    pub fn camera_ids(&self) -> CameraResult<Vec<String>> {
        let mut list_ptr = null_mut();
        CameraStatus::check(unsafe { ACameraManager_getCameraIdList(self.handle, &mut list_ptr) })?;

        defer! {
            unsafe { ACameraManager_deleteCameraIdList(list_ptr); }
        }

        let list = unsafe { &*list_ptr };
        if list.numCameras < 1 {
            return Ok(Vec::new()); // no devices
        }

        let ids = unsafe { core::slice::from_raw_parts(list.cameraIds, list.numCameras as usize) };
        Ok(ids
            .iter()
            .filter(|p| !p.is_null())
            .map(|p| unsafe { CStr::from_ptr(*p) }.to_string_lossy().into_owned())
            .collect())
    }

    pub fn characteristics(&self, id: &str) -> CameraResult<CameraMetadata> {
        let id = CString::new(id).map_err(|_| CameraStatus::invalid_parameter())?;
        let mut handle = null_mut();
        CameraStatus::check(unsafe {
            ACameraManager_getCameraCharacteristics(self.handle, id.as_ptr(), &mut handle)
        })?;
        Ok(CameraMetadata { handle })
    }

    pub(crate) fn open_camera(
        &self,
        id: &CStr,
        callbacks: &mut ACameraDevice_StateCallbacks,
        device: &mut *mut ACameraDevice,
    ) -> CameraResult {
        // See: https://developer.android.com/ndk/reference/group/camera#acameramanager_opencamera
        CameraStatus::check(unsafe {
            ACameraManager_openCamera(self.handle, id.as_ptr(), callbacks, device)
        })
    }
}
