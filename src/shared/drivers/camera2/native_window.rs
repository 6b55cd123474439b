// This is free and unencumbered software released into the public domain.

use core::ptr::null_mut;
use ndk_sys::{ANativeWindow, ANativeWindow_acquire, ANativeWindow_release};

#[derive(Debug)]
pub struct NativeWindow {
    pub(crate) handle: *mut ANativeWindow,
    owned: bool,
}

impl Drop for NativeWindow {
    fn drop(&mut self) {
        if self.owned && !self.handle.is_null() {
            unsafe { ANativeWindow_release(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl NativeWindow {
    /// Takes a reference on a window the host created, e.g. from the
    /// preview `SurfaceTexture`.
    ///
    /// # Safety
    ///
    /// `handle` must be a valid `ANativeWindow`.
    pub unsafe fn from_raw(handle: *mut ANativeWindow) -> Self {
        unsafe { ANativeWindow_acquire(handle) };
        Self {
            handle,
            owned: true,
        }
    }

    /// A window owned by someone else (an image reader), valid while they are.
    pub(crate) fn borrowed(handle: *mut ANativeWindow) -> Self {
        Self {
            handle,
            owned: false,
        }
    }
}
