// This is free and unencumbered software released into the public domain.

use super::{Image, MediaResult, MediaStatus, MessageContext, NativeWindow};
use crate::shared::{SessionMsg, Size};
use core::{ffi::c_void, ptr::null_mut};
use ndk_sys::{
    AIMAGE_FORMATS, AImageReader, AImageReader_ImageListener, AImageReader_acquireLatestImage,
    AImageReader_delete, AImageReader_getWindow, AImageReader_new, AImageReader_setImageListener,
};

/// A `YUV_420_888` image queue fed by the capture session.
#[derive(Debug)]
pub struct ImageReader {
    pub(crate) handle: *mut AImageReader,
    size: Size,
    // The NDK keeps a pointer to the listener until the reader is deleted.
    _listener: Box<AImageReader_ImageListener>,
}

impl Drop for ImageReader {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { AImageReader_delete(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl ImageReader {
    pub fn new(size: Size, max_images: usize, context: &MessageContext) -> MediaResult<Self> {
        // See: https://developer.android.com/ndk/reference/group/media#aimagereader_new
        let format = AIMAGE_FORMATS::AIMAGE_FORMAT_YUV_420_888.0 as i32;
        let mut handle = null_mut();
        MediaStatus::check(unsafe {
            AImageReader_new(
                size.width as i32,
                size.height as i32,
                format,
                max_images.max(1) as i32,
                &mut handle,
            )
        })?;

        unsafe extern "C" fn on_image_available(context: *mut c_void, _reader: *mut AImageReader) {
            unsafe { MessageContext::try_post(context, SessionMsg::ImageAvailable) };
        }

        let mut result = Self {
            handle,
            size,
            _listener: Box::new(AImageReader_ImageListener {
                context: context.as_ptr(),
                onImageAvailable: Some(on_image_available),
            }),
        };
        MediaStatus::check(unsafe {
            AImageReader_setImageListener(result.handle, &mut *result._listener)
        })?;
        Ok(result)
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The reader's input surface; valid as long as the reader is.
    pub fn window(&self) -> MediaResult<NativeWindow> {
        let mut window = null_mut();
        MediaStatus::check(unsafe { AImageReader_getWindow(self.handle, &mut window) })?;
        Ok(NativeWindow::borrowed(window))
    }

    /// Returns `None` when no image is queued.
    pub fn acquire_latest_image(&self) -> MediaResult<Option<Image>> {
        let mut handle = null_mut();
        let status = unsafe { AImageReader_acquireLatestImage(self.handle, &mut handle) };
        match MediaStatus::check(status) {
            Ok(()) => Ok(Some(Image { handle })),
            Err(status) if status.is_no_buffer() => Ok(None),
            Err(status) => Err(status),
        }
    }
}
