// This is free and unencumbered software released into the public domain.

use super::{MediaResult, MediaStatus};
use crate::shared::{CropRect, Plane, YuvImage};
use core::{mem::zeroed, ptr::null_mut};
use ndk_sys::{
    AImage, AImage_delete, AImage_getCropRect, AImage_getNumberOfPlanes, AImage_getPlaneData,
    AImage_getPlanePixelStride, AImage_getPlaneRowStride, AImage_getTimestamp, AImageCropRect,
};

/// An image acquired from an [`ImageReader`](super::ImageReader), returned
/// to the reader on drop.
#[derive(Debug)]
pub struct Image {
    pub(crate) handle: *mut AImage,
}

impl Drop for Image {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { AImage_delete(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl Image {
    pub fn timestamp_ns(&self) -> MediaResult<u64> {
        let mut result = 0i64;
        MediaStatus::check(unsafe { AImage_getTimestamp(self.handle, &mut result) })?;
        Ok(result.max(0) as u64)
    }

    pub fn crop_rect(&self) -> MediaResult<CropRect> {
        let mut rect: AImageCropRect = unsafe { zeroed() };
        MediaStatus::check(unsafe { AImage_getCropRect(self.handle, &mut rect) })?;
        Ok(CropRect::new(
            rect.left.max(0) as usize,
            rect.top.max(0) as usize,
            (rect.right - rect.left).max(0) as usize,
            (rect.bottom - rect.top).max(0) as usize,
        ))
    }

    fn plane(&self, index: i32) -> MediaResult<Plane<'_>> {
        let (mut data, mut len) = (null_mut(), 0);
        let (mut row_stride, mut pixel_stride) = (0, 0);
        unsafe {
            MediaStatus::check(AImage_getPlaneData(self.handle, index, &mut data, &mut len))?;
            MediaStatus::check(AImage_getPlaneRowStride(self.handle, index, &mut row_stride))?;
            MediaStatus::check(AImage_getPlanePixelStride(self.handle, index, &mut pixel_stride))?;
        }
        let data: &[u8] = if data.is_null() || len <= 0 {
            &[]
        } else {
            unsafe { core::slice::from_raw_parts(data, len as usize) }
        };
        Ok(Plane::new(
            data,
            row_stride.max(0) as usize,
            pixel_stride.max(0) as usize,
        ))
    }

    /// Borrows the three planes of a `YUV_420_888` image.
    pub fn as_yuv(&self) -> MediaResult<YuvImage<'_>> {
        let mut planes = 0;
        MediaStatus::check(unsafe { AImage_getNumberOfPlanes(self.handle, &mut planes) })?;
        if planes != 3 {
            return Err(MediaStatus(ndk_sys::media_status_t::AMEDIA_ERROR_UNSUPPORTED));
        }
        let image = YuvImage::new(
            self.crop_rect()?,
            [self.plane(0)?, self.plane(1)?, self.plane(2)?],
        );
        Ok(image.with_timestamp_ns(self.timestamp_ns()?))
    }
}
