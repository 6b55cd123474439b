// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use bytes::Bytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Android `YUV_420_888`: three planes with independent strides.
    Yuv420,
    /// Full-resolution Y followed by interleaved V/U at half resolution.
    Nv21,
}

impl PixelFormat {
    pub const fn bits_per_pixel(self) -> usize {
        match self {
            Self::Yuv420 | Self::Nv21 => 12,
        }
    }

    pub const fn buffer_size(self, width: usize, height: usize) -> usize {
        width * height * self.bits_per_pixel() / 8
    }
}

/// A converted frame handed to sinks and the render surface.
///
/// `data` may be backed by a pooled buffer: the pool reuses the slot only
/// after every clone of `data` is dropped.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Bytes,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub pixel_format: PixelFormat,
    pub timestamp_ns: u64,
    pub sequence: u64,
}

impl Frame {
    pub fn new_nv21(data: Bytes, width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
            stride: width,
            pixel_format: PixelFormat::Nv21,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    pub fn with_timestamp_ns(mut self, ts: u64) -> Self {
        self.timestamp_ns = ts;
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn luma(&self) -> &[u8] {
        &self.data[..self.width * self.height]
    }

    /// The interleaved V/U samples of an NV21 frame.
    pub fn chroma(&self) -> &[u8] {
        &self.data[self.width * self.height..]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl CropRect {
    pub const fn new(left: usize, top: usize, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub const fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }
}

/// A borrowed `YUV_420_888` image: planes in Y, U, V order plus the crop.
#[derive(Clone, Copy, Debug)]
pub struct YuvImage<'a> {
    pub crop: CropRect,
    pub planes: [Plane<'a>; 3],
    pub timestamp_ns: u64,
}

impl<'a> YuvImage<'a> {
    pub const fn new(crop: CropRect, planes: [Plane<'a>; 3]) -> Self {
        Self {
            crop,
            planes,
            timestamp_ns: 0,
        }
    }

    pub fn with_timestamp_ns(mut self, ts: u64) -> Self {
        self.timestamp_ns = ts;
        self
    }

    pub const fn width(&self) -> usize {
        self.crop.width
    }

    pub const fn height(&self) -> usize {
        self.crop.height
    }

    /// Size of the NV21 buffer this image converts into.
    pub const fn nv21_len(&self) -> usize {
        PixelFormat::Nv21.buffer_size(self.crop.width, self.crop.height)
    }

    /// Subsampling shift of the plane: 0 for luma, 1 for chroma.
    pub const fn plane_shift(index: usize) -> usize {
        if index == 0 { 0 } else { 1 }
    }

    /// Byte offset of the first cropped sample within a plane.
    pub fn plane_origin(&self, index: usize) -> usize {
        let plane = &self.planes[index];
        let shift = Self::plane_shift(index);
        plane.row_stride * (self.crop.top >> shift) + plane.pixel_stride * (self.crop.left >> shift)
    }

    /// Checks the invariants the converter relies on.
    pub fn validate(&self) -> Result<(), CameraError> {
        let (width, height) = (self.crop.width, self.crop.height);
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(CameraError::invalid_frame(format!(
                "crop {width}x{height} must be even and non-empty"
            )));
        }

        for (index, plane) in self.planes.iter().enumerate() {
            let shift = Self::plane_shift(index);
            let (w, h) = (width >> shift, height >> shift);
            if plane.pixel_stride == 0 {
                return Err(CameraError::invalid_frame(format!(
                    "plane {index} has zero pixel stride"
                )));
            }
            let row_len = (w - 1) * plane.pixel_stride + 1;
            if plane.row_stride < row_len {
                return Err(CameraError::invalid_frame(format!(
                    "plane {index} row stride {} is shorter than a row ({row_len})",
                    plane.row_stride
                )));
            }
            let end = self.plane_origin(index) + (h - 1) * plane.row_stride + row_len;
            if end > plane.data.len() {
                return Err(CameraError::invalid_frame(format!(
                    "plane {index} needs {end} bytes but has {}",
                    plane.data.len()
                )));
            }
        }
        Ok(())
    }
}
