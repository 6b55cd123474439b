// This is free and unencumbered software released into the public domain.

//! `YUV_420_888` to NV21 conversion.
//!
//! NV21 stores every luma sample first, row by row, followed by the chroma
//! samples at half resolution in both directions, interleaved V then U.

use crate::shared::{PixelFormat, YuvImage};

/// Bytes needed for an NV21 frame of `width` x `height`.
pub const fn nv21_buffer_size(width: usize, height: usize) -> usize {
    PixelFormat::Nv21.buffer_size(width, height)
}

/// Where a plane lands in the NV21 buffer: start offset and output stride.
const fn nv21_placement(index: usize, luma_len: usize) -> (usize, usize) {
    match index {
        0 => (0, 1),
        1 => (luma_len + 1, 2),
        _ => (luma_len, 2),
    }
}

/// Converter with a reusable row staging buffer.
///
/// The staging buffer grows to the widest row stride seen and is then reused,
/// so steady-state conversion does not allocate.
#[derive(Clone, Debug, Default)]
pub struct Nv21Converter {
    row: Vec<u8>,
}

impl Nv21Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_capacity(capacity: usize) -> Self {
        Self {
            row: vec![0; capacity],
        }
    }

    pub fn row_capacity(&self) -> usize {
        self.row.len()
    }

    /// Writes `image` into `output` as NV21.
    ///
    /// # Panics
    ///
    /// If `output` is shorter than [`YuvImage::nv21_len`] or the planes are
    /// smaller than their strides and crop imply. [`YuvImage::validate`]
    /// checks the latter up front.
    pub fn convert(&mut self, image: &YuvImage<'_>, output: &mut [u8]) {
        yuv420_to_nv21(image, output, &mut self.row)
    }

    pub fn convert_to_vec(&mut self, image: &YuvImage<'_>) -> Vec<u8> {
        let mut output = vec![0; image.nv21_len()];
        self.convert(image, &mut output);
        output
    }
}

// Runs once per preview frame; keep it free of allocation after warm-up.
pub fn yuv420_to_nv21(image: &YuvImage<'_>, output: &mut [u8], scratch: &mut Vec<u8>) {
    let (width, height) = (image.width(), image.height());
    let luma_len = width * height;

    for (index, plane) in image.planes.iter().enumerate() {
        let (mut channel_offset, output_stride) = nv21_placement(index, luma_len);
        let shift = YuvImage::plane_shift(index);
        let (w, h) = (width >> shift, height >> shift);
        if w == 0 || h == 0 {
            continue;
        }

        let (row_stride, pixel_stride) = (plane.row_stride, plane.pixel_stride);
        let mut position = image.plane_origin(index);

        for row in 0..h {
            let length;
            if pixel_stride == 1 && output_stride == 1 {
                length = w;
                output[channel_offset..channel_offset + length]
                    .copy_from_slice(&plane.data[position..position + length]);
                channel_offset += length;
            } else {
                length = (w - 1) * pixel_stride + 1;
                if scratch.len() < length {
                    scratch.resize(row_stride.max(length), 0);
                }
                let staged = &mut scratch[..length];
                staged.copy_from_slice(&plane.data[position..position + length]);
                let samples = staged.iter().step_by(pixel_stride);
                let targets = output[channel_offset..].iter_mut().step_by(output_stride);
                for (dst, src) in targets.zip(samples) {
                    *dst = *src;
                }
                channel_offset += w * output_stride;
            }
            position += length;
            // Skip row padding; the last row may end without any.
            if row + 1 < h {
                position = position + row_stride - length;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{CropRect, Plane};

    #[test]
    fn contiguous_4x4_is_identity_with_vu_interleave() {
        let y: Vec<u8> = (0..16).collect();
        let u = [100, 101, 102, 103];
        let v = [200, 201, 202, 203];
        let image = YuvImage::new(
            CropRect::full(4, 4),
            [Plane::new(&y, 4, 1), Plane::new(&u, 2, 1), Plane::new(&v, 2, 1)],
        );

        let out = Nv21Converter::new().convert_to_vec(&image);
        assert_eq!(out.len(), 24);
        assert_eq!(&out[..16], &y[..]);
        assert_eq!(&out[16..], &[200, 100, 201, 101, 202, 102, 203, 103]);
    }

    #[test]
    fn row_padding_is_never_copied() {
        const PAD: u8 = 0xFF;
        let y = [1, 2, 3, 4, PAD, PAD, PAD, PAD, 5, 6, 7, 8, PAD, PAD, PAD, PAD];
        let u = [10, 11, PAD, PAD];
        let v = [20, 21, PAD, PAD];
        let image = YuvImage::new(
            CropRect::full(4, 2),
            [Plane::new(&y, 8, 1), Plane::new(&u, 4, 1), Plane::new(&v, 4, 1)],
        );

        let out = Nv21Converter::new().convert_to_vec(&image);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8, 20, 10, 21, 11]);
        assert!(!out.contains(&PAD));
    }

    #[test]
    fn pixel_stride_two_chroma_skips_every_other_byte() {
        // Semi-planar VU memory as cameras usually deliver it: the V plane
        // starts at the first byte, the U plane one byte later.
        let y = [0u8; 16];
        let vu = [30, 40, 31, 41, 32, 42, 33, 43];
        let image = YuvImage::new(
            CropRect::full(4, 4),
            [Plane::new(&y, 4, 1), Plane::new(&vu[1..], 4, 2), Plane::new(&vu[..7], 4, 2)],
        );

        let mut converter = Nv21Converter::new();
        let out = converter.convert_to_vec(&image);
        assert_eq!(&out[16..], &vu[..]);
        assert!(converter.row_capacity() >= 4);
    }

    #[test]
    fn separate_chroma_planes_with_pixel_stride_two() {
        const GAP: u8 = 0xEE;
        let y = [0u8; 16];
        let u = [1, GAP, 2, GAP, 3, GAP, 4];
        let v = [5, GAP, 6, GAP, 7, GAP, 8];
        let image = YuvImage::new(
            CropRect::full(4, 4),
            [Plane::new(&y, 4, 1), Plane::new(&u, 4, 2), Plane::new(&v, 4, 2)],
        );

        let out = Nv21Converter::new().convert_to_vec(&image);
        // V samples at width*height, U samples at width*height + 1.
        assert_eq!(&out[16..], &[5, 1, 6, 2, 7, 3, 8, 4]);
    }

    #[test]
    fn cropped_source_starts_at_crop_origin() {
        let y: Vec<u8> = (0..36).collect();
        let u: Vec<u8> = (100..109).collect();
        let v: Vec<u8> = (200..209).collect();
        let image = YuvImage::new(
            CropRect::new(2, 2, 4, 2),
            [Plane::new(&y, 6, 1), Plane::new(&u, 3, 1), Plane::new(&v, 3, 1)],
        );

        assert_eq!(image.plane_origin(0), 6 * 2 + 2);
        assert_eq!(image.plane_origin(1), 3 + 1);
        assert_eq!(image.plane_origin(2), 3 + 1);
        assert!(image.validate().is_ok());

        let out = Nv21Converter::new().convert_to_vec(&image);
        assert_eq!(&out[..8], &[14, 15, 16, 17, 20, 21, 22, 23]);
        assert_eq!(&out[8..], &[204, 104, 205, 105]);
    }

    #[test]
    fn conversion_is_idempotent() {
        let y: Vec<u8> = (0..64).map(|i| (i * 7) as u8).collect();
        let vu: Vec<u8> = (0..32).map(|i| (i * 13) as u8).collect();
        let image = YuvImage::new(
            CropRect::full(8, 8),
            [Plane::new(&y, 8, 1), Plane::new(&vu[1..], 8, 2), Plane::new(&vu[..31], 8, 2)],
        );

        let mut converter = Nv21Converter::new();
        let mut first = vec![0xAA; image.nv21_len()];
        let mut second = vec![0x55; image.nv21_len()];
        converter.convert(&image, &mut first);
        converter.convert(&image, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn minimum_frame_is_six_bytes() {
        let y = [1, 2, 3, 4];
        let u = [5];
        let v = [6];
        let image = YuvImage::new(
            CropRect::full(2, 2),
            [Plane::new(&y, 2, 1), Plane::new(&u, 1, 1), Plane::new(&v, 1, 1)],
        );

        assert_eq!(nv21_buffer_size(2, 2), 6);
        let out = Nv21Converter::new().convert_to_vec(&image);
        assert_eq!(out, [1, 2, 3, 4, 6, 5]);
    }

    #[test]
    fn output_may_be_larger_than_frame() {
        let y = [9u8; 4];
        let c = [7u8; 1];
        let image = YuvImage::new(
            CropRect::full(2, 2),
            [Plane::new(&y, 2, 1), Plane::new(&c, 1, 1), Plane::new(&c, 1, 1)],
        );

        let mut output = [0u8; 8];
        Nv21Converter::with_row_capacity(16).convert(&image, &mut output);
        assert_eq!(output, [9, 9, 9, 9, 7, 7, 0, 0]);
    }
}
