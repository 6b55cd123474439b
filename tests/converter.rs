// This is free and unencumbered software released into the public domain.

use asimov_camera2_module::shared::{CropRect, Nv21Converter, Plane, YuvImage, nv21_buffer_size};

/// Reads sample `(x, y)` of a plane by address arithmetic alone.
fn sample(plane: &Plane<'_>, x: usize, y: usize) -> u8 {
    plane.data[y * plane.row_stride + x * plane.pixel_stride]
}

fn reference_nv21(image: &YuvImage<'_>) -> Vec<u8> {
    let CropRect {
        left,
        top,
        width,
        height,
    } = image.crop;
    let [y, u, v] = &image.planes;
    let mut out = Vec::with_capacity(nv21_buffer_size(width, height));
    for row in 0..height {
        for col in 0..width {
            out.push(sample(y, left + col, top + row));
        }
    }
    for row in 0..height / 2 {
        for col in 0..width / 2 {
            out.push(sample(v, left / 2 + col, top / 2 + row));
            out.push(sample(u, left / 2 + col, top / 2 + row));
        }
    }
    out
}

/// A semi-planar buffer as devices typically deliver it: padded rows, one
/// interleaved chroma plane read through two overlapping views, and no
/// padding after the last row.
fn device_buffer(width: usize, height: usize, row_stride: usize) -> (Vec<u8>, Vec<u8>) {
    let luma_len = row_stride * (height - 1) + width;
    let chroma_len = row_stride * (height / 2 - 1) + width;
    let luma = (0..luma_len).map(|i| (i * 7 % 251) as u8).collect();
    let chroma = (0..chroma_len).map(|i| (i * 13 % 241) as u8).collect();
    (luma, chroma)
}

#[test]
fn semi_planar_device_frame_matches_reference() {
    let (width, height, row_stride) = (48, 32, 64);
    let (luma, chroma) = device_buffer(width, height, row_stride);
    let image = YuvImage::new(
        CropRect::full(width, height),
        [
            Plane::new(&luma, row_stride, 1),
            Plane::new(&chroma, row_stride, 2),
            Plane::new(&chroma[1..], row_stride, 2),
        ],
    );
    image.validate().unwrap();

    let nv21 = Nv21Converter::new().convert_to_vec(&image);
    assert_eq!(nv21.len(), width * height * 3 / 2);
    assert_eq!(nv21, reference_nv21(&image));
}

#[test]
fn cropped_device_frame_matches_reference() {
    let (width, height, row_stride) = (48, 32, 64);
    let (luma, chroma) = device_buffer(width, height, row_stride);
    let image = YuvImage::new(
        CropRect::new(6, 4, 32, 20),
        [
            Plane::new(&luma, row_stride, 1),
            Plane::new(&chroma, row_stride, 2),
            Plane::new(&chroma[1..], row_stride, 2),
        ],
    );
    image.validate().unwrap();

    let nv21 = Nv21Converter::new().convert_to_vec(&image);
    assert_eq!(nv21, reference_nv21(&image));
}

#[test]
fn one_converter_serves_changing_layouts() {
    let mut converter = Nv21Converter::new();
    for (width, height, row_stride) in [(16, 8, 16), (48, 32, 64), (8, 4, 24)] {
        let (luma, chroma) = device_buffer(width, height, row_stride);
        let image = YuvImage::new(
            CropRect::full(width, height),
            [
                Plane::new(&luma, row_stride, 1),
                Plane::new(&chroma, row_stride, 2),
                Plane::new(&chroma[1..], row_stride, 2),
            ],
        );
        assert_eq!(converter.convert_to_vec(&image), reference_nv21(&image));
    }
    assert!(converter.row_capacity() >= 64);
}

#[test]
fn malformed_planes_are_rejected() {
    let luma = [0u8; 16];
    let chroma = [0u8; 3];
    let image = YuvImage::new(
        CropRect::full(4, 4),
        [
            Plane::new(&luma, 4, 1),
            Plane::new(&chroma, 2, 1),
            Plane::new(&chroma, 2, 1),
        ],
    );
    assert!(image.validate().is_err());

    let odd = YuvImage::new(
        CropRect::full(3, 4),
        [
            Plane::new(&luma, 4, 1),
            Plane::new(&luma, 2, 1),
            Plane::new(&luma, 2, 1),
        ],
    );
    assert!(odd.validate().is_err());
}
