// This is free and unencumbered software released into the public domain.

use crate::shared::{CameraCharacteristics, Facing, FpsRange, Size};
use core::{mem::zeroed, ptr::null_mut};
use ndk_sys::{
    ACameraMetadata, ACameraMetadata_const_entry, ACameraMetadata_free,
    ACameraMetadata_getConstEntry, acamera_metadata_tag as Tag, camera_status_t,
};

/// `AIMAGE_FORMAT_PRIVATE`: what a `SurfaceTexture` consumer receives.
const FORMAT_PRIVATE: i32 = 0x22;

const STREAM_CONFIGURATION_OUTPUT: i32 = 0;

const LENS_FACING_FRONT: u8 = 0;
const LENS_FACING_BACK: u8 = 1;

/// Static characteristics of one camera.
#[derive(Debug)]
pub struct CameraMetadata {
    pub(crate) handle: *mut ACameraMetadata,
}

impl Drop for CameraMetadata {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraMetadata_free(self.handle) };
        }
        self.handle = null_mut();
    }
}

impl CameraMetadata {
    fn entry(&self, tag: Tag) -> Option<ACameraMetadata_const_entry> {
        let mut entry: ACameraMetadata_const_entry = unsafe { zeroed() };
        let status = unsafe { ACameraMetadata_getConstEntry(self.handle, tag.0, &mut entry) };
        (status == camera_status_t::ACAMERA_OK && entry.count > 0).then_some(entry)
    }

    fn u8s(&self, tag: Tag) -> &[u8] {
        match self.entry(tag) {
            Some(e) => unsafe { core::slice::from_raw_parts(e.data.u8_, e.count as usize) },
            None => &[],
        }
    }

    fn i32s(&self, tag: Tag) -> &[i32] {
        match self.entry(tag) {
            Some(e) => unsafe { core::slice::from_raw_parts(e.data.i32_, e.count as usize) },
            None => &[],
        }
    }

    pub fn facing(&self) -> Option<Facing> {
        // External cameras have no facing.
        match self.u8s(Tag::ACAMERA_LENS_FACING).first().copied() {
            Some(LENS_FACING_FRONT) => Some(Facing::Front),
            Some(LENS_FACING_BACK) => Some(Facing::Back),
            _ => None,
        }
    }

    pub fn sensor_orientation(&self) -> Option<u32> {
        self.i32s(Tag::ACAMERA_SENSOR_ORIENTATION)
            .first()
            .and_then(|&v| u32::try_from(v).ok())
    }

    /// Output sizes usable by a preview texture.
    pub fn output_sizes(&self) -> Vec<Size> {
        self.i32s(Tag::ACAMERA_SCALER_AVAILABLE_STREAM_CONFIGURATIONS)
            .chunks_exact(4)
            .filter(|c| c[0] == FORMAT_PRIVATE && c[3] == STREAM_CONFIGURATION_OUTPUT)
            .filter_map(|c| Some(Size::new(u32::try_from(c[1]).ok()?, u32::try_from(c[2]).ok()?)))
            .collect()
    }

    pub fn fps_ranges(&self) -> Vec<FpsRange> {
        self.i32s(Tag::ACAMERA_CONTROL_AE_AVAILABLE_TARGET_FPS_RANGES)
            .chunks_exact(2)
            .map(|c| FpsRange::new(c[0], c[1]))
            .collect()
    }

    /// Entry layout is `(ae, awb, af)`.
    pub fn max_af_regions(&self) -> Option<u32> {
        self.i32s(Tag::ACAMERA_CONTROL_MAX_REGIONS)
            .get(2)
            .and_then(|&v| u32::try_from(v).ok())
    }

    pub fn to_characteristics(&self) -> CameraCharacteristics {
        CameraCharacteristics {
            facing: self.facing(),
            sensor_orientation: self.sensor_orientation(),
            output_sizes: self.output_sizes(),
            fps_ranges: self.fps_ranges(),
            max_af_regions: self.max_af_regions(),
        }
    }
}
