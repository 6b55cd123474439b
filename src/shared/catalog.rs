// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraConfig, CameraError, CameraPlatform, Facing, FpsRange, Size, choose_optimal_size,
    select_fps_range_with,
};

/// What a session would pick for one camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraSummary {
    pub id: String,
    pub facing: Option<Facing>,
    pub orientation: Option<u32>,
    pub fps_range: Option<FpsRange>,
    pub preview_size: Size,
    pub metering_area_af: bool,
}

pub fn describe_cameras<P: CameraPlatform>(
    platform: &mut P,
    config: &CameraConfig,
) -> Result<Vec<CameraSummary>, CameraError> {
    let desired = config.desired_size();
    let mut result = Vec::new();
    for id in platform.camera_ids()? {
        let chars = platform.characteristics(&id)?;
        result.push(CameraSummary {
            fps_range: select_fps_range_with(
                &chars.fps_ranges,
                config.min_fps,
                config.low_light_fps,
            ),
            preview_size: choose_optimal_size(
                &chars.output_sizes,
                desired,
                config.max_preview,
                desired,
            ),
            metering_area_af: chars.is_metering_area_af_supported(),
            facing: chars.facing,
            orientation: chars.sensor_orientation,
            id,
        });
    }
    Ok(result)
}
