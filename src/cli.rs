// This is free and unencumbered software released into the public domain.

//! CLI helpers (error reporting, verbosity handling, argument parsing).
//!
//! This module must compile even when the crate feature `cli` is disabled,
//! because the library is built in non-CLI configurations.

use crate::shared::{CropRect, Size};

#[cfg(feature = "cli")]
use crate::shared::CameraError;

#[cfg(feature = "cli")]
use asimov_module::SysexitsError::{self, *};

#[cfg(feature = "cli")]
use clientele::StandardOptions;

#[cfg(feature = "cli")]
pub fn handle_error(err: &CameraError, flags: &StandardOptions) -> SysexitsError {
    #[cfg(feature = "tracing")]
    {
        use asimov_module::tracing::{debug, error};

        error!(target: "asimov_camera2_module", %err, "command failed");

        if flags.debug || flags.verbose >= 2 {
            debug!(target: "asimov_camera2_module", ?err, "detailed error");
        }
    }

    report_error(err, flags);
    map_error_to_sysexit(err)
}

#[cfg(feature = "cli")]
pub fn info_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("INFO: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::info!(target: "asimov_camera2_module", "{msg}");
}

#[cfg(feature = "cli")]
pub fn warn_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("WARN: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::warn!(target: "asimov_camera2_module", "{msg}");
}

#[cfg(feature = "cli")]
fn report_error(err: &CameraError, flags: &StandardOptions) {
    use std::error::Error as _;
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "ERROR: {err}");

    if flags.debug || flags.verbose >= 2 {
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(stderr, "  Caused by: {}", cause);
            source = cause.source();
        }
    }
}

#[cfg(feature = "cli")]
pub fn map_error_to_sysexit(err: &CameraError) -> SysexitsError {
    match err {
        CameraError::NoDriver => EX_UNAVAILABLE,
        CameraError::NoCamera => EX_UNAVAILABLE,
        CameraError::PermissionDenied => EX_NOPERM,
        CameraError::NotConfigured => EX_CONFIG,
        CameraError::InvalidFrame(_) => EX_DATAERR,
        CameraError::InvalidConfig(_) => EX_USAGE,
        CameraError::Closed => EX_SOFTWARE,
        CameraError::DriverError { .. } => EX_IOERR,
        CameraError::Other(_) => EX_SOFTWARE,
    }
}

// When `cli` is disabled, keep the module linkable without exposing CLI-only types.
#[cfg(not(feature = "cli"))]
#[inline]
pub fn info_user(_msg: &str) {}

#[cfg(not(feature = "cli"))]
#[inline]
pub fn warn_user(_msg: &str) {}

/// Parses `WxH` (also accepting `×`) into an even, non-empty size.
pub fn parse_size(s: &str) -> Result<Size, String> {
    let s = s.trim().replace('×', "x");
    let Some((w, h)) = s.split_once('x') else {
        return Err(format!("Invalid size '{s}'. Use WxH (e.g., 1280x720)"));
    };
    let width: u32 = w.trim().parse().map_err(|_| format!("Invalid width: {w}"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("Invalid height: {h}"))?;
    if width == 0 || height == 0 {
        return Err(format!("Size {width}x{height} must be non-empty"));
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(format!("Size {width}x{height} must have even dimensions"));
    }
    Ok(Size::new(width, height))
}

/// Parses a crop rectangle given as `L,T,WxH`.
pub fn parse_crop(s: &str) -> Result<CropRect, String> {
    let mut parts = s.trim().splitn(3, ',');
    let (Some(left), Some(top), Some(size)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("Invalid crop '{s}'. Use L,T,WxH (e.g., 0,0,640x480)"));
    };
    let left: usize = left.trim().parse().map_err(|_| format!("Invalid crop left: {left}"))?;
    let top: usize = top.trim().parse().map_err(|_| format!("Invalid crop top: {top}"))?;
    let size = parse_size(size)?;
    Ok(CropRect::new(left, top, size.width as usize, size.height as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720"), Ok(Size::new(1280, 720)));
        assert_eq!(parse_size(" 640 × 480 "), Ok(Size::new(640, 480)));
        assert!(parse_size("641x480").is_err());
        assert!(parse_size("0x480").is_err());
        assert!(parse_size("1280").is_err());
    }

    #[test]
    fn parses_crops() {
        assert_eq!(parse_crop("2,4,8x6"), Ok(CropRect::new(2, 4, 8, 6)));
        assert!(parse_crop("2,4").is_err());
        assert!(parse_crop("a,4,8x6").is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn maps_errors_to_sysexits() {
        let io = || std::io::Error::other("boom");
        let cases = [
            (CameraError::NoDriver, EX_UNAVAILABLE),
            (CameraError::NoCamera, EX_UNAVAILABLE),
            (CameraError::PermissionDenied, EX_NOPERM),
            (CameraError::NotConfigured, EX_CONFIG),
            (CameraError::invalid_frame("short"), EX_DATAERR),
            (CameraError::InvalidConfig("size".into()), EX_USAGE),
            (CameraError::Closed, EX_SOFTWARE),
            (CameraError::driver("opening camera", io()), EX_IOERR),
        ];
        for (err, code) in cases {
            assert_eq!(map_error_to_sysexit(&err), code, "{err}");
        }
    }
}
