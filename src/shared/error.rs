// This is free and unencumbered software released into the public domain.

use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no suitable camera backend available")]
    NoDriver,

    #[error("no camera device available")]
    NoCamera,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("driver is not configured")]
    NotConfigured,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("camera thread closed")]
    Closed,

    #[error("driver error while {context}")]
    DriverError {
        context: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Other(String),
}

impl CameraError {
    #[inline]
    pub fn driver(context: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::DriverError {
            context,
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    #[inline]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether the host must intervene (grant permission, attach a camera)
    /// before another open can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::NoCamera | Self::NoDriver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_errors_keep_their_source() {
        let io = std::io::Error::other("device busy");
        let err = CameraError::driver("opening camera", io);
        assert_eq!(err.to_string(), "driver error while opening camera");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("device busy"));
    }

    #[test]
    fn fatal_errors() {
        assert!(CameraError::PermissionDenied.is_fatal());
        assert!(CameraError::NoCamera.is_fatal());
        assert!(!CameraError::other("transient").is_fatal());
    }
}
