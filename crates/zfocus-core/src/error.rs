use std::time::Duration;

use thiserror::Error;

/// Failure reported by a stage, camera or channel collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Channel configuration error: {0}")]
    Channel(String),

    #[error("Timed out after {timeout:?} waiting for {device}")]
    Timeout { device: String, timeout: Duration },
}

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Hartley transform needs a square power-of-two buffer of at least 4x4, got {width}x{height}")]
    InvalidTransformSize { width: usize, height: usize },

    #[error("Invalid autofocus configuration: {0}")]
    InvalidConfig(String),

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Autofocus run cancelled")]
    Cancelled,
}

/// Coarse classification of a [`FocusError`], so callers can present
/// bad input, hardware faults and user aborts differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Device,
    Cancelled,
}

impl FocusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Device(_) => ErrorKind::Device,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Io(_)
            | Self::InvalidDimensions { .. }
            | Self::InvalidRegion(_)
            | Self::InvalidTransformSize { .. }
            | Self::InvalidConfig(_)
            | Self::EmptyFrame
            | Self::ImageError(_) => ErrorKind::Precondition,
        }
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;
