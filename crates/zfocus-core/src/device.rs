//! Collaborator interfaces the autofocus controller drives.
//!
//! Implementations wrap real hardware or a simulation. Every call may fail
//! with a [`DeviceError`]; waits take an explicit timeout and report
//! [`DeviceError::Timeout`] when it expires.

use std::time::Duration;

use crate::frame::{Frame, Region};

pub use crate::error::DeviceError;

pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Motorized focus drive.
pub trait ZStage {
    /// Current position (um).
    fn z_position(&mut self) -> DeviceResult<f64>;

    /// Start a move to `z` (um). Use [`ZStage::wait_for_settle`] to block
    /// until the move has finished.
    fn set_z_position(&mut self, z: f64) -> DeviceResult<()>;

    fn wait_for_settle(&mut self, timeout: Duration) -> DeviceResult<()>;
}

/// Camera capturing single grayscale frames.
pub trait Camera {
    /// Capture one frame at the current settings and ROI.
    fn capture_frame(&mut self) -> DeviceResult<Frame>;

    /// Current region of interest in sensor coordinates.
    fn roi(&mut self) -> DeviceResult<Region>;

    fn set_roi(&mut self, roi: Region) -> DeviceResult<()>;

    fn wait_for_ready(&mut self, timeout: Duration) -> DeviceResult<()>;

    /// Exposure time in milliseconds.
    fn exposure(&mut self) -> DeviceResult<f64>;

    fn set_exposure(&mut self, exposure_ms: f64) -> DeviceResult<()>;
}

/// Opaque snapshot of the optical configuration (filters, shutters, light
/// path) that [`ChannelControl::restore_state`] puts back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Active channel name, if the configuration matches a named channel.
    pub channel: Option<String>,
    /// Device/property/value triples making up the configuration.
    pub settings: Vec<(String, String, String)>,
}

impl ChannelState {
    pub fn named(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            settings: Vec::new(),
        }
    }
}

/// Switches the microscope between named optical configurations.
pub trait ChannelControl {
    fn current_state(&mut self) -> DeviceResult<ChannelState>;

    fn set_channel(&mut self, name: &str) -> DeviceResult<()>;

    fn restore_state(&mut self, state: &ChannelState) -> DeviceResult<()>;
}

/// Receives captured frames for display. Must not block the caller.
pub trait FrameDisplay {
    fn display(&mut self, frame: &Frame);
}

/// Display that drops every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDisplay;

impl FrameDisplay for NoDisplay {
    fn display(&mut self, _frame: &Frame) {}
}
