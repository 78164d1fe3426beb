//! Simulated microscope for offline focus runs.
//!
//! The stage, camera and channel handles share one state, so moving the
//! stage changes what the camera captures. Frames come either from a
//! recorded z-stack (nearest slice) or from a sharp frame blurred in
//! proportion to the distance from a chosen focal plane.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ndarray::Array2;
use tracing::trace;

use crate::device::{Camera, ChannelControl, ChannelState, DeviceError, DeviceResult, ZStage};
use crate::error::{FocusError, Result};
use crate::filters::gaussian_blur::gaussian_blur;
use crate::frame::{BitDepth, Frame, Region};

/// Where simulated frames come from.
#[derive(Clone, Debug)]
pub enum FocusSource {
    /// Recorded slices at `z_start + i * z_step`.
    Stack {
        frames: Vec<Frame>,
        z_start: f64,
        z_step: f64,
    },
    /// `sharp` is in focus at `focus_z`; Gaussian sigma grows by
    /// `blur_per_um` per micrometre of defocus.
    Defocus {
        sharp: Frame,
        focus_z: f64,
        blur_per_um: f32,
    },
}

impl FocusSource {
    fn frame_at(&self, z: f64) -> Frame {
        match self {
            Self::Stack {
                frames,
                z_start,
                z_step,
            } => {
                let last = frames.len().saturating_sub(1);
                let pos = ((z - z_start) / z_step).round();
                let idx = if pos.is_nan() || pos <= 0.0 {
                    0
                } else {
                    (pos as usize).min(last)
                };
                frames[idx].clone()
            }
            Self::Defocus {
                sharp,
                focus_z,
                blur_per_um,
            } => {
                let sigma = (z - focus_z).abs() as f32 * blur_per_um;
                gaussian_blur(sharp, sigma)
            }
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        let f = match self {
            Self::Stack { frames, .. } => &frames[0],
            Self::Defocus { sharp, .. } => sharp,
        };
        (f.width() as u32, f.height() as u32)
    }
}

#[derive(Debug)]
struct SimState {
    source: FocusSource,
    z: f64,
    roi: Region,
    exposure: f64,
    channel: ChannelState,
    captures: usize,
    moves: usize,
}

/// Handle to a simulated microscope. Cloning shares the same state.
#[derive(Clone, Debug)]
pub struct SimulatedMicroscope {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedMicroscope {
    /// Serve a recorded z-stack. All slices must share one size.
    pub fn from_stack(frames: Vec<Frame>, z_start: f64, z_step: f64) -> Result<Self> {
        let first = frames.first().ok_or(FocusError::EmptyFrame)?;
        let (w, h) = (first.width(), first.height());
        if w == 0 || h == 0 {
            return Err(FocusError::EmptyFrame);
        }
        if let Some(bad) = frames.iter().find(|f| f.width() != w || f.height() != h) {
            return Err(FocusError::InvalidDimensions {
                width: bad.width(),
                height: bad.height(),
            });
        }
        if !(z_step.is_finite() && z_step != 0.0) {
            return Err(FocusError::InvalidConfig(format!(
                "z step must be non-zero, got {z_step}"
            )));
        }
        Ok(Self::with_source(FocusSource::Stack {
            frames,
            z_start,
            z_step,
        }))
    }

    /// Blur `sharp` according to the distance from `focus_z`.
    pub fn defocus(sharp: Frame, focus_z: f64, blur_per_um: f32) -> Result<Self> {
        if sharp.is_empty() {
            return Err(FocusError::EmptyFrame);
        }
        Ok(Self::with_source(FocusSource::Defocus {
            sharp,
            focus_z,
            blur_per_um,
        }))
    }

    fn with_source(source: FocusSource) -> Self {
        let (w, h) = source.dimensions();
        let state = SimState {
            source,
            z: 0.0,
            roi: Region::new(0, 0, w, h),
            exposure: 10.0,
            channel: ChannelState::default(),
            captures: 0,
            moves: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Place the stage at `z` without counting it as a move.
    pub fn at_z(self, z: f64) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.z = z;
        }
        self
    }

    fn lock(&self) -> DeviceResult<MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| DeviceError::Stage("simulator state poisoned".into()))
    }

    /// Frames captured so far.
    pub fn captures(&self) -> usize {
        self.lock().map_or(0, |s| s.captures)
    }

    /// Stage moves so far.
    pub fn moves(&self) -> usize {
        self.lock().map_or(0, |s| s.moves)
    }

    /// Current stage position, or NaN if the state is unusable.
    pub fn z(&self) -> f64 {
        self.lock().map_or(f64::NAN, |s| s.z)
    }
}

impl ZStage for SimulatedMicroscope {
    fn z_position(&mut self) -> DeviceResult<f64> {
        Ok(self.lock()?.z)
    }

    fn set_z_position(&mut self, z: f64) -> DeviceResult<()> {
        let mut s = self.lock()?;
        s.z = z;
        s.moves += 1;
        Ok(())
    }

    fn wait_for_settle(&mut self, _timeout: Duration) -> DeviceResult<()> {
        Ok(())
    }
}

impl Camera for SimulatedMicroscope {
    fn capture_frame(&mut self) -> DeviceResult<Frame> {
        let mut s = self.lock()?;
        s.captures += 1;
        let full = s.source.frame_at(s.z);
        trace!(z = s.z, roi = %s.roi, "Simulated capture");
        full.crop(&s.roi)
            .map_err(|e| DeviceError::Camera(e.to_string()))
    }

    fn roi(&mut self) -> DeviceResult<Region> {
        Ok(self.lock()?.roi)
    }

    fn set_roi(&mut self, roi: Region) -> DeviceResult<()> {
        let mut s = self.lock()?;
        let (w, h) = s.source.dimensions();
        let roi = roi
            .validated(w, h)
            .map_err(|e| DeviceError::Camera(e.to_string()))?;
        s.roi = roi;
        Ok(())
    }

    fn wait_for_ready(&mut self, _timeout: Duration) -> DeviceResult<()> {
        Ok(())
    }

    fn exposure(&mut self) -> DeviceResult<f64> {
        Ok(self.lock()?.exposure)
    }

    fn set_exposure(&mut self, exposure_ms: f64) -> DeviceResult<()> {
        self.lock()?.exposure = exposure_ms;
        Ok(())
    }
}

impl ChannelControl for SimulatedMicroscope {
    fn current_state(&mut self) -> DeviceResult<ChannelState> {
        Ok(self.lock()?.channel.clone())
    }

    fn set_channel(&mut self, name: &str) -> DeviceResult<()> {
        self.lock()?.channel = ChannelState::named(name);
        Ok(())
    }

    fn restore_state(&mut self, state: &ChannelState) -> DeviceResult<()> {
        self.lock()?.channel = state.clone();
        Ok(())
    }
}

/// Deterministic 8-bit test target: a checkerboard overlaid with fine
/// diagonal stripes, so every metric has detail to respond to.
pub fn test_pattern(width: usize, height: usize) -> Frame {
    let data = Array2::from_shape_fn((height, width), |(row, col)| {
        let checker = if (row / 8 + col / 8) % 2 == 0 { 160.0 } else { 60.0 };
        let stripe = if (row + col) % 4 < 2 { 30.0 } else { 0.0 };
        checker + stripe
    });
    Frame::new(data, BitDepth::Eight)
}
