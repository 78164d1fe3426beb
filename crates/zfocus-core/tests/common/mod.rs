#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ndarray::Array2;

use zfocus_core::autofocus::CancelToken;
use zfocus_core::device::{
    Camera, ChannelControl, ChannelState, DeviceError, DeviceResult, FrameDisplay, ZStage,
};
use zfocus_core::frame::{BitDepth, Frame, Region};

/// Deterministic 8-bit noise texture (64-bit LCG, upper bits).
pub fn noise_frame(width: usize, height: usize, seed: u64) -> Frame {
    let mut s = seed;
    let data = Array2::from_shape_fn((height, width), |_| {
        s = s
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((s >> 33) % 256) as f32
    });
    Frame::new(data, BitDepth::Eight)
}

/// Random values in `[0, 1)` for transform tests.
pub fn unit_noise(n: usize, seed: u64) -> Array2<f32> {
    noise_frame(n, n, seed).data.mapv(|v| v / 256.0)
}

/// Float frame whose every pixel equals `value`, so the Mean metric
/// returns exactly the scripted score.
pub fn constant_frame(value: f64) -> Frame {
    Frame::new(Array2::from_elem((8, 8), value as f32), BitDepth::Float)
}

pub const SENSOR: Region = Region {
    x: 0,
    y: 0,
    width: 64,
    height: 48,
};

/// Which call should fail, counted from 1 for repeated calls.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub set_roi: bool,
    pub set_channel: bool,
    pub set_exposure: bool,
    pub move_number: Option<usize>,
    pub settle_number: Option<usize>,
    pub capture_number: Option<usize>,
    /// Capture that returns a frame with no pixels.
    pub empty_frame_number: Option<usize>,
    pub restore_channel: bool,
    pub restore_roi: bool,
}

/// Shared state behind the mock stage, camera and channel handles.
pub struct MockState {
    pub z: f64,
    pub roi: Region,
    pub exposure: f64,
    pub channel: ChannelState,
    pub score: Box<dyn Fn(f64) -> f64>,
    pub faults: Faults,
    pub moves: Vec<f64>,
    pub settles: usize,
    pub captures: usize,
    pub roi_calls: Vec<Region>,
    pub channel_calls: Vec<String>,
    pub exposure_calls: Vec<f64>,
    /// ROI in effect at each `wait_for_ready` call.
    pub ready_waits: Vec<Region>,
    pub cancel_after: Option<(usize, CancelToken)>,
}

pub type Shared = Rc<RefCell<MockState>>;

pub struct MockStage(pub Shared);
pub struct MockCamera(pub Shared);
pub struct MockChannels(pub Shared);

pub const START_EXPOSURE: f64 = 20.0;

pub fn start_channel() -> ChannelState {
    ChannelState {
        channel: Some("Brightfield".into()),
        settings: vec![("Filter".into(), "Label".into(), "Empty".into())],
    }
}

/// Stage at `z0`, camera returning frames scored by `score(z)` under the
/// Mean metric.
pub fn rig(z0: f64, score: impl Fn(f64) -> f64 + 'static) -> (Shared, MockStage, MockCamera, MockChannels) {
    rig_with_faults(z0, score, Faults::default())
}

pub fn rig_with_faults(
    z0: f64,
    score: impl Fn(f64) -> f64 + 'static,
    faults: Faults,
) -> (Shared, MockStage, MockCamera, MockChannels) {
    let state = Rc::new(RefCell::new(MockState {
        z: z0,
        roi: SENSOR,
        exposure: START_EXPOSURE,
        channel: start_channel(),
        score: Box::new(score),
        faults,
        moves: Vec::new(),
        settles: 0,
        captures: 0,
        roi_calls: Vec::new(),
        channel_calls: Vec::new(),
        exposure_calls: Vec::new(),
        ready_waits: Vec::new(),
        cancel_after: None,
    }));
    (
        Rc::clone(&state),
        MockStage(Rc::clone(&state)),
        MockCamera(Rc::clone(&state)),
        MockChannels(state),
    )
}

impl ZStage for MockStage {
    fn z_position(&mut self) -> DeviceResult<f64> {
        Ok(self.0.borrow().z)
    }

    fn set_z_position(&mut self, z: f64) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        s.moves.push(z);
        if s.faults.move_number == Some(s.moves.len()) {
            return Err(DeviceError::Stage("drive fault".into()));
        }
        s.z = z;
        Ok(())
    }

    fn wait_for_settle(&mut self, timeout: Duration) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        s.settles += 1;
        if s.faults.settle_number == Some(s.settles) {
            return Err(DeviceError::Timeout {
                device: "z stage".into(),
                timeout,
            });
        }
        Ok(())
    }
}

impl Camera for MockCamera {
    fn capture_frame(&mut self) -> DeviceResult<Frame> {
        let mut s = self.0.borrow_mut();
        s.captures += 1;
        if s.faults.capture_number == Some(s.captures) {
            return Err(DeviceError::Camera("readout error".into()));
        }
        if s.faults.empty_frame_number == Some(s.captures) {
            return Ok(Frame::new(Array2::zeros((0, 0)), BitDepth::Float));
        }
        if let Some((after, token)) = &s.cancel_after {
            if s.captures >= *after {
                token.cancel();
            }
        }
        let value = (s.score)(s.z);
        Ok(constant_frame(value))
    }

    fn roi(&mut self) -> DeviceResult<Region> {
        Ok(self.0.borrow().roi)
    }

    fn set_roi(&mut self, roi: Region) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        s.roi_calls.push(roi);
        let restoring = roi == SENSOR;
        if (s.faults.set_roi && !restoring) || (s.faults.restore_roi && restoring) {
            return Err(DeviceError::Camera("ROI rejected".into()));
        }
        s.roi = roi;
        Ok(())
    }

    fn wait_for_ready(&mut self, _timeout: Duration) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        let roi = s.roi;
        s.ready_waits.push(roi);
        Ok(())
    }

    fn exposure(&mut self) -> DeviceResult<f64> {
        Ok(self.0.borrow().exposure)
    }

    fn set_exposure(&mut self, exposure_ms: f64) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        s.exposure_calls.push(exposure_ms);
        if s.faults.set_exposure && exposure_ms != START_EXPOSURE {
            return Err(DeviceError::Camera("exposure out of range".into()));
        }
        s.exposure = exposure_ms;
        Ok(())
    }
}

impl ChannelControl for MockChannels {
    fn current_state(&mut self) -> DeviceResult<ChannelState> {
        Ok(self.0.borrow().channel.clone())
    }

    fn set_channel(&mut self, name: &str) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        s.channel_calls.push(name.to_string());
        if s.faults.set_channel {
            // Leave a half-applied configuration behind.
            s.channel = ChannelState::named("partial");
            return Err(DeviceError::Channel(format!("no such channel: {name}")));
        }
        s.channel = ChannelState::named(name);
        Ok(())
    }

    fn restore_state(&mut self, state: &ChannelState) -> DeviceResult<()> {
        let mut s = self.0.borrow_mut();
        if s.faults.restore_channel {
            return Err(DeviceError::Channel("restore failed".into()));
        }
        s.channel = state.clone();
        Ok(())
    }
}

/// Display that counts the frames it receives.
#[derive(Clone, Default)]
pub struct CountingDisplay(pub std::sync::Arc<std::sync::atomic::AtomicUsize>);

impl FrameDisplay for CountingDisplay {
    fn display(&mut self, _frame: &Frame) {
        self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
