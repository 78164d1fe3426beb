use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::autofocus::config::{AutofocusConfig, SearchStrategy};
use crate::autofocus::types::{
    CancelToken, Evaluation, FocusOutcome, FocusStage, NoOpReporter, ProgressReporter,
    StrategyReport,
};
use crate::device::{Camera, ChannelControl, ChannelState, FrameDisplay, ZStage};
use crate::error::{FocusError, Result};
use crate::frame::Region;
use crate::quality::FocusScorer;
use crate::search::grid_search;

/// Settings captured before a run, plus which of them the run touched.
struct Snapshot {
    roi: Region,
    roi_changed: bool,
    exposure: f64,
    exposure_changed: bool,
    channel: ChannelState,
    channel_changed: bool,
}

/// Drives a stage and camera to find the z position with the best focus
/// score.
///
/// A run snapshots the camera ROI, exposure and channel, applies the
/// configured crop/channel/exposure, runs the search strategy, and puts the
/// snapshot back on every exit path. Only a successful run moves the stage
/// to the best z; after a failure the stage stays where the failing step
/// left it.
pub struct Autofocus<S, C, H> {
    stage: S,
    camera: C,
    channels: H,
    config: AutofocusConfig,
    scorer: FocusScorer,
    display: Option<Box<dyn FrameDisplay + Send>>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelToken,
    last_outcome: Option<FocusOutcome>,
}

impl<S: ZStage, C: Camera, H: ChannelControl> Autofocus<S, C, H> {
    pub fn new(stage: S, camera: C, channels: H, config: AutofocusConfig) -> Result<Self> {
        let config = config.sanitized();
        config.validate()?;
        let scorer = FocusScorer::with_bandpass(config.metric, config.bandpass);
        Ok(Self {
            stage,
            camera,
            channels,
            config,
            scorer,
            display: None,
            reporter: Arc::new(NoOpReporter),
            cancel: CancelToken::new(),
            last_outcome: None,
        })
    }

    pub fn with_display(mut self, display: impl FrameDisplay + Send + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &AutofocusConfig {
        &self.config
    }

    /// Replace the configuration between runs.
    pub fn set_config(&mut self, config: AutofocusConfig) -> Result<()> {
        let config = config.sanitized();
        config.validate()?;
        self.scorer = FocusScorer::with_bandpass(config.metric, config.bandpass);
        self.config = config;
        Ok(())
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn channels(&self) -> &H {
        &self.channels
    }

    pub fn into_parts(self) -> (S, C, H) {
        (self.stage, self.camera, self.channels)
    }

    /// Outcome of the most recent successful run.
    pub fn last_outcome(&self) -> Option<&FocusOutcome> {
        self.last_outcome.as_ref()
    }

    /// Number of frames captured by the most recent successful run.
    pub fn image_count(&self) -> usize {
        self.last_outcome.as_ref().map_or(0, FocusOutcome::image_count)
    }

    /// Score a frame captured at the current z without moving the stage.
    ///
    /// The centered crop is applied in software, so the camera ROI is left
    /// alone.
    pub fn current_focus_score(&mut self) -> Result<f64> {
        self.camera.wait_for_ready(self.config.timeouts.camera())?;
        let frame = self.camera.capture_frame()?;
        let region = frame.bounds().centered(self.config.crop_factor);
        let score = self.scorer.score_region(&frame, &region)?;
        debug!(score, metric = %self.config.metric, "Current focus score");
        Ok(score)
    }

    /// Run one autofocus search and move to the best z found.
    pub fn run(&mut self) -> Result<FocusOutcome> {
        let started = Instant::now();
        info!(
            metric = %self.config.metric,
            strategy = %self.config.strategy,
            crop_factor = self.config.crop_factor,
            "Starting autofocus"
        );

        self.reporter.begin_stage(FocusStage::Preparing, None);
        let start_z = self.stage.z_position()?;
        let mut snapshot = Snapshot {
            roi: self.camera.roi()?,
            roi_changed: false,
            exposure: self.camera.exposure()?,
            exposure_changed: false,
            channel: self.channels.current_state()?,
            channel_changed: false,
        };

        let mut evaluations = Vec::new();
        let searched = self.prepare_and_search(start_z, &mut snapshot, &mut evaluations);

        self.reporter.begin_stage(FocusStage::Restoring, None);
        let restored = self.restore(&snapshot);
        self.reporter.finish_stage();

        let report = match (searched, restored) {
            (Ok(report), Ok(())) => report,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), restored) => {
                if let Err(restore_err) = restored {
                    error!(error = %restore_err, "Failed to restore settings after autofocus error");
                }
                warn!(error = %e, images = evaluations.len(), "Autofocus aborted");
                return Err(e);
            }
        };

        let (best_z, best_score) = match &report {
            StrategyReport::Grid(g) => (g.best.z, g.confirmed_score),
            StrategyReport::Brent(b) => (b.best.z, b.best.score),
        };
        let confident = report.confident();
        if !confident {
            warn!(best_z, best_score, "Autofocus finished without a confident result");
        }

        self.reporter.begin_stage(FocusStage::MovingToBest, None);
        self.stage.set_z_position(best_z)?;
        self.stage.wait_for_settle(self.config.timeouts.settle())?;
        self.reporter.finish_stage();

        let outcome = FocusOutcome {
            best_z,
            best_score,
            start_z,
            evaluations,
            report,
            confident,
            elapsed: started.elapsed(),
        };
        info!(
            best_z,
            best_score,
            start_z,
            images = outcome.image_count(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Autofocus finished"
        );

        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn prepare_and_search(
        &mut self,
        start_z: f64,
        snapshot: &mut Snapshot,
        evaluations: &mut Vec<Evaluation>,
    ) -> Result<StrategyReport> {
        if self.config.crop_factor < 1.0 {
            let roi = snapshot.roi.centered(self.config.crop_factor);
            if roi.is_empty() {
                return Err(FocusError::InvalidRegion(format!(
                    "Crop factor {} leaves no pixels of ROI {}",
                    self.config.crop_factor, snapshot.roi
                )));
            }
            debug!(%roi, "Applying autofocus ROI");
            snapshot.roi_changed = true;
            self.camera.set_roi(roi)?;
            self.camera.wait_for_ready(self.config.timeouts.camera())?;
        }

        if let Some(channel) = self.config.channel.clone() {
            debug!(%channel, "Switching to autofocus channel");
            snapshot.channel_changed = true;
            self.channels.set_channel(&channel)?;
        }

        if let Some(exposure) = self.config.exposure {
            snapshot.exposure_changed = true;
            self.camera.set_exposure(exposure)?;
        }
        self.reporter.finish_stage();

        let strategy = self.config.strategy;
        self.reporter
            .begin_stage(FocusStage::Searching, Some(strategy.max_evaluations()));
        let report = match strategy {
            SearchStrategy::Grid(params) => {
                let outcome = grid_search(start_z, &params, |z| self.evaluate(z, evaluations))?;
                StrategyReport::Grid(outcome)
            }
            SearchStrategy::Brent(params) => {
                let (lo, hi) = params.interval(start_z);
                let outcome = params
                    .optimizer()
                    .maximize(lo, hi, |z| self.evaluate(z, evaluations))?;
                StrategyReport::Brent(outcome)
            }
        };
        self.reporter.finish_stage();
        Ok(report)
    }

    /// Move, settle, capture and score at `z`.
    fn evaluate(&mut self, z: f64, evaluations: &mut Vec<Evaluation>) -> Result<f64> {
        if self.cancel.is_cancelled() {
            info!(images = evaluations.len(), "Autofocus cancelled");
            return Err(FocusError::Cancelled);
        }
        let timeouts = self.config.timeouts;

        let t_move = Instant::now();
        self.stage.set_z_position(z)?;
        self.stage.wait_for_settle(timeouts.settle())?;
        let move_time = t_move.elapsed();

        let t_capture = Instant::now();
        self.camera.wait_for_ready(timeouts.camera())?;
        let frame = self.camera.capture_frame()?;
        let capture_time = t_capture.elapsed();

        if self.config.show_images {
            if let Some(display) = self.display.as_mut() {
                display.display(&frame);
            }
        }

        let t_score = Instant::now();
        let score = self.scorer.score(&frame)?;
        let score_time = t_score.elapsed();

        let evaluation = Evaluation {
            sequence: evaluations.len() + 1,
            z,
            score,
            move_time,
            capture_time,
            score_time,
        };
        debug!(
            seq = evaluation.sequence,
            z,
            score,
            move_ms = move_time.as_secs_f64() * 1e3,
            capture_ms = capture_time.as_secs_f64() * 1e3,
            score_ms = score_time.as_secs_f64() * 1e3,
            "Focus evaluation"
        );
        self.reporter.evaluated(&evaluation);
        evaluations.push(evaluation);
        self.reporter.advance(evaluations.len());
        Ok(score)
    }

    /// Put back everything the run changed. Every item is attempted; the
    /// first failure is returned.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let mut first_err: Option<FocusError> = None;

        if snapshot.roi_changed {
            let timeout = self.config.timeouts.camera();
            let restored = self
                .camera
                .set_roi(snapshot.roi)
                .and_then(|()| self.camera.wait_for_ready(timeout));
            if let Err(e) = restored {
                error!(error = %e, roi = %snapshot.roi, "Failed to restore camera ROI");
                first_err.get_or_insert(e.into());
            }
        }
        if snapshot.channel_changed {
            if let Err(e) = self.channels.restore_state(&snapshot.channel) {
                error!(error = %e, "Failed to restore channel");
                first_err.get_or_insert(e.into());
            }
        }
        if snapshot.exposure_changed {
            if let Err(e) = self.camera.set_exposure(snapshot.exposure) {
                error!(error = %e, exposure = snapshot.exposure, "Failed to restore exposure");
                first_err.get_or_insert(e.into());
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
