use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    DEFAULT_CAMERA_TIMEOUT_MS, DEFAULT_SETTLE_TIMEOUT_MS, MAX_CROP_FACTOR, MIN_CROP_FACTOR,
};
use crate::error::{FocusError, Result};
use crate::quality::{BandpassCutoffs, FocusMetric};
use crate::search::{BrentParams, GridSearchParams};

/// Search strategy and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchStrategy {
    Grid(GridSearchParams),
    Brent(BrentParams),
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Brent(BrentParams::default())
    }
}

impl SearchStrategy {
    /// Upper bound on the number of evaluations, for progress display.
    pub fn max_evaluations(&self) -> usize {
        match self {
            Self::Grid(p) => (2 * p.coarse_steps + 1) + (2 * p.fine_steps + 1) + 1,
            Self::Brent(p) => p.max_evaluations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Grid(p) => p.validate(),
            Self::Brent(p) => {
                if !(p.search_range.is_finite() && p.search_range > 0.0) {
                    return Err(FocusError::InvalidConfig(format!(
                        "search_range must be > 0, got {}",
                        p.search_range
                    )));
                }
                if !(p.tolerance.is_finite() && p.tolerance > 0.0) {
                    return Err(FocusError::InvalidConfig(format!(
                        "tolerance must be > 0, got {}",
                        p.tolerance
                    )));
                }
                if p.max_evaluations == 0 {
                    return Err(FocusError::InvalidConfig(
                        "max_evaluations must be at least 1".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid(p) => write!(
                f,
                "grid ({}x{} um, then {}x{} um)",
                p.coarse_steps, p.coarse_step, p.fine_steps, p.fine_step
            ),
            Self::Brent(p) => write!(f, "brent (range {} um, tolerance {} um)", p.search_range, p.tolerance),
        }
    }
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_TIMEOUT_MS
}

fn default_camera_ms() -> u64 {
    DEFAULT_CAMERA_TIMEOUT_MS
}

/// Upper bounds on device waits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTimeouts {
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_camera_ms")]
    pub camera_ms: u64,
}

impl Default for DeviceTimeouts {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            camera_ms: DEFAULT_CAMERA_TIMEOUT_MS,
        }
    }
}

impl DeviceTimeouts {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn camera(&self) -> Duration {
        Duration::from_millis(self.camera_ms)
    }
}

fn default_crop_factor() -> f64 {
    MAX_CROP_FACTOR
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutofocusConfig {
    #[serde(default)]
    pub metric: FocusMetric,
    #[serde(default)]
    pub strategy: SearchStrategy,
    /// Fraction of the camera ROI (per axis) used while focusing.
    #[serde(default = "default_crop_factor")]
    pub crop_factor: f64,
    /// Channel to switch to for the run; `None` keeps the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Exposure (ms) for the run; `None` keeps the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<f64>,
    #[serde(default)]
    pub bandpass: BandpassCutoffs,
    /// Send every captured frame to the display.
    #[serde(default)]
    pub show_images: bool,
    #[serde(default)]
    pub timeouts: DeviceTimeouts,
}

impl Default for AutofocusConfig {
    fn default() -> Self {
        Self {
            metric: FocusMetric::default(),
            strategy: SearchStrategy::default(),
            crop_factor: MAX_CROP_FACTOR,
            channel: None,
            exposure: None,
            bandpass: BandpassCutoffs::default(),
            show_images: false,
            timeouts: DeviceTimeouts::default(),
        }
    }
}

impl AutofocusConfig {
    /// Clamp out-of-range values instead of rejecting them: the crop factor
    /// into `[0.01, 1.0]` and band-pass cutoffs into `[0, 100]`.
    pub fn sanitized(mut self) -> Self {
        let crop = if self.crop_factor.is_nan() {
            MAX_CROP_FACTOR
        } else {
            self.crop_factor.clamp(MIN_CROP_FACTOR, MAX_CROP_FACTOR)
        };
        if crop != self.crop_factor {
            warn!(requested = self.crop_factor, used = crop, "Crop factor out of range, clamped");
            self.crop_factor = crop;
        }

        let bandpass = self.bandpass.clamped();
        if bandpass != self.bandpass {
            warn!(
                lower = self.bandpass.lower_percent,
                upper = self.bandpass.upper_percent,
                "Band-pass cutoffs out of range, clamped"
            );
            self.bandpass = bandpass;
        }

        if self.channel.as_deref().is_some_and(|c| c.trim().is_empty()) {
            self.channel = None;
        }
        self
    }

    /// Reject settings that cannot be clamped into something meaningful.
    pub fn validate(&self) -> Result<()> {
        self.strategy.validate()?;
        if let Some(exposure) = self.exposure {
            if !(exposure.is_finite() && exposure > 0.0) {
                return Err(FocusError::InvalidConfig(format!(
                    "exposure must be > 0 ms, got {exposure}"
                )));
            }
        }
        Ok(())
    }
}
