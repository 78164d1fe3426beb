pub mod autocorrelation;
pub mod bandpass;
pub mod gradient;
pub mod laplacian;
pub mod statistics;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};
use crate::frame::{Frame, Region};
use crate::transform::hartley::HartleyTransform;

pub use bandpass::BandpassCutoffs;

/// Sharpness measure used to score a frame. Higher is sharper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusMetric {
    Mean,
    StdDev,
    NormalizedVariance,
    #[default]
    Edges,
    SharpEdges,
    Redondo,
    Volath,
    Volath5,
    MedianEdges,
    Tenengrad,
    #[serde(rename = "FFTBandpass")]
    FftBandpass,
}

impl FocusMetric {
    pub const ALL: [FocusMetric; 11] = [
        Self::Mean,
        Self::StdDev,
        Self::NormalizedVariance,
        Self::Edges,
        Self::SharpEdges,
        Self::Redondo,
        Self::Volath,
        Self::Volath5,
        Self::MedianEdges,
        Self::Tenengrad,
        Self::FftBandpass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::StdDev => "StdDev",
            Self::NormalizedVariance => "NormalizedVariance",
            Self::Edges => "Edges",
            Self::SharpEdges => "SharpEdges",
            Self::Redondo => "Redondo",
            Self::Volath => "Volath",
            Self::Volath5 => "Volath5",
            Self::MedianEdges => "MedianEdges",
            Self::Tenengrad => "Tenengrad",
            Self::FftBandpass => "FFTBandpass",
        }
    }
}

impl std::fmt::Display for FocusMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FocusMetric {
    type Err = FocusError;

    /// Case-insensitive match on the metric name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FocusError::InvalidConfig(format!("Unknown focus metric '{s}'")))
    }
}

/// Scores frames with one metric.
///
/// Owns the Hartley transform used by [`FocusMetric::FftBandpass`], so its
/// tables are built once per frame size and reused across a focus run.
#[derive(Debug, Default)]
pub struct FocusScorer {
    metric: FocusMetric,
    bandpass: BandpassCutoffs,
    fht: HartleyTransform,
}

impl FocusScorer {
    pub fn new(metric: FocusMetric) -> Self {
        Self::with_bandpass(metric, BandpassCutoffs::default())
    }

    pub fn with_bandpass(metric: FocusMetric, bandpass: BandpassCutoffs) -> Self {
        Self {
            metric,
            bandpass: bandpass.clamped(),
            fht: HartleyTransform::new(),
        }
    }

    pub fn metric(&self) -> FocusMetric {
        self.metric
    }

    pub fn set_metric(&mut self, metric: FocusMetric) {
        self.metric = metric;
    }

    pub fn bandpass(&self) -> BandpassCutoffs {
        self.bandpass
    }

    /// Score the whole frame.
    pub fn score(&mut self, frame: &Frame) -> Result<f64> {
        if frame.is_empty() {
            return Err(FocusError::EmptyFrame);
        }

        let score = match self.metric {
            FocusMetric::Mean => statistics::mean_intensity(frame),
            FocusMetric::StdDev => statistics::normalized_std_dev(frame),
            FocusMetric::NormalizedVariance => statistics::normalized_variance(frame),
            FocusMetric::Edges => gradient::edges(frame),
            FocusMetric::SharpEdges => gradient::sharp_edges(frame),
            FocusMetric::Redondo => laplacian::redondo(frame),
            FocusMetric::Volath => autocorrelation::volath(frame),
            FocusMetric::Volath5 => autocorrelation::volath5(frame),
            FocusMetric::MedianEdges => gradient::median_edges(frame),
            FocusMetric::Tenengrad => gradient::tenengrad(frame),
            FocusMetric::FftBandpass => bandpass::fft_bandpass(&mut self.fht, frame, &self.bandpass)?,
        };
        Ok(score)
    }

    /// Score only the pixels inside `region`.
    pub fn score_region(&mut self, frame: &Frame, region: &Region) -> Result<f64> {
        let crop = frame.crop(region)?;
        self.score(&crop)
    }
}
