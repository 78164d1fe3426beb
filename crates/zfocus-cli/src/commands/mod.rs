pub mod config;
pub mod focus;
pub mod score;

use anyhow::{ensure, Result};
use clap::ValueEnum;
use zfocus_core::consts::{MAX_CROP_FACTOR, MIN_CROP_FACTOR};
use zfocus_core::quality::FocusMetric;

#[derive(Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Mean,
    StdDev,
    NormalizedVariance,
    Edges,
    SharpEdges,
    Redondo,
    Volath,
    Volath5,
    MedianEdges,
    Tenengrad,
    FftBandpass,
}

impl From<MetricArg> for FocusMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Mean => FocusMetric::Mean,
            MetricArg::StdDev => FocusMetric::StdDev,
            MetricArg::NormalizedVariance => FocusMetric::NormalizedVariance,
            MetricArg::Edges => FocusMetric::Edges,
            MetricArg::SharpEdges => FocusMetric::SharpEdges,
            MetricArg::Redondo => FocusMetric::Redondo,
            MetricArg::Volath => FocusMetric::Volath,
            MetricArg::Volath5 => FocusMetric::Volath5,
            MetricArg::MedianEdges => FocusMetric::MedianEdges,
            MetricArg::Tenengrad => FocusMetric::Tenengrad,
            MetricArg::FftBandpass => FocusMetric::FftBandpass,
        }
    }
}

/// Reject crop factors outside `[0.01, 1.0]` instead of silently clamping
/// values typed on the command line.
pub fn check_crop(crop: f64) -> Result<f64> {
    ensure!(
        (MIN_CROP_FACTOR..=MAX_CROP_FACTOR).contains(&crop),
        "Crop factor must be within {MIN_CROP_FACTOR}..={MAX_CROP_FACTOR}, got {crop}"
    );
    Ok(crop)
}
