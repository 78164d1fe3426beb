//! Intensity statistics metrics: Mean, StdDev, NormalizedVariance.

use ndarray::Array2;

use crate::frame::Frame;

/// Mean and population variance of `data`, accumulated in f64.
pub fn mean_and_variance(data: &Array2<f32>) -> (f64, f64) {
    let n = data.len();
    if n == 0 {
        return (0.0, 0.0);
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &v in data.iter() {
        let v = v as f64;
        sum += v;
        sum_sq += v * v;
    }

    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean, variance)
}

/// `numerator / mean`, or 0 when the mean is zero or not finite.
pub(crate) fn per_mean(numerator: f64, mean: f64) -> f64 {
    if mean == 0.0 || !mean.is_finite() {
        return 0.0;
    }
    let ratio = numerator / mean;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

pub fn mean_intensity(frame: &Frame) -> f64 {
    mean_and_variance(&frame.data).0
}

/// Population standard deviation divided by the mean.
pub fn normalized_std_dev(frame: &Frame) -> f64 {
    let (mean, variance) = mean_and_variance(&frame.data);
    per_mean(variance.sqrt(), mean)
}

/// Population variance divided by the mean.
pub fn normalized_variance(frame: &Frame) -> f64 {
    let (mean, variance) = mean_and_variance(&frame.data);
    per_mean(variance, mean)
}
