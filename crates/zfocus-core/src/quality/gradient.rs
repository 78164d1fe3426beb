//! Edge-based metrics built on the 3x3 filter family.
//!
//! All filtering happens on working copies; the input frame is never
//! modified. Integer frames saturate after every filter step, so negative
//! kernel responses contribute nothing (see [`crate::filters::kernel3x3`]).

use crate::consts::{DIAGONAL_KERNEL_A, DIAGONAL_KERNEL_B, TENENGRAD_KERNEL_X, TENENGRAD_KERNEL_Y};
use crate::filters::kernel3x3::{convolve3x3, find_edges, median3x3, sharpen};
use crate::frame::Frame;
use crate::quality::statistics::{mean_intensity, per_mean};

/// Mean of the Sobel edge map divided by the mean intensity.
pub fn edges(frame: &Frame) -> f64 {
    let edge_mean = mean_intensity(&find_edges(frame));
    per_mean(edge_mean, mean_intensity(frame))
}

/// Like [`edges`], but the frame is sharpened before edge detection.
/// Normalization still uses the unsharpened mean.
pub fn sharp_edges(frame: &Frame) -> f64 {
    let edge_mean = mean_intensity(&find_edges(&sharpen(frame)));
    per_mean(edge_mean, mean_intensity(frame))
}

/// Median-filtered diagonal edges, combined as RMS and summed.
/// Not normalized by intensity.
pub fn median_edges(frame: &Frame) -> f64 {
    let smoothed = median3x3(frame);
    let a = convolve3x3(&smoothed, &DIAGONAL_KERNEL_A);
    let b = convolve3x3(&smoothed, &DIAGONAL_KERNEL_B);
    a.data
        .iter()
        .zip(b.data.iter())
        .map(|(&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (x * x + y * y).sqrt()
        })
        .sum()
}

/// Tenengrad: sum of squared Sobel responses in both directions.
pub fn tenengrad(frame: &Frame) -> f64 {
    let gx = convolve3x3(frame, &TENENGRAD_KERNEL_X);
    let gy = convolve3x3(frame, &TENENGRAD_KERNEL_Y);
    gx.data
        .iter()
        .zip(gy.data.iter())
        .map(|(&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            x * x + y * y
        })
        .sum()
}
