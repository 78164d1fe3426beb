//! 3x3 neighbourhood filters.
//!
//! Every filter here covers the full frame: pixels outside the frame are
//! replaced by the nearest edge pixel (edge duplication). Results for 8- and
//! 16-bit frames are rounded and saturated to the pixel range, so a negative
//! convolution response becomes 0. Float frames keep the raw response.

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, SHARPEN_KERNEL};
use crate::frame::Frame;

/// Gather the 3x3 neighbourhood of `(row, col)` in row-major order
/// (p1 = top-left, p5 = center, p9 = bottom-right).
#[inline]
fn neighborhood(data: &Array2<f32>, row: usize, col: usize) -> [f64; 9] {
    let (h, w) = data.dim();
    let rows = [row.saturating_sub(1), row, (row + 1).min(h - 1)];
    let cols = [col.saturating_sub(1), col, (col + 1).min(w - 1)];
    let mut out = [0.0f64; 9];
    for (i, &r) in rows.iter().enumerate() {
        for (j, &c) in cols.iter().enumerate() {
            out[i * 3 + j] = data[[r, c]] as f64;
        }
    }
    out
}

/// Apply `op` to every 3x3 neighbourhood, writing the saturated result.
fn map_neighborhoods<F>(frame: &Frame, op: F) -> Frame
where
    F: Fn(&[f64; 9]) -> f64 + Sync,
{
    let data = &frame.data;
    let (h, w) = data.dim();
    let depth = frame.bit_depth;
    if h == 0 || w == 0 {
        return frame.clone();
    }

    let result = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                (0..w)
                    .map(|col| depth.saturate(op(&neighborhood(data, row, col))))
                    .collect()
            })
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        result
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| {
            depth.saturate(op(&neighborhood(data, row, col)))
        })
    };

    Frame::new(result, depth)
}

/// Convolve with an integer 3x3 kernel, divided by the kernel sum
/// (or by 1 when the kernel sums to zero).
pub fn convolve3x3(frame: &Frame, kernel: &[i32; 9]) -> Frame {
    let sum: i32 = kernel.iter().sum();
    let scale = if sum == 0 { 1.0 } else { sum as f64 };
    let k: [f64; 9] = kernel.map(|v| v as f64);
    map_neighborhoods(frame, |p| {
        p.iter().zip(k.iter()).map(|(a, b)| a * b).sum::<f64>() / scale
    })
}

/// 3x3 sharpen: `[-1 -1 -1; -1 12 -1; -1 -1 -1] / 4`.
pub fn sharpen(frame: &Frame) -> Frame {
    convolve3x3(frame, &SHARPEN_KERNEL)
}

/// Sobel edge map: `sqrt(gy^2 + gx^2)` with
/// `gy = p1 + 2p2 + p3 - p7 - 2p8 - p9` and
/// `gx = p1 + 2p4 + p7 - p3 - 2p6 - p9`.
///
/// Integer frames keep only the whole part of the magnitude (truncated,
/// not rounded) before saturation.
pub fn find_edges(frame: &Frame) -> Frame {
    let integer = frame.bit_depth.max_value().is_some();
    map_neighborhoods(frame, |p| {
        let gy = p[0] + 2.0 * p[1] + p[2] - p[6] - 2.0 * p[7] - p[8];
        let gx = p[0] + 2.0 * p[3] + p[6] - p[2] - 2.0 * p[5] - p[8];
        let magnitude = (gy * gy + gx * gx).sqrt();
        if integer {
            magnitude.trunc()
        } else {
            magnitude
        }
    })
}

/// 3x3 median filter.
pub fn median3x3(frame: &Frame) -> Frame {
    map_neighborhoods(frame, |p| {
        let mut window = *p;
        window.sort_unstable_by(|a, b| a.total_cmp(b));
        window[4]
    })
}
