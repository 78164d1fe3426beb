use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::frame::Frame;

/// Gaussian blur of a frame using separable 1D convolution.
///
/// Used to model defocus in the simulator and in metric tests. Integer
/// frames are rounded and saturated back into their pixel range; a
/// non-positive `sigma` returns an unchanged copy.
pub fn gaussian_blur(frame: &Frame, sigma: f32) -> Frame {
    if sigma <= 0.0 || frame.is_empty() {
        return frame.clone();
    }
    let depth = frame.bit_depth;
    let blurred = gaussian_blur_array(&frame.data, sigma).mapv(|v| depth.saturate(v as f64));
    Frame::new(blurred, depth)
}

/// Gaussian blur of a raw array, borders clamped.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let kernel = make_gaussian_kernel(sigma);
    let row_pass = convolve_axis(data, &kernel, Axis1D::Rows);
    convolve_axis(&row_pass, &kernel, Axis1D::Cols)
}

fn make_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

#[derive(Clone, Copy)]
enum Axis1D {
    Rows,
    Cols,
}

#[inline]
fn convolve_at(data: &Array2<f32>, kernel: &[f32], axis: Axis1D, row: usize, col: usize) -> f32 {
    let (h, w) = data.dim();
    let radius = kernel.len() as isize / 2;
    let mut sum = 0.0f32;
    for (ki, &kv) in kernel.iter().enumerate() {
        let offset = ki as isize - radius;
        let v = match axis {
            Axis1D::Rows => {
                let c = (col as isize + offset).clamp(0, w as isize - 1) as usize;
                data[[row, c]]
            }
            Axis1D::Cols => {
                let r = (row as isize + offset).clamp(0, h as isize - 1) as usize;
                data[[r, col]]
            }
        };
        sum += v * kv;
    }
    sum
}

fn convolve_axis(data: &Array2<f32>, kernel: &[f32], axis: Axis1D) -> Array2<f32> {
    let (h, w) = data.dim();

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                (0..w)
                    .map(|col| convolve_at(data, kernel, axis, row, col))
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
        Array2::from_shape_fn((h, w), |(row, col)| convolve_at(data, kernel, axis, row, col))
    }
}
