use ndarray::Array2;

use zfocus_core::consts::{DIAGONAL_KERNEL_A, TENENGRAD_KERNEL_X};
use zfocus_core::filters::gaussian_blur::{gaussian_blur, gaussian_blur_array};
use zfocus_core::filters::kernel3x3::{convolve3x3, find_edges, median3x3, sharpen};
use zfocus_core::frame::{BitDepth, Frame};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_frame(h: usize, w: usize, fill: f32, depth: BitDepth) -> Frame {
    Frame::new(Array2::from_elem((h, w), fill), depth)
}

/// Left half dark, right half bright.
fn make_step_frame(h: usize, w: usize, depth: BitDepth) -> Frame {
    let data = Array2::from_shape_fn((h, w), |(_, c)| if c < w / 2 { 20.0 } else { 220.0 });
    Frame::new(data, depth)
}

// ---------------------------------------------------------------------------
// 3x3 filters
// ---------------------------------------------------------------------------

#[test]
fn test_find_edges_on_vertical_step() {
    let f = make_step_frame(6, 8, BitDepth::Eight);
    let e = find_edges(&f);
    // Columns 3 and 4 straddle the step: |gx| = 4 * 200 = 800, saturated.
    assert_eq!(e.data[[2, 3]], 255.0);
    assert_eq!(e.data[[2, 4]], 255.0);
    assert_eq!(e.data[[2, 0]], 0.0);
    assert_eq!(e.data[[2, 7]], 0.0);
}

#[test]
fn test_find_edges_float_keeps_full_response() {
    let f = make_step_frame(6, 8, BitDepth::Float);
    let e = find_edges(&f);
    assert!((e.data[[2, 3]] - 800.0).abs() < 1e-3);
}

#[test]
fn test_edge_duplication_at_borders() {
    // A constant frame has no response anywhere, border pixels included.
    let f = make_frame(3, 3, 42.0, BitDepth::Sixteen);
    assert!(find_edges(&f).data.iter().all(|&v| v == 0.0));
    assert!(median3x3(&f).data.iter().all(|&v| v == 42.0));
    assert!(sharpen(&f).data.iter().all(|&v| v == 42.0));
}

#[test]
fn test_sharpen_boosts_local_contrast() {
    let mut f = make_frame(5, 5, 100.0, BitDepth::Eight);
    f.data[[2, 2]] = 120.0;
    let s = sharpen(&f);
    // (12 * 120 - 8 * 100) / 4 = 160
    assert_eq!(s.data[[2, 2]], 160.0);
    // Neighbour: (12 * 100 - 7 * 100 - 120) / 4 = 95
    assert_eq!(s.data[[2, 1]], 95.0);
}

#[test]
fn test_sharpen_saturates_negative_to_zero() {
    let mut f = make_frame(5, 5, 0.0, BitDepth::Eight);
    f.data[[2, 2]] = 200.0;
    let s = sharpen(&f);
    assert_eq!(s.data[[2, 2]], 255.0);
    assert_eq!(s.data[[1, 1]], 0.0);
}

#[test]
fn test_convolve_zero_sum_kernel_not_scaled() {
    let f = make_step_frame(4, 8, BitDepth::Float);
    let tx = convolve3x3(&f, &TENENGRAD_KERNEL_X);
    let diag = convolve3x3(&f, &DIAGONAL_KERNEL_A);
    // Zero-sum kernels pass the raw weighted sum through.
    assert!(tx.data[[1, 3]].abs() > 100.0);
    assert!(diag.data.iter().any(|&v| v != 0.0));
}

#[test]
fn test_median_removes_salt_noise() {
    let mut f = make_frame(6, 6, 50.0, BitDepth::Eight);
    f.data[[1, 1]] = 255.0;
    f.data[[4, 3]] = 255.0;
    f.data[[0, 5]] = 255.0;
    let m = median3x3(&f);
    assert!(m.data.iter().all(|&v| v == 50.0));
}

#[test]
fn test_filters_preserve_shape_and_depth() {
    let f = make_step_frame(7, 5, BitDepth::Sixteen);
    for out in [find_edges(&f), sharpen(&f), median3x3(&f)] {
        assert_eq!(out.data.dim(), (7, 5));
        assert_eq!(out.bit_depth, BitDepth::Sixteen);
    }
}

// ---------------------------------------------------------------------------
// gaussian_blur
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_blur_preserves_constant() {
    let f = make_frame(16, 16, 80.0, BitDepth::Eight);
    let blurred = gaussian_blur(&f, 2.0);
    assert!(blurred.data.iter().all(|&v| v == 80.0));
}

#[test]
fn test_gaussian_blur_zero_sigma_is_identity() {
    let f = make_step_frame(8, 8, BitDepth::Eight);
    assert_eq!(gaussian_blur(&f, 0.0), f);
    assert_eq!(gaussian_blur(&f, -1.0), f);
}

#[test]
fn test_gaussian_blur_softens_step() {
    let f = make_step_frame(8, 16, BitDepth::Eight);
    let blurred = gaussian_blur(&f, 1.5);
    let left = blurred.data[[4, 7]];
    let right = blurred.data[[4, 8]];
    assert!(left > 20.0 && left < 220.0);
    assert!(right > 20.0 && right < 220.0);
    assert!(right > left);
    assert!(blurred.data.iter().all(|v| v.fract() == 0.0));
}

#[test]
fn test_gaussian_blur_array_conserves_mass_in_interior() {
    let mut data = Array2::<f32>::zeros((21, 21));
    data[[10, 10]] = 1.0;
    let blurred = gaussian_blur_array(&data, 1.0);
    let total: f32 = blurred.iter().sum();
    assert!((total - 1.0).abs() < 1e-4);
    assert!(blurred[[10, 10]] > blurred[[10, 11]]);
    assert!((blurred[[10, 11]] - blurred[[11, 10]]).abs() < 1e-6);
}
