mod common;

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use common::{noise_frame, unit_noise};
use zfocus_core::error::{ErrorKind, FocusError};
use zfocus_core::frame::{BitDepth, Frame};
use zfocus_core::transform::{pad, power_spectrum, HartleyTransform};

fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Reference 2D DFT via rustfft, returned as `Re(F) - Im(F)`.
fn hartley_via_fft(x: &Array2<f32>) -> Array2<f64> {
    let n = x.nrows();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut buf: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v as f64, 0.0)).collect();
    for row in buf.chunks_mut(n) {
        fft.process(row);
    }
    let mut col = vec![Complex::new(0.0, 0.0); n];
    for c in 0..n {
        for r in 0..n {
            col[r] = buf[r * n + c];
        }
        fft.process(&mut col);
        for r in 0..n {
            buf[r * n + c] = col[r];
        }
    }

    Array2::from_shape_fn((n, n), |(r, c)| {
        let f = buf[r * n + c];
        f.re - f.im
    })
}

#[test]
fn test_matches_fft_definition() {
    for n in [4, 8, 16, 32] {
        let x = unit_noise(n, 7 + n as u64);
        let expected = hartley_via_fft(&x);

        let mut h = x.clone();
        HartleyTransform::new().forward(&mut h).unwrap();

        for ((r, c), &v) in h.indexed_iter() {
            let e = expected[[r, c]];
            assert!(
                (v as f64 - e).abs() < 1e-3 * (n as f64),
                "n={n} at ({r},{c}): {v} vs {e}"
            );
        }
    }
}

#[test]
fn test_round_trip() {
    let mut fht = HartleyTransform::new();
    for n in [4, 16, 64] {
        let x = unit_noise(n, 42);
        let mut h = x.clone();
        fht.forward(&mut h).unwrap();
        fht.inverse(&mut h).unwrap();
        let err = max_abs_diff(&h, &x);
        assert!(err < 1e-4, "n={n}: round trip error {err}");
    }
}

#[test]
fn test_round_trip_parallel_size() {
    // 256 x 256 crosses the row-parallel threshold.
    let x = unit_noise(256, 3);
    let mut h = x.clone();
    let mut fht = HartleyTransform::new();
    fht.forward(&mut h).unwrap();
    fht.inverse(&mut h).unwrap();
    let err = max_abs_diff(&h, &x);
    assert!(err < 1e-3, "round trip error {err}");
}

#[test]
fn test_forward_twice_scales_by_n_squared() {
    let n = 8;
    let x = unit_noise(n, 11);
    let mut h = x.clone();
    let mut fht = HartleyTransform::new();
    fht.forward(&mut h).unwrap();
    fht.forward(&mut h).unwrap();
    let scaled = h.mapv(|v| v / (n * n) as f32);
    let err = max_abs_diff(&scaled, &x);
    assert!(err < 1e-5, "self-inverse error {err}");
}

#[test]
fn test_non_standard_layout_input() {
    let x = unit_noise(8, 5);
    let mut transposed = x.t().to_owned();
    let mut reference = x.t().as_standard_layout().into_owned();
    let mut fht = HartleyTransform::new();
    fht.forward(&mut transposed).unwrap();
    fht.forward(&mut reference).unwrap();
    assert!(max_abs_diff(&transposed, &reference) < 1e-6);

    let mut view_layout = x.clone().reversed_axes();
    fht.forward(&mut view_layout).unwrap();
    assert!(max_abs_diff(&view_layout, &reference) < 1e-4);
}

#[test]
fn test_invalid_sizes_rejected() {
    let mut fht = HartleyTransform::new();
    for (h, w) in [(8, 16), (12, 12), (2, 2), (1, 1), (0, 0)] {
        let mut a = Array2::<f32>::zeros((h, w));
        let err = fht.forward(&mut a).unwrap_err();
        assert!(matches!(err, FocusError::InvalidTransformSize { .. }), "{h}x{w}");
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }
}

#[test]
fn test_pad_is_idempotent() {
    let f = noise_frame(5, 3, 1);
    let once = pad(&f);
    assert_eq!((once.width(), once.height()), (8, 8));
    assert_eq!(pad(&once), once);

    let square = noise_frame(16, 16, 2);
    assert_eq!(pad(&square), square);

    let tall = noise_frame(3, 9, 4);
    let padded = pad(&tall);
    assert_eq!((padded.width(), padded.height()), (16, 16));
    assert_eq!(padded.data[[8, 2]], tall.data[[8, 2]]);
    assert!((padded.data[[15, 15]] as f64 - tall.mean()).abs() < 1e-3);
}

#[test]
fn test_spectrum_of_cosine_has_symmetric_peaks() {
    // 100 + 100 cos(2 pi * 2c / 16): energy at horizontal frequency +-2.
    let n = 16;
    let data = Array2::from_shape_fn((n, n), |(_, c)| {
        100.0 + 100.0 * (std::f32::consts::TAU * 2.0 * c as f32 / n as f32).cos()
    });
    let frame = Frame::new(data, BitDepth::Float);

    let ps = power_spectrum(&mut HartleyTransform::new(), &frame).unwrap();
    // H(0, +-2) = 16 * 16 * 100 / 2
    let expected = (12_800.0f64 * 12_800.0).ln() as f32;
    assert!((ps.data[[8, 10]] - expected).abs() < 1e-3);
    assert!((ps.data[[8, 6]] - expected).abs() < 1e-3);
    assert_eq!(ps.data[[9, 10]], 0.0);
    assert_eq!(ps.data[[10, 8]], 0.0);
}

#[test]
fn test_spectrum_pads_non_square_input() {
    let f = noise_frame(20, 12, 9);
    let ps = power_spectrum(&mut HartleyTransform::new(), &f).unwrap();
    assert_eq!((ps.width(), ps.height()), (32, 32));
    assert!(ps.data.iter().all(|v| v.is_finite() && *v >= 0.0));
}
