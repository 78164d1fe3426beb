use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FFT_LOWER_CUTOFF, DEFAULT_FFT_UPPER_CUTOFF};
use crate::error::Result;
use crate::frame::Frame;
use crate::transform::hartley::HartleyTransform;
use crate::transform::spectrum::power_spectrum;

fn default_lower() -> f64 {
    DEFAULT_FFT_LOWER_CUTOFF
}

fn default_upper() -> f64 {
    DEFAULT_FFT_UPPER_CUTOFF
}

/// Spatial-frequency band for the FFT band-pass metric, as percentages of
/// the spectrum radius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandpassCutoffs {
    #[serde(default = "default_lower")]
    pub lower_percent: f64,
    #[serde(default = "default_upper")]
    pub upper_percent: f64,
}

impl Default for BandpassCutoffs {
    fn default() -> Self {
        Self {
            lower_percent: DEFAULT_FFT_LOWER_CUTOFF,
            upper_percent: DEFAULT_FFT_UPPER_CUTOFF,
        }
    }
}

impl BandpassCutoffs {
    pub fn new(lower_percent: f64, upper_percent: f64) -> Self {
        Self {
            lower_percent,
            upper_percent,
        }
        .clamped()
    }

    /// Both cutoffs clamped into `[0, 100]`; NaN becomes the default.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64, fallback: f64| if v.is_nan() { fallback } else { v.clamp(0.0, 100.0) };
        Self {
            lower_percent: clamp(self.lower_percent, DEFAULT_FFT_LOWER_CUTOFF),
            upper_percent: clamp(self.upper_percent, DEFAULT_FFT_UPPER_CUTOFF),
        }
    }

    /// Disk radius in pixels for a cutoff percentage and spectrum midpoint.
    fn radius(percent: f64, mid: usize) -> f64 {
        (percent / 100.0 * mid as f64).round()
    }
}

/// Mean log power inside the annulus between the lower and upper cutoff
/// disks of the centered power spectrum.
///
/// With `mid = N / 2` and `s = round(percent / 100 * mid)`, a spectrum
/// pixel at distance `d` from `(mid, mid)` lies inside a disk when
/// `d <= s + 0.5`. The annulus is inside the upper disk and outside the
/// lower one. An empty annulus scores 0.
///
/// Log power stays a float (no byte quantization) and the average counts
/// annulus pixels only, not the masked-out inner disk. Absolute scores are
/// therefore higher than a whole-disk average of byte log values would
/// give; frame rankings are comparable.
pub fn fft_bandpass(fht: &mut HartleyTransform, frame: &Frame, cutoffs: &BandpassCutoffs) -> Result<f64> {
    let ps = power_spectrum(fht, frame)?;
    let n = ps.height();
    let mid = n / 2;
    let inner = BandpassCutoffs::radius(cutoffs.lower_percent, mid) + 0.5;
    let outer = BandpassCutoffs::radius(cutoffs.upper_percent, mid) + 0.5;
    let (inner_sq, outer_sq) = (inner * inner, outer * outer);

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for ((row, col), &v) in ps.data.indexed_iter() {
        let dy = row as f64 - mid as f64;
        let dx = col as f64 - mid as f64;
        let d_sq = dx * dx + dy * dy;
        if d_sq <= outer_sq && d_sq > inner_sq {
            sum += v as f64;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_cutoffs() {
        let c = BandpassCutoffs::new(-5.0, 250.0);
        assert_eq!(c.lower_percent, 0.0);
        assert_eq!(c.upper_percent, 100.0);
    }

    #[test]
    fn test_flat_frame_has_no_band_power() {
        let f = Frame::from_u8(16, 16, &[50; 256]).unwrap();
        let mut fht = HartleyTransform::new();
        let score = fft_bandpass(&mut fht, &f, &BandpassCutoffs::new(10.0, 50.0)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_annulus_scores_zero() {
        let f = Frame::from_u8(8, 8, &[1; 64]).unwrap();
        let mut fht = HartleyTransform::new();
        let score = fft_bandpass(&mut fht, &f, &BandpassCutoffs::new(50.0, 50.0)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_averages_annulus_pixels_only() {
        let data = ndarray::Array2::from_shape_fn((16, 16), |(r, c)| ((r * 37 + c * 11) % 23) as f32 * 9.0);
        let f = Frame::new(data, crate::frame::BitDepth::Eight);
        let mut fht = HartleyTransform::new();
        let score = fft_bandpass(&mut fht, &f, &BandpassCutoffs::new(25.0, 75.0)).unwrap();

        // mid = 8: inner disk radius 2.5, outer 6.5.
        let ps = power_spectrum(&mut fht, &f).unwrap();
        let (mut sum, mut annulus, mut disk) = (0.0f64, 0usize, 0usize);
        for ((row, col), &v) in ps.data.indexed_iter() {
            let d_sq = (row as f64 - 8.0).powi(2) + (col as f64 - 8.0).powi(2);
            if d_sq <= 6.5 * 6.5 {
                disk += 1;
                if d_sq > 2.5 * 2.5 {
                    sum += v as f64;
                    annulus += 1;
                }
            }
        }
        assert!(annulus < disk);
        assert!((score - sum / annulus as f64).abs() < 1e-9);
        assert!(score > sum / disk as f64);
    }
}
