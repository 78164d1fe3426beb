//! Volath's horizontal autocorrelation measures.

use crate::frame::Frame;
use crate::quality::statistics::mean_and_variance;

/// Sum over all rows of `I(x) * I(x + step)` for `x` in `start..end`.
fn lagged_product_sum(frame: &Frame, step: usize, start: usize, end: usize) -> f64 {
    let data = &frame.data;
    let mut sum = 0.0f64;
    for row in data.rows() {
        for x in start..end {
            sum += row[x] as f64 * row[x + step] as f64;
        }
    }
    sum
}

/// Volath's F4: lag-1 minus lag-2 autocorrelation.
///
/// The lag-1 sum starts at column 1, the lag-2 sum at column 0.
pub fn volath(frame: &Frame) -> f64 {
    let w = frame.width();
    let lag1 = lagged_product_sum(frame, 1, 1, w.saturating_sub(1));
    let lag2 = lagged_product_sum(frame, 2, 0, w.saturating_sub(2));
    lag1 - lag2
}

/// Volath's F5: lag-1 autocorrelation minus `(W - 1) * H * mean^2`.
/// Less sensitive to high-frequency noise than [`volath`].
pub fn volath5(frame: &Frame) -> f64 {
    let (w, h) = (frame.width(), frame.height());
    let lag1 = lagged_product_sum(frame, 1, 0, w.saturating_sub(1));
    let (mean, _) = mean_and_variance(&frame.data);
    lag1 - (w.saturating_sub(1) * h) as f64 * mean * mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volath_single_row() {
        // lag1 over x in [1, 3): 2*3 + 3*4 = 18
        // lag2 over x in [0, 2): 1*3 + 2*4 = 11
        let f = Frame::from_u8(4, 1, &[1, 2, 3, 4]).unwrap();
        assert!((volath(&f) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_volath5_flat_frame_is_zero() {
        let f = Frame::from_u8(5, 3, &[9; 15]).unwrap();
        assert!(volath5(&f).abs() < 1e-9);
    }
}
