use ndarray::{s, Array2};

use crate::error::Result;
use crate::frame::{BitDepth, Frame};
use crate::transform::hartley::{is_power_of_two_square, HartleyTransform};

/// Pad a frame to the smallest power-of-two square that holds it.
///
/// The original pixels sit at the top-left origin and the rest is filled
/// with the frame's mean intensity. Frames that are already power-of-two
/// squares come back unchanged.
pub fn pad(frame: &Frame) -> Frame {
    let (w, h) = (frame.width(), frame.height());
    if is_power_of_two_square(w, h) {
        return frame.clone();
    }

    let mut side = 2;
    while side < w.max(h) {
        side *= 2;
    }

    let fill = frame.mean() as f32;
    let mut data = Array2::<f32>::from_elem((side, side), fill);
    data.slice_mut(s![..h, ..w]).assign(&frame.data);
    Frame::new(data, frame.bit_depth)
}

/// Unscaled log power spectrum of `frame`.
///
/// The frame is padded, transformed with `fht`, and each coefficient pair
/// `(H[r,c], H[mirror])` is folded into `(a^2 + b^2) / 2`. Values of at
/// least 1 are stored as their natural log, everything else as 0. The
/// result is quadrant-swapped so the DC term lands at `(N/2, N/2)`.
pub fn power_spectrum(fht: &mut HartleyTransform, frame: &Frame) -> Result<Frame> {
    let padded = pad(frame);
    let mut h = padded.data;
    fht.forward(&mut h)?;

    let n = h.nrows();
    let half = n / 2;
    let mut ps = Array2::<f32>::zeros((n, n));
    for row in 0..n {
        let m_row = (n - row) % n;
        for col in 0..n {
            let m_col = (n - col) % n;
            let a = h[[row, col]] as f64;
            let b = h[[m_row, m_col]] as f64;
            let power = (a * a + b * b) / 2.0;
            let value = if power >= 1.0 { power.ln() } else { 0.0 };
            // NaN fails the comparison above and lands here as 0 too.
            ps[[(row + half) % n, (col + half) % n]] = value as f32;
        }
    }

    Ok(Frame::new(ps, BitDepth::Float))
}
