use crate::frame::Frame;

/// Redondo's Laplacian-like measure.
///
/// For each interior pixel, `p = N + S + E + W - 4 * W` and the score is
/// `sum(p^2)`. The weighted term is the west neighbour rather than the
/// center pixel; that asymmetry is how the measure was published and is
/// what its tuning data was gathered with. Frames narrower or shorter than
/// 3 pixels have no interior and score 0.
pub fn redondo(frame: &Frame) -> f64 {
    let data = &frame.data;
    let (h, w) = data.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let west = data[[row, col - 1]] as f64;
            let p = west
                + data[[row, col + 1]] as f64
                + data[[row - 1, col]] as f64
                + data[[row + 1, col]] as f64
                - 4.0 * west;
            sum += p * p;
        }
    }
    sum
}
