//! Fast Hartley Transform on square power-of-two buffers.
//!
//! The 2D transform is computed separably (rows, transpose, rows,
//! transpose) and then combined into true 2D Hartley coefficients with
//! Bracewell's quadrant step. The kernel is `cas(t) = cos(t) + sin(t)`, so
//! `H = Re(F) - Im(F)` for the usual forward DFT `F`.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{MAX_HARTLEY_LENGTH, MIN_HARTLEY_LENGTH, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{FocusError, Result};

/// Sine/cosine and bit-reversal tables for one transform length.
#[derive(Clone, Debug)]
pub struct HartleyTables {
    n: usize,
    cos: Vec<f32>,
    sin: Vec<f32>,
    bitrev: Vec<usize>,
}

impl HartleyTables {
    pub fn new(n: usize) -> Self {
        let quarter = n / 4;
        let d_theta = std::f64::consts::TAU / n as f64;
        let cos = (0..quarter).map(|i| (i as f64 * d_theta).cos() as f32).collect();
        let sin = (0..quarter).map(|i| (i as f64 * d_theta).sin() as f32).collect();

        let bits = n.trailing_zeros();
        let bitrev = (0..n)
            .map(|i| i.reverse_bits() >> (usize::BITS - bits))
            .collect();

        Self {
            n,
            cos,
            sin,
            bitrev,
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// In-place 2D Hartley transform with memoized tables.
///
/// Tables are built for the first length seen and rebuilt whenever a
/// buffer of a different length arrives. The instance is `&mut` on every
/// call, so it stays confined to whoever owns it (one scorer, one run).
#[derive(Debug, Default)]
pub struct HartleyTransform {
    tables: Option<HartleyTables>,
    scratch: Vec<f32>,
}

impl HartleyTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length the cached tables were built for, if any.
    pub fn cached_len(&self) -> Option<usize> {
        self.tables.as_ref().map(HartleyTables::len)
    }

    /// Forward transform. Output amplitudes are not scaled.
    pub fn forward(&mut self, data: &mut Array2<f32>) -> Result<()> {
        self.rc2dfht(data, false)
    }

    /// Inverse transform, scaled so that `inverse(forward(x)) == x`.
    pub fn inverse(&mut self, data: &mut Array2<f32>) -> Result<()> {
        self.rc2dfht(data, true)
    }

    fn prepare(&mut self, n: usize) {
        if self.cached_len() != Some(n) {
            debug!(n, "Building Hartley tables");
            self.tables = Some(HartleyTables::new(n));
            self.scratch = vec![0.0; n];
        }
    }

    fn rc2dfht(&mut self, data: &mut Array2<f32>, inverse: bool) -> Result<()> {
        let n = checked_transform_len(data.nrows(), data.ncols())?;
        self.prepare(n);

        if !data.is_standard_layout() {
            *data = data.as_standard_layout().into_owned();
        }
        let buf = data.as_slice_mut().ok_or(FocusError::InvalidTransformSize {
            width: n,
            height: n,
        })?;

        let Self { tables, scratch } = self;
        let tables = tables.as_ref().ok_or(FocusError::InvalidTransformSize {
            width: n,
            height: n,
        })?;

        transform_rows(buf, tables, scratch, inverse);
        transpose(buf, n);
        transform_rows(buf, tables, scratch, inverse);
        transpose(buf, n);
        bracewell_combine(buf, n);
        Ok(())
    }
}

/// True if `width x height` is a square whose side is a power of two.
pub fn is_power_of_two_square(width: usize, height: usize) -> bool {
    width == height && width.is_power_of_two()
}

fn checked_transform_len(height: usize, width: usize) -> Result<usize> {
    if !is_power_of_two_square(width, height)
        || !(MIN_HARTLEY_LENGTH..=MAX_HARTLEY_LENGTH).contains(&width)
    {
        return Err(FocusError::InvalidTransformSize { width, height });
    }
    Ok(width)
}

fn transform_rows(buf: &mut [f32], tables: &HartleyTables, scratch: &mut [f32], inverse: bool) {
    let n = tables.n;
    if n * n >= PARALLEL_PIXEL_THRESHOLD {
        buf.par_chunks_mut(n)
            .for_each_init(|| vec![0.0f32; n], |tmp, row| dfht(row, tables, tmp, inverse));
    } else {
        for row in buf.chunks_mut(n) {
            dfht(row, tables, scratch, inverse);
        }
    }
}

/// 1D fast Hartley transform of one row, in place.
///
/// Bit-reversal, a combined radix-4 pass for stages 0 and 1, then radix-2
/// stages using the quarter-length tables.
fn dfht(x: &mut [f32], tables: &HartleyTables, scratch: &mut [f32], inverse: bool) {
    let n = tables.n;
    let n_log2 = n.trailing_zeros();
    let (c, s) = (&tables.cos, &tables.sin);

    for (i, &src) in tables.bitrev.iter().enumerate() {
        scratch[i] = x[src];
    }
    x.copy_from_slice(&scratch[..n]);

    let mut gp_size = 2;
    let mut num_gps = n / 4;
    for gp in 0..num_gps {
        let ad1 = gp * 4;
        let ad2 = ad1 + 1;
        let ad3 = ad1 + gp_size;
        let ad4 = ad2 + gp_size;
        let rt1 = x[ad1] + x[ad2]; // a + b
        let rt2 = x[ad1] - x[ad2]; // a - b
        let rt3 = x[ad3] + x[ad4]; // c + d
        let rt4 = x[ad3] - x[ad4]; // c - d
        x[ad1] = rt1 + rt3;
        x[ad2] = rt2 + rt4;
        x[ad3] = rt1 - rt3;
        x[ad4] = rt2 - rt4;
    }

    if n_log2 > 2 {
        gp_size = 4;
        let mut num_bfs = 2;
        num_gps /= 2;
        for _stage in 2..n_log2 {
            for gp in 0..num_gps {
                let ad0 = gp * gp_size * 2;
                // First butterfly of each group needs no multiplications.
                let ad1 = ad0;
                let ad2 = ad1 + gp_size;
                let ad3 = ad1 + gp_size / 2;
                let ad4 = ad3 + gp_size;
                let rt1 = x[ad1];
                x[ad1] += x[ad2];
                x[ad2] = rt1 - x[ad2];
                let rt1 = x[ad3];
                x[ad3] += x[ad4];
                x[ad4] = rt1 - x[ad4];

                for bf in 1..num_bfs {
                    let ad1 = bf + ad0;
                    let ad2 = ad1 + gp_size;
                    let ad3 = gp_size - bf + ad0;
                    let ad4 = ad3 + gp_size;
                    let cs = bf * num_gps;

                    let rt1 = x[ad2] * c[cs] + x[ad4] * s[cs];
                    let rt2 = x[ad4] * c[cs] - x[ad2] * s[cs];

                    x[ad2] = x[ad1] - rt1;
                    x[ad1] += rt1;
                    x[ad4] = x[ad3] + rt2;
                    x[ad3] -= rt2;
                }
            }
            gp_size *= 2;
            num_bfs *= 2;
            num_gps /= 2;
        }
    }

    if inverse {
        let scale = n as f32;
        for v in x.iter_mut() {
            *v /= scale;
        }
    }
}

fn transpose(x: &mut [f32], n: usize) {
    for r in 0..n {
        for c in r + 1..n {
            x.swap(r * n + c, c * n + r);
        }
    }
}

/// Turn the separable row/column result into the true 2D Hartley transform
/// (Bracewell, "Fast two-dimensional Hartley transform", Proc. IEEE 1986).
fn bracewell_combine(x: &mut [f32], n: usize) {
    for row in 0..=n / 2 {
        for col in 0..=n / 2 {
            let m_row = (n - row) % n;
            let m_col = (n - col) % n;
            let a = x[row * n + col];
            let b = x[m_row * n + col];
            let c = x[row * n + m_col];
            let d = x[m_row * n + m_col];
            let e = ((a + d) - (b + c)) / 2.0;
            x[row * n + col] = a - e;
            x[m_row * n + col] = b + e;
            x[row * n + m_col] = c + e;
            x[m_row * n + m_col] = d - e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrev_table_n8() {
        let t = HartleyTables::new(8);
        assert_eq!(t.bitrev, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        assert_eq!(t.cos.len(), 2);
    }

    #[test]
    fn test_tables_rebuilt_on_length_change() {
        let mut fht = HartleyTransform::new();
        let mut a = Array2::<f32>::zeros((8, 8));
        fht.forward(&mut a).unwrap();
        assert_eq!(fht.cached_len(), Some(8));
        let mut b = Array2::<f32>::zeros((16, 16));
        fht.forward(&mut b).unwrap();
        assert_eq!(fht.cached_len(), Some(16));
    }

    #[test]
    fn test_dc_only_input() {
        let mut fht = HartleyTransform::new();
        let mut a = Array2::<f32>::from_elem((4, 4), 1.0);
        fht.forward(&mut a).unwrap();
        assert!((a[[0, 0]] - 16.0).abs() < 1e-5);
        let rest: f32 = a.iter().skip(1).map(|v| v.abs()).sum();
        assert!(rest < 1e-4);
    }

    #[test]
    fn test_rejects_non_square() {
        let mut fht = HartleyTransform::new();
        let mut a = Array2::<f32>::zeros((8, 16));
        assert!(fht.forward(&mut a).is_err());
    }

    #[test]
    fn test_rejects_too_small() {
        let mut fht = HartleyTransform::new();
        let mut a = Array2::<f32>::zeros((2, 2));
        assert!(fht.forward(&mut a).is_err());
    }
}
