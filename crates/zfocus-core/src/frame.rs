use ndarray::Array2;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};

/// Pixel type of the source data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
    /// Floating-point data (transform intermediates, spectra).
    Float,
}

impl BitDepth {
    /// Largest representable intensity, or `None` for float data.
    pub fn max_value(self) -> Option<f32> {
        match self {
            Self::Eight => Some(u8::MAX as f32),
            Self::Sixteen => Some(u16::MAX as f32),
            Self::Float => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::Float => 32,
        }
    }

    /// Convert a filter response back into this pixel type: integer depths
    /// round and saturate to `0..=max`, float passes through.
    pub fn saturate(self, value: f64) -> f32 {
        match self.max_value() {
            Some(max) => value.round().clamp(0.0, max as f64) as f32,
            None => value as f32,
        }
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eight => write!(f, "8-bit"),
            Self::Sixteen => write!(f, "16-bit"),
            Self::Float => write!(f, "32-bit float"),
        }
    }
}

/// A single grayscale frame.
///
/// Pixel values are f32 in native intensity units (0..=255 for 8-bit,
/// 0..=65535 for 16-bit). Focus metrics depend on absolute intensities,
/// so frames are never normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    pub bit_depth: BitDepth,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: BitDepth) -> Self {
        Self { data, bit_depth }
    }

    /// Build a frame from a row-major pixel buffer of any primitive type.
    pub fn from_pixels<T>(width: usize, height: usize, pixels: &[T], bit_depth: BitDepth) -> Result<Self>
    where
        T: AsPrimitive<f32>,
    {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(FocusError::InvalidDimensions { width, height });
        }
        let data = Array2::from_shape_fn((height, width), |(row, col)| {
            pixels[row * width + col].as_()
        });
        Ok(Self::new(data, bit_depth))
    }

    pub fn from_u8(width: usize, height: usize, pixels: &[u8]) -> Result<Self> {
        Self::from_pixels(width, height, pixels, BitDepth::Eight)
    }

    pub fn from_u16(width: usize, height: usize, pixels: &[u16]) -> Result<Self> {
        Self::from_pixels(width, height, pixels, BitDepth::Sixteen)
    }

    pub fn from_f32(width: usize, height: usize, pixels: &[f32]) -> Result<Self> {
        Self::from_pixels(width, height, pixels, BitDepth::Float)
    }

    /// Collapse interleaved 8-bit RGB to monochrome with the plain channel
    /// average `(r + g + b) / 3` (integer division).
    pub fn from_rgb8(width: usize, height: usize, rgb: &[u8]) -> Result<Self> {
        if width == 0 || height == 0 || rgb.len() != width * height * 3 {
            return Err(FocusError::InvalidDimensions { width, height });
        }
        let mono: Vec<u8> = rgb
            .chunks_exact(3)
            .map(|px| ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8)
            .collect();
        Self::from_u8(width, height, &mono)
    }

    /// 16-bit counterpart of [`Frame::from_rgb8`].
    pub fn from_rgb16(width: usize, height: usize, rgb: &[u16]) -> Result<Self> {
        if width == 0 || height == 0 || rgb.len() != width * height * 3 {
            return Err(FocusError::InvalidDimensions { width, height });
        }
        let mono: Vec<u16> = rgb
            .chunks_exact(3)
            .map(|px| ((px[0] as u32 + px[1] as u32 + px[2] as u32) / 3) as u16)
            .collect();
        Self::from_u16(width, height, &mono)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Region covering the whole frame.
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width() as u32, self.height() as u32)
    }

    /// Mean intensity, accumulated in f64. Zero for an empty frame.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }

    /// Copy out the pixels inside `region`.
    pub fn crop(&self, region: &Region) -> Result<Frame> {
        let r = region.validated(self.width() as u32, self.height() as u32)?;
        let (x, y) = (r.x as usize, r.y as usize);
        let (w, h) = (r.width as usize, r.height as usize);
        let data = self
            .data
            .slice(ndarray::s![y..y + h, x..x + w])
            .to_owned();
        Ok(Frame::new(data, self.bit_depth))
    }
}

/// A rectangle in image (or sensor) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrink this region by `crop_factor` around its own center.
    ///
    /// Width and height are truncated (`floor(w * f)`), the offset is split
    /// evenly with the odd pixel going to the far side.
    pub fn centered(&self, crop_factor: f64) -> Region {
        let w = (self.width as f64 * crop_factor) as u32;
        let h = (self.height as f64 * crop_factor) as u32;
        Region {
            x: self.x + (self.width - w.min(self.width)) / 2,
            y: self.y + (self.height - h.min(self.height)) / 2,
            width: w.min(self.width),
            height: h.min(self.height),
        }
    }

    /// Check that the region is non-empty and lies within `src_w` x `src_h`.
    pub fn validated(&self, src_w: u32, src_h: u32) -> Result<Region> {
        if self.is_empty() {
            return Err(FocusError::InvalidRegion(format!(
                "Region width and height must be > 0, got {}x{}",
                self.width, self.height
            )));
        }

        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        if right > src_w as u64 || bottom > src_h as u64 {
            return Err(FocusError::InvalidRegion(format!(
                "Region ({},{} {}x{}) exceeds frame dimensions ({src_w}x{src_h})",
                self.x, self.y, self.width, self.height
            )));
        }

        Ok(*self)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{} {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// A scored z position. Higher score means more in focus; scores are only
/// comparable within one run of one metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusCandidate {
    pub z: f64,
    pub score: f64,
}

impl FocusCandidate {
    pub fn new(z: f64, score: f64) -> Self {
        Self { z, score }
    }
}
