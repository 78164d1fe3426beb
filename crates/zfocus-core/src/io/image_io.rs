use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma};
use tracing::debug;

use crate::error::{FocusError, Result};
use crate::frame::{BitDepth, Frame};

/// Load an image file as a monochrome frame in native intensity units.
///
/// 8-bit and 16-bit grayscale keep their depth. Color images are reduced
/// to the integer average of their channels (alpha is ignored); float
/// images are converted to 16-bit first.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let frame = match &img {
        DynamicImage::ImageLuma8(gray) => Frame::from_u8(w, h, gray.as_raw())?,
        DynamicImage::ImageLuma16(gray) => Frame::from_u16(w, h, gray.as_raw())?,
        DynamicImage::ImageLumaA8(_) => Frame::from_u8(w, h, img.to_luma8().as_raw())?,
        DynamicImage::ImageLumaA16(_) => Frame::from_u16(w, h, img.to_luma16().as_raw())?,
        DynamicImage::ImageRgb8(rgb) => Frame::from_rgb8(w, h, rgb.as_raw())?,
        DynamicImage::ImageRgba8(_) => Frame::from_rgb8(w, h, img.to_rgb8().as_raw())?,
        _ => Frame::from_rgb16(w, h, img.to_rgb16().as_raw())?,
    };

    debug!(path = %path.display(), width = w, height = h, depth = %frame.bit_depth, "Loaded image");
    Ok(frame)
}

/// Load a z-stack, one file per slice, in the given order.
pub fn load_stack<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Frame>> {
    let mut frames: Vec<Frame> = Vec::with_capacity(paths.len());
    for path in paths {
        let frame = load_image(path.as_ref())?;
        if let Some(first) = frames.first() {
            if first.width() != frame.width() || first.height() != frame.height() {
                return Err(FocusError::InvalidDimensions {
                    width: frame.width(),
                    height: frame.height(),
                });
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

/// Save a frame as grayscale at its own depth: 8-bit frames as 8-bit,
/// everything else as 16-bit (float data is clamped to `0..=65535`).
/// The format follows the file extension.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let invalid = || FocusError::InvalidDimensions {
        width: frame.width(),
        height: frame.height(),
    };

    match frame.bit_depth {
        BitDepth::Eight => {
            let pixels: Vec<u8> = frame.data.iter().map(|&v| BitDepth::Eight.saturate(v as f64) as u8).collect();
            let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w, h, pixels).ok_or_else(invalid)?;
            img.save(path)?;
        }
        BitDepth::Sixteen | BitDepth::Float => {
            let pixels: Vec<u16> = frame
                .data
                .iter()
                .map(|&v| BitDepth::Sixteen.saturate(v as f64) as u16)
                .collect();
            let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, pixels).ok_or_else(invalid)?;
            img.save(path)?;
        }
    }
    Ok(())
}
