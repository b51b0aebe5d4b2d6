use crate::structure_detector::crop_attribution;
use crate::types::{AnalysisError, BinaryMask, RasterImage};
use ndarray::Array3;

pub const IMAGE_WEIGHT: f32 = 0.7;
pub const TINT_WEIGHT: f32 = 0.3;
pub const STRUCTURE_TINT: [u8; 3] = [0, 255, 0];

/// Blends a green tint over the structure pixels of the cropped image.
///
/// `mask` must have the cropped dimensions produced by the detector for the
/// same `crop_rows`.
pub fn overlay(image: &RasterImage, mask: &BinaryMask, crop_rows: usize) -> Result<RasterImage, AnalysisError> {
    let working = crop_attribution(image, crop_rows)?;
    let (n_rows, n_cols, _) = working.dim();
    if (mask.height(), mask.width()) != (n_rows, n_cols) {
        return Err(AnalysisError::InvalidParameter(format!(
            "mask is {}x{} but cropped image is {}x{}",
            mask.width(),
            mask.height(),
            n_cols,
            n_rows
        )));
    }

    // Non-structure pixels blend with black, so they are darkened too.
    let blended = Array3::from_shape_fn((n_rows, n_cols, 3), |(row, col, ch)| {
        let tint = if mask.get(row, col) {
            STRUCTURE_TINT[ch]
        } else {
            0
        };
        blend(working[[row, col, ch]], tint)
    });

    RasterImage::new(blended)
}

/// Single-precision weighted sum, halves rounded to even, saturated to 8 bits.
fn blend(pixel: u8, tint: u8) -> u8 {
    (IMAGE_WEIGHT * pixel as f32 + TINT_WEIGHT * tint as f32)
        .round_ties_even()
        .clamp(0.0, 255.0) as u8
}
