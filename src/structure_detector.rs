use crate::types::{AnalysisError, BinaryMask, RasterImage};
use ndarray::{s, Array2, ArrayView3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rows at the bottom of a static map render occupied by the attribution band.
pub const ATTRIBUTION_STRIP_ROWS: usize = 100;

/// Hue/saturation/value in 8-bit image conventions: hue in [0, 180), S and V in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    pub crop_rows: usize,
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
    pub kernel_size: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            crop_rows: ATTRIBUTION_STRIP_ROWS,
            hue: (0, 180),
            saturation: (0, 30),
            value: (100, 255),
            kernel_size: 5,
        }
    }
}

impl DetectorParams {
    pub fn with_crop_rows(crop_rows: usize) -> Self {
        Self {
            crop_rows,
            ..Self::default()
        }
    }

    /// Inclusive colour-range test on a single pixel.
    pub fn accepts(&self, hsv: Hsv) -> bool {
        (self.hue.0..=self.hue.1).contains(&hsv.hue)
            && (self.saturation.0..=self.saturation.1).contains(&hsv.saturation)
            && (self.value.0..=self.value.1).contains(&hsv.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MorphOp {
    Dilate,
    Erode,
}

pub fn to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = (max - min) as f64;

    let saturation = if max == 0 {
        0
    } else {
        (255.0 * chroma / max as f64).round() as u8
    };

    let hue = if chroma == 0.0 {
        0
    } else {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        let degrees = if max as f64 == r {
            60.0 * (g - b) / chroma
        } else if max as f64 == g {
            120.0 + 60.0 * (b - r) / chroma
        } else {
            240.0 + 60.0 * (r - g) / chroma
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        ((degrees / 2.0).round() as u16 % 180) as u8
    };

    Hsv {
        hue,
        saturation,
        value: max,
    }
}

/// Structure mask with the default rooftop colour range and 5x5 cleanup.
pub fn detect(image: &RasterImage) -> Result<BinaryMask, AnalysisError> {
    detect_with(image, &DetectorParams::default())
}

/// Structure mask for `image`, sized to the cropped working area
/// (`width x (height - crop_rows)`), not to the full raster.
pub fn detect_with(image: &RasterImage, params: &DetectorParams) -> Result<BinaryMask, AnalysisError> {
    if params.kernel_size == 0 {
        return Err(AnalysisError::InvalidParameter(
            "morphology kernel size must be at least 1".to_string(),
        ));
    }

    let working = crop_attribution(image, params.crop_rows)?;
    let candidates = threshold(&working, params)?;
    debug!(
        candidates = candidates.iter().filter(|&&v| v).count(),
        rows = candidates.nrows(),
        cols = candidates.ncols(),
        "Colour thresholding complete"
    );

    // Closing must run before opening: gaps are filled first, then specks removed.
    let closed = close(&candidates, params.kernel_size)?;
    let opened = open(&closed, params.kernel_size)?;

    let mask = BinaryMask::new(opened)?;
    debug!(structure_pixels = mask.count(), "Morphological cleanup complete");
    Ok(mask)
}

/// View of `image` without the bottom `crop_rows` rows.
pub fn crop_attribution(image: &RasterImage, crop_rows: usize) -> Result<ArrayView3<'_, u8>, AnalysisError> {
    let height = image.height();
    if height <= crop_rows {
        return Err(AnalysisError::ImageTooSmall {
            height,
            crop: crop_rows,
        });
    }
    Ok(image.data().slice(s![..height - crop_rows, .., ..]))
}

fn threshold(working: &ArrayView3<u8>, params: &DetectorParams) -> Result<Array2<bool>, AnalysisError> {
    let (n_rows, n_cols, _) = working.dim();

    let values: Vec<bool> = (0..n_rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..n_cols).map(move |col| {
                let rgb = [
                    working[[row, col, 0]],
                    working[[row, col, 1]],
                    working[[row, col, 2]],
                ];
                params.accepts(to_hsv(rgb))
            })
        })
        .collect();

    Ok(Array2::from_shape_vec((n_rows, n_cols), values)?)
}

pub fn dilate(mask: &Array2<bool>, kernel_size: usize) -> Result<Array2<bool>, AnalysisError> {
    let rows_done = sweep(mask, kernel_size, Axis(1), MorphOp::Dilate)?;
    sweep(&rows_done, kernel_size, Axis(0), MorphOp::Dilate)
}

pub fn erode(mask: &Array2<bool>, kernel_size: usize) -> Result<Array2<bool>, AnalysisError> {
    let rows_done = sweep(mask, kernel_size, Axis(1), MorphOp::Erode)?;
    sweep(&rows_done, kernel_size, Axis(0), MorphOp::Erode)
}

/// Dilate then erode.
pub fn close(mask: &Array2<bool>, kernel_size: usize) -> Result<Array2<bool>, AnalysisError> {
    erode(&dilate(mask, kernel_size)?, kernel_size)
}

/// Erode then dilate.
pub fn open(mask: &Array2<bool>, kernel_size: usize) -> Result<Array2<bool>, AnalysisError> {
    dilate(&erode(mask, kernel_size)?, kernel_size)
}

/// One-dimensional pass of a square structuring element along `axis`.
///
/// The window is clipped at the raster edge, so pixels outside the image never
/// erode a border pixel nor dilate into it. Running the pass along both axes
/// equals the full square kernel.
fn sweep(
    mask: &Array2<bool>,
    kernel_size: usize,
    axis: Axis,
    op: MorphOp,
) -> Result<Array2<bool>, AnalysisError> {
    let (n_rows, n_cols) = mask.dim();
    let before = kernel_size / 2;
    let after = kernel_size - 1 - before;
    let extent = mask.len_of(axis);

    let values: Vec<bool> = (0..n_rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..n_cols).map(move |col| {
                let centre = if axis == Axis(0) { row } else { col };
                let lo = centre.saturating_sub(before);
                let hi = (centre + after).min(extent - 1);
                let window = if axis == Axis(0) {
                    mask.slice(s![lo..=hi, col])
                } else {
                    mask.slice(s![row, lo..=hi])
                };
                match op {
                    MorphOp::Dilate => window.iter().any(|&v| v),
                    MorphOp::Erode => window.iter().all(|&v| v),
                }
            })
        })
        .collect();

    Ok(Array2::from_shape_vec((n_rows, n_cols), values)?)
}
