use crate::types::{AnalysisError, BinaryMask, GeoCalibration};

/// Ground resolution of a zoom-0 Web-Mercator tile pixel at the equator.
pub const EQUATOR_METERS_PER_PIXEL: f64 = 156543.03392;

/// Deepest zoom accepted. Far beyond any tile server, and `2^zoom` stays finite.
pub const MAX_ZOOM_LEVEL: u32 = 30;

/// Ground resolution for a raster rendered at `zoom_level` around `latitude`.
///
/// The caller guarantees the raster really was rendered at `zoom_level`.
/// Zoom levels above [`MAX_ZOOM_LEVEL`] fail with `InvalidParameter`.
pub fn calibrate(latitude: f64, zoom_level: u32) -> Result<GeoCalibration, AnalysisError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AnalysisError::InvalidLatitude(latitude));
    }
    if zoom_level > MAX_ZOOM_LEVEL {
        return Err(AnalysisError::InvalidParameter(format!(
            "zoom level {} exceeds {}",
            zoom_level, MAX_ZOOM_LEVEL
        )));
    }

    // sin of the co-latitude, so the poles come out at exactly zero
    let lat_scale = (90.0 - latitude.abs()).to_radians().sin();
    let meters_per_pixel = EQUATOR_METERS_PER_PIXEL * lat_scale / 2f64.powi(zoom_level as i32);

    Ok(GeoCalibration {
        latitude,
        zoom_level,
        meters_per_pixel,
        pixel_area_sq_m: meters_per_pixel * meters_per_pixel,
    })
}

impl GeoCalibration {
    pub fn area_of(&self, pixels: usize) -> f64 {
        pixels as f64 * self.pixel_area_sq_m
    }

    /// Ground area covered by the whole mask.
    pub fn total_area(&self, mask: &BinaryMask) -> f64 {
        self.area_of(mask.len())
    }

    /// Ground area covered by structure pixels only.
    pub fn structure_area(&self, mask: &BinaryMask) -> f64 {
        self.area_of(mask.count())
    }
}
