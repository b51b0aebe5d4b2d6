use crate::geo_calibration::MAX_ZOOM_LEVEL;
use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_zoom_level")]
    pub zoom_level: u32,
    #[serde(default = "default_panel_efficiency")]
    pub panel_efficiency: f64,
    #[serde(default = "default_crop_rows")]
    pub crop_rows: usize,
    pub image_path: String,
    pub irradiance_path: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<usize>,
}

fn default_zoom_level() -> u32 {
    15
}

fn default_panel_efficiency() -> f64 {
    0.20
}

fn default_crop_rows() -> usize {
    100
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Checks the site and panel parameters before any raster work starts.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AnalysisError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AnalysisError::Config(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if self.zoom_level > MAX_ZOOM_LEVEL {
            return Err(AnalysisError::Config(format!(
                "zoom_level {} exceeds {}",
                self.zoom_level, MAX_ZOOM_LEVEL
            )));
        }
        if !(self.panel_efficiency > 0.0 && self.panel_efficiency <= 1.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "panel efficiency {} outside (0, 1]",
                self.panel_efficiency
            )));
        }
        if self.cpu_cores == Some(0) {
            return Err(AnalysisError::Config("cpu_cores must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn get_cpu_cores(&self) -> usize {
        self.cpu_cores.unwrap_or_else(num_cpus::get)
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => PathBuf::from(dir),
            None => match dirs::document_dir() {
                Some(dir) => dir.join("SolarPotential_Exports"),
                None => PathBuf::from("exports"),
            },
        }
    }
}

/// Decoded RGB raster, stored as (rows, cols, channel).
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    data: Array3<u8>,
}

impl RasterImage {
    pub fn new(data: Array3<u8>) -> Result<Self, AnalysisError> {
        let (height, width, channels) = data.dim();
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "raster must be non-empty, got {}x{}",
                width, height
            )));
        }
        if channels != 3 {
            return Err(AnalysisError::InvalidParameter(format!(
                "raster must have 3 channels, got {}",
                channels
            )));
        }
        Ok(Self { data })
    }

    /// Builds a raster from interleaved row-major RGB bytes.
    pub fn from_rgb(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, AnalysisError> {
        if pixels.len() != width * height * 3 {
            return Err(AnalysisError::InvalidParameter(format!(
                "expected {} bytes for {}x{} RGB raster, got {}",
                width * height * 3,
                width,
                height,
                pixels.len()
            )));
        }
        Self::new(Array3::from_shape_vec((height, width, 3), pixels)?)
    }

    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Result<Self, AnalysisError>
    where
        F: Fn(usize, usize) -> [u8; 3],
    {
        Self::new(Array3::from_shape_fn((height, width, 3), |(row, col, ch)| {
            f(row, col)[ch]
        }))
    }

    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Result<Self, AnalysisError> {
        Self::from_fn(width, height, |_, _| rgb)
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }

    /// Interleaved row-major RGB bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    data: Array2<bool>,
}

impl BinaryMask {
    pub fn new(data: Array2<bool>) -> Result<Self, AnalysisError> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "mask must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.data[[row, col]]
    }

    /// Number of structure pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCalibration {
    pub latitude: f64,
    pub zoom_level: u32,
    pub meters_per_pixel: f64,
    pub pixel_area_sq_m: f64,
}

/// One hour of forecast irradiance, all channels in W/m².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrradianceSample {
    pub timestamp: DateTime<Utc>,
    pub global_tilted_irradiance: f64,
    pub direct_normal_irradiance: f64,
    pub diffuse_radiation: f64,
}

/// Chronological hourly samples.
pub type IrradianceSeries = Vec<IrradianceSample>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarEstimate {
    pub total_area_sq_m: f64,
    pub structure_area_sq_m: f64,
    pub hourly_potential_kwh: Vec<f64>,
    pub daily_potential_kwh: Vec<f64>,
    pub avg_daily_kwh: f64,
    pub total_weekly_kwh: f64,
    pub estimated_yearly_kwh: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid latitude: {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("Image too small: height {height} must exceed the {crop}-row attribution strip")]
    ImageTooSmall { height: usize, crop: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Raster shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
