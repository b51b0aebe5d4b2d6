pub mod geo_calibration;
pub mod irradiance;
pub mod overlay;
pub mod pipeline;
pub mod raster_io;
pub mod structure_detector;
pub mod types;
pub mod units;

pub use geo_calibration::calibrate;
pub use irradiance::aggregate;
pub use pipeline::{analyze, analyze_with, AnalysisReport, AnalysisRequest};
pub use structure_detector::{detect, detect_with, DetectorParams};
pub use types::*;
pub use units::{adaptive_unit, EnergyUnit, FormattedValue};
