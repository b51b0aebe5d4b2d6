use crate::geo_calibration::calibrate;
use crate::irradiance::{aggregate, HOURS_PER_DAY};
use crate::overlay::overlay;
use crate::structure_detector::{detect_with, DetectorParams};
use crate::types::*;
use crate::units::{adaptive_unit, FormattedValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Inputs of one analysis. Everything the pipeline needs is passed in here.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub image: &'a RasterImage,
    pub latitude: f64,
    pub zoom_level: u32,
    pub series: &'a [IrradianceSample],
    pub panel_efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormattedSummary {
    pub daily: FormattedValue,
    pub weekly: FormattedValue,
    pub yearly: FormattedValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrradianceChart {
    pub global_tilted: Vec<ChartPoint>,
    pub direct_normal: Vec<ChartPoint>,
    pub diffuse: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub potential_kwh: f64,
    pub hours: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub mask: BinaryMask,
    pub overlay: RasterImage,
    pub calibration: GeoCalibration,
    pub estimate: SolarEstimate,
    pub structure_pixels: usize,
    pub formatted: FormattedSummary,
    pub series: IrradianceSeries,
}

/// Serializable part of a report, without the rasters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub calibration: GeoCalibration,
    pub mask_width: usize,
    pub mask_height: usize,
    pub structure_pixels: usize,
    pub total_area_sq_m: f64,
    pub structure_area_sq_m: f64,
    pub avg_daily_kwh: f64,
    pub total_weekly_kwh: f64,
    pub estimated_yearly_kwh: f64,
    pub formatted: FormattedSummary,
    pub daily: Vec<DailyBar>,
}

pub fn analyze(request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
    analyze_with(request, &DetectorParams::default())
}

/// Runs detection, calibration, aggregation and formatting in that order.
/// The first failing stage's error is returned as is.
pub fn analyze_with(
    request: &AnalysisRequest,
    params: &DetectorParams,
) -> Result<AnalysisReport, AnalysisError> {
    let mask = detect_with(request.image, params)?;
    let calibration = calibrate(request.latitude, request.zoom_level)?;

    let structure_pixels = mask.count();
    let total_area_sq_m = calibration.total_area(&mask);
    let structure_area_sq_m = calibration.structure_area(&mask);

    let estimate = SolarEstimate {
        total_area_sq_m,
        ..aggregate(request.series, structure_area_sq_m, request.panel_efficiency)?
    };

    let formatted = FormattedSummary {
        daily: adaptive_unit(estimate.avg_daily_kwh),
        weekly: adaptive_unit(estimate.total_weekly_kwh),
        yearly: adaptive_unit(estimate.estimated_yearly_kwh),
    };

    let overlay = overlay(request.image, &mask, params.crop_rows)?;

    info!(
        latitude = request.latitude,
        meters_per_pixel = calibration.meters_per_pixel,
        structure_pixels,
        structure_area_sq_m,
        avg_daily = %formatted.daily,
        "Solar potential analysis complete"
    );

    Ok(AnalysisReport {
        mask,
        overlay,
        calibration,
        estimate,
        structure_pixels,
        formatted,
        series: request.series.to_vec(),
    })
}

impl AnalysisReport {
    pub fn irradiance_chart(&self) -> IrradianceChart {
        let points = |channel: fn(&IrradianceSample) -> f64| -> Vec<ChartPoint> {
            self.series
                .iter()
                .map(|s| ChartPoint {
                    timestamp: s.timestamp,
                    value: channel(s),
                })
                .collect()
        };

        IrradianceChart {
            global_tilted: points(|s| s.global_tilted_irradiance),
            direct_normal: points(|s| s.direct_normal_irradiance),
            diffuse: points(|s| s.diffuse_radiation),
        }
    }

    /// One bar per day block, dated by the block's first sample (UTC).
    pub fn daily_chart(&self) -> Vec<DailyBar> {
        self.series
            .chunks(HOURS_PER_DAY)
            .zip(&self.estimate.daily_potential_kwh)
            .map(|(block, &potential_kwh)| DailyBar {
                date: block[0].timestamp.date_naive(),
                potential_kwh,
                hours: block.len(),
            })
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            calibration: self.calibration,
            mask_width: self.mask.width(),
            mask_height: self.mask.height(),
            structure_pixels: self.structure_pixels,
            total_area_sq_m: self.estimate.total_area_sq_m,
            structure_area_sq_m: self.estimate.structure_area_sq_m,
            avg_daily_kwh: self.estimate.avg_daily_kwh,
            total_weekly_kwh: self.estimate.total_weekly_kwh,
            estimated_yearly_kwh: self.estimate.estimated_yearly_kwh,
            formatted: self.formatted,
            daily: self.daily_chart(),
        }
    }

    pub fn summary_text(&self) -> String {
        format!(
            "Solar Potential Analysis Results\n\n\
             Total Area: {:.2} sq. meters\n\
             Estimated Structure Area: {:.2} sq. meters\n\n\
             Average Daily Solar Potential: {}\n\
             Total Weekly Solar Potential: {}\n\
             Estimated Yearly Solar Potential: {}",
            self.estimate.total_area_sq_m,
            self.estimate.structure_area_sq_m,
            self.formatted.daily,
            self.formatted.weekly,
            self.formatted.yearly
        )
    }
}
