use crate::types::{AnalysisError, IrradianceSample, SolarEstimate};
use tracing::debug;

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Energy estimates for `structure_area_sq_m` of panels over an hourly forecast.
///
/// Only the global tilted channel drives the estimate. Day blocks are taken
/// 24 samples at a time from the first sample; when the series length is not a
/// multiple of 24 the last block is a partial day and is still reported.
///
/// The returned `total_area_sq_m` equals the structure area; callers that
/// surveyed a larger area overwrite it.
pub fn aggregate(
    series: &[IrradianceSample],
    structure_area_sq_m: f64,
    panel_efficiency: f64,
) -> Result<SolarEstimate, AnalysisError> {
    if !(panel_efficiency > 0.0 && panel_efficiency <= 1.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "panel efficiency {} outside (0, 1]",
            panel_efficiency
        )));
    }
    if !(structure_area_sq_m >= 0.0 && structure_area_sq_m.is_finite()) {
        return Err(AnalysisError::InvalidParameter(format!(
            "structure area {} must be a non-negative number",
            structure_area_sq_m
        )));
    }
    if series.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "irradiance series is empty".to_string(),
        ));
    }
    if let Some(bad) = series
        .iter()
        .find(|s| !s.global_tilted_irradiance.is_finite())
    {
        return Err(AnalysisError::InvalidParameter(format!(
            "non-finite global tilted irradiance at {}",
            bad.timestamp.to_rfc3339()
        )));
    }

    let hourly_potential_kwh: Vec<f64> = series
        .iter()
        .map(|s| hourly_potential(structure_area_sq_m, panel_efficiency, s.global_tilted_irradiance))
        .collect();

    let daily_potential_kwh = daily_sums(&hourly_potential_kwh);
    let total_weekly_kwh: f64 = daily_potential_kwh.iter().sum();
    let avg_daily_kwh = total_weekly_kwh / daily_potential_kwh.len() as f64;

    debug!(
        samples = series.len(),
        days = daily_potential_kwh.len(),
        avg_daily_kwh,
        "Aggregated irradiance"
    );

    Ok(SolarEstimate {
        total_area_sq_m: structure_area_sq_m,
        structure_area_sq_m,
        hourly_potential_kwh,
        daily_potential_kwh,
        avg_daily_kwh,
        total_weekly_kwh,
        estimated_yearly_kwh: avg_daily_kwh * DAYS_PER_YEAR,
    })
}

/// kWh produced in one hour by `area_sq_m` of panels at `irradiance` W/m².
pub fn hourly_potential(area_sq_m: f64, panel_efficiency: f64, irradiance: f64) -> f64 {
    area_sq_m * panel_efficiency * irradiance / 1000.0
}

pub fn daily_sums(hourly: &[f64]) -> Vec<f64> {
    hourly
        .chunks(HOURS_PER_DAY)
        .map(|day| day.iter().sum())
        .collect()
}

/// Number of samples in each day block, the last one possibly short.
pub fn day_block_lengths(samples: usize) -> Vec<usize> {
    (0..samples)
        .step_by(HOURS_PER_DAY)
        .map(|start| (samples - start).min(HOURS_PER_DAY))
        .collect()
}
