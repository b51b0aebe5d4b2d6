use crate::pipeline::{DailyBar, ReportSummary};
use crate::types::*;
use chrono::{DateTime, Utc};
use image::{GrayImage, RgbImage};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

pub struct RasterIO;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlyForecast,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    time: Vec<i64>,
    global_tilted_irradiance: Vec<Option<f64>>,
    direct_normal_irradiance: Vec<Option<f64>>,
    diffuse_radiation: Vec<Option<f64>>,
}

impl RasterIO {
    pub fn read_image(path: &Path) -> Result<RasterImage, AnalysisError> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        RasterImage::from_rgb(width as usize, height as usize, rgb.into_raw())
    }

    pub fn write_image(path: &Path, raster: &RasterImage) -> Result<(), AnalysisError> {
        let buffer = RgbImage::from_raw(
            raster.width() as u32,
            raster.height() as u32,
            raster.to_rgb_bytes(),
        )
        .ok_or_else(|| AnalysisError::Config("raster buffer does not match its size".to_string()))?;
        buffer.save(path)?;
        Ok(())
    }

    /// Writes the mask as white structure on black.
    pub fn write_mask(path: &Path, mask: &BinaryMask) -> Result<(), AnalysisError> {
        let pixels: Vec<u8> = mask.data().iter().map(|&v| if v { 255 } else { 0 }).collect();
        let buffer = GrayImage::from_raw(mask.width() as u32, mask.height() as u32, pixels)
            .ok_or_else(|| AnalysisError::Config("mask buffer does not match its size".to_string()))?;
        buffer.save(path)?;
        Ok(())
    }

    pub fn read_irradiance(path: &Path) -> Result<IrradianceSeries, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_irradiance(&json)
    }

    /// Parses an hourly forecast with parallel `time` (unix seconds) and channel arrays.
    /// Missing (`null`) hours read as zero irradiance.
    pub fn parse_irradiance(json: &str) -> Result<IrradianceSeries, AnalysisError> {
        let response: ForecastResponse = serde_json::from_str(json)?;
        let hourly = response.hourly;
        let n = hourly.time.len();

        if hourly.global_tilted_irradiance.len() != n
            || hourly.direct_normal_irradiance.len() != n
            || hourly.diffuse_radiation.len() != n
        {
            return Err(AnalysisError::InvalidParameter(format!(
                "forecast arrays differ in length: time={}, global_tilted={}, direct_normal={}, diffuse={}",
                n,
                hourly.global_tilted_irradiance.len(),
                hourly.direct_normal_irradiance.len(),
                hourly.diffuse_radiation.len()
            )));
        }

        hourly
            .time
            .iter()
            .enumerate()
            .map(|(i, &seconds)| -> Result<IrradianceSample, AnalysisError> {
                let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
                    AnalysisError::InvalidParameter(format!("timestamp {} out of range", seconds))
                })?;
                Ok(IrradianceSample {
                    timestamp,
                    global_tilted_irradiance: hourly.global_tilted_irradiance[i].unwrap_or(0.0),
                    direct_normal_irradiance: hourly.direct_normal_irradiance[i].unwrap_or(0.0),
                    diffuse_radiation: hourly.diffuse_radiation[i].unwrap_or(0.0),
                })
            })
            .collect()
    }

    pub fn write_hourly_csv(
        path: &Path,
        series: &[IrradianceSample],
        hourly_potential_kwh: &[f64],
    ) -> Result<(), AnalysisError> {
        let mut file = std::fs::File::create(path)?;

        writeln!(
            file,
            "timestamp,global_tilted_irradiance,direct_normal_irradiance,diffuse_radiation,potential_kwh"
        )?;

        for (sample, potential) in series.iter().zip(hourly_potential_kwh) {
            writeln!(
                file,
                "{},{},{},{},{:.6}",
                sample.timestamp.to_rfc3339(),
                sample.global_tilted_irradiance,
                sample.direct_normal_irradiance,
                sample.diffuse_radiation,
                potential
            )?;
        }

        Ok(())
    }

    pub fn write_daily_csv(path: &Path, bars: &[DailyBar]) -> Result<(), AnalysisError> {
        let mut file = std::fs::File::create(path)?;

        writeln!(file, "date,hours,potential_kwh")?;
        for bar in bars {
            writeln!(file, "{},{},{:.6}", bar.date, bar.hours, bar.potential_kwh)?;
        }

        Ok(())
    }

    pub fn write_report_json(path: &Path, summary: &ReportSummary) -> Result<(), AnalysisError> {
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
