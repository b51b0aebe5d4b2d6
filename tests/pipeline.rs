use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use rooftop_solar::{
    adaptive_unit, aggregate, analyze, calibrate, detect, AnalysisError, AnalysisRequest,
    IrradianceSample, RasterImage,
};

const ROOF: [u8; 3] = [225, 225, 220];
const TREES: [u8; 3] = [34, 90, 30];
const ROAD: [u8; 3] = [70, 70, 75];

fn week_of_sun() -> Vec<IrradianceSample> {
    let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    (0..168)
        .map(|h| {
            let hour = h % 24;
            let gti = if (7..=17).contains(&hour) { 600.0 } else { 0.0 };
            IrradianceSample {
                timestamp: start + Duration::hours(h as i64),
                global_tilted_irradiance: gti,
                direct_normal_irradiance: gti * 1.2,
                diffuse_radiation: gti * 0.15,
            }
        })
        .collect()
}

/// 600x500 render: two roofs, a road and trees, attribution band at the bottom.
fn neighbourhood() -> RasterImage {
    RasterImage::from_fn(600, 500, |row, col| {
        if row >= 400 {
            // attribution band is light grey and would otherwise pass the threshold
            return [240, 240, 240];
        }
        let roof_a = (50..110).contains(&row) && (80..180).contains(&col);
        let roof_b = (220..300).contains(&row) && (350..420).contains(&col);
        if roof_a || roof_b {
            ROOF
        } else if (180..200).contains(&row) {
            ROAD
        } else {
            TREES
        }
    })
    .unwrap()
}

#[test]
fn week_long_analysis_of_a_neighbourhood() {
    let image = neighbourhood();
    let series = week_of_sun();
    let request = AnalysisRequest {
        image: &image,
        latitude: 40.0,
        zoom_level: 15,
        series: &series,
        panel_efficiency: 0.20,
    };
    let report = analyze(&request).unwrap();

    assert_eq!((report.mask.width(), report.mask.height()), (600, 400));
    assert_eq!(report.structure_pixels, 60 * 100 + 80 * 70);
    assert!(!report.mask.get(399, 0));

    let calibration = calibrate(40.0, 15).unwrap();
    assert_eq!(report.calibration, calibration);
    assert_relative_eq!(
        report.estimate.structure_area_sq_m,
        11_600.0 * calibration.pixel_area_sq_m,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        report.estimate.total_area_sq_m,
        240_000.0 * calibration.pixel_area_sq_m,
        max_relative = 1e-12
    );

    assert_eq!(report.estimate.hourly_potential_kwh.len(), 168);
    assert_eq!(report.estimate.daily_potential_kwh.len(), 7);
    let standalone = aggregate(&series, report.estimate.structure_area_sq_m, 0.20).unwrap();
    assert_eq!(report.estimate.daily_potential_kwh, standalone.daily_potential_kwh);
    assert_relative_eq!(
        report.estimate.estimated_yearly_kwh,
        report.estimate.avg_daily_kwh * 365.0,
        max_relative = 1e-12
    );

    assert_eq!(report.formatted.yearly, adaptive_unit(report.estimate.estimated_yearly_kwh));
    assert_eq!(report.daily_chart().len(), 7);
}

#[test]
fn mask_matches_standalone_detector() {
    let image = neighbourhood();
    let series = week_of_sun();
    let request = AnalysisRequest {
        image: &image,
        latitude: 40.0,
        zoom_level: 15,
        series: &series,
        panel_efficiency: 0.20,
    };
    let report = analyze(&request).unwrap();
    assert_eq!(report.mask, detect(&image).unwrap());
}

#[test]
fn repeated_runs_are_identical() {
    let image = neighbourhood();
    let series = week_of_sun();
    let request = AnalysisRequest {
        image: &image,
        latitude: -33.9,
        zoom_level: 15,
        series: &series,
        panel_efficiency: 0.22,
    };
    let first = analyze(&request).unwrap();
    let second = analyze(&request).unwrap();
    assert_eq!(first.mask, second.mask);
    assert_eq!(first.estimate, second.estimate);
    assert_eq!(first.overlay, second.overlay);
}

#[test]
fn concurrent_requests_do_not_interfere() {
    let image = neighbourhood();
    let series = week_of_sun();

    let results: Vec<_> = std::thread::scope(|scope| {
        [0.0, 30.0, 60.0]
            .iter()
            .map(|&latitude| {
                let image = &image;
                let series = &series;
                scope.spawn(move || {
                    let request = AnalysisRequest {
                        image,
                        latitude,
                        zoom_level: 15,
                        series,
                        panel_efficiency: 0.2,
                    };
                    analyze(&request).unwrap().estimate.structure_area_sq_m
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(results[0] > results[1]);
    assert!(results[1] > results[2]);
}

#[test]
fn invalid_latitude_is_reported() {
    let image = neighbourhood();
    let series = week_of_sun();
    let request = AnalysisRequest {
        image: &image,
        latitude: 91.0,
        zoom_level: 15,
        series: &series,
        panel_efficiency: 0.2,
    };
    assert!(matches!(
        analyze(&request),
        Err(AnalysisError::InvalidLatitude(_))
    ));
}
