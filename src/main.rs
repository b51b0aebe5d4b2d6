use anyhow::{Context, Result};
use clap::Parser;
use rooftop_solar::pipeline::AnalysisReport;
use rooftop_solar::raster_io::RasterIO;
use rooftop_solar::{analyze_with, AnalysisRequest, Config, DetectorParams};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rooftop-solar", about = "Estimate rooftop solar potential for a site")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,

    #[arg(long)]
    zoom: Option<u32>,

    #[arg(long)]
    efficiency: Option<f64>,

    #[arg(long)]
    output_dir: Option<String>,

    /// Print the summary without writing any files
    #[arg(long)]
    no_export: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "rooftop_solar=debug"
    } else {
        "rooftop_solar=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(latitude) = args.latitude {
        config.latitude = latitude;
    }
    if let Some(zoom) = args.zoom {
        config.zoom_level = zoom;
    }
    if let Some(efficiency) = args.efficiency {
        config.panel_efficiency = efficiency;
    }
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir.clone();
    }
    config.validate().context("Invalid configuration")?;

    let cpu_cores = config.get_cpu_cores();
    info!(cpu_cores, "Setting up Rayon thread pool");
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cpu_cores)
        .build_global()
    {
        warn!(error = %e, "Failed to configure Rayon thread pool, using default");
    }

    let image = RasterIO::read_image(Path::new(&config.image_path))
        .with_context(|| format!("Failed to load image {}", config.image_path))?;
    let series = RasterIO::read_irradiance(Path::new(&config.irradiance_path))
        .with_context(|| format!("Failed to load irradiance {}", config.irradiance_path))?;
    info!(
        width = image.width(),
        height = image.height(),
        samples = series.len(),
        latitude = config.latitude,
        longitude = config.longitude,
        "Inputs loaded"
    );

    let request = AnalysisRequest {
        image: &image,
        latitude: config.latitude,
        zoom_level: config.zoom_level,
        series: &series,
        panel_efficiency: config.panel_efficiency,
    };
    let params = DetectorParams::with_crop_rows(config.crop_rows);
    let report = analyze_with(&request, &params).context("Analysis failed")?;

    println!("{}", report.summary_text());

    if !args.no_export {
        let dir = export(&config, &report)?;
        println!("\nResults exported to: {}", dir.display());
    }

    Ok(())
}

fn export(config: &Config, report: &AnalysisReport) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let dir = config.output_dir().join(format!("analysis_{}", timestamp));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    info!(dir = %dir.display(), "Exporting results");

    RasterIO::write_image(&dir.join("structure_overlay.png"), &report.overlay)
        .context("Failed to write overlay")?;
    RasterIO::write_mask(&dir.join("structure_mask.png"), &report.mask)
        .context("Failed to write mask")?;
    RasterIO::write_hourly_csv(
        &dir.join("hourly_potential.csv"),
        &report.series,
        &report.estimate.hourly_potential_kwh,
    )
    .context("Failed to write hourly CSV")?;
    RasterIO::write_daily_csv(&dir.join("daily_potential.csv"), &report.daily_chart())
        .context("Failed to write daily CSV")?;
    RasterIO::write_report_json(&dir.join("report.json"), &report.summary())
        .context("Failed to write report")?;

    Ok(dir)
}
