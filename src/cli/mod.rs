//! Command-line interface
//!
//! Subcommands for running the monitoring pipeline, inspecting a dataset,
//! and generating synthetic sensor data for trials.

use chrono::Timelike;
use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use rand::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pipeline::SensorPipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "envmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Environmental sensor monitoring pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: label, detect anomalies, train, export
    Run {
        /// Input sensor CSV
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// JSON configuration file; flags override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path for the model artifact
        #[arg(long)]
        artifact: Option<PathBuf>,

        /// Output path for the trend chart PNG
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Output path for the cleaned, labeled CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Unsafe temperature threshold (°C)
        #[arg(long)]
        temp_threshold: Option<f64>,

        /// Unsafe air-quality threshold
        #[arg(long)]
        air_threshold: Option<f64>,

        /// Expected outlier fraction for the anomaly detector
        #[arg(long)]
        contamination: Option<f64>,

        /// Held-out fraction for classifier evaluation
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Seed for the train/test split
        #[arg(long)]
        split_seed: Option<u64>,

        /// Seed for the anomaly detector; pass "none" to seed from entropy
        #[arg(long)]
        anomaly_seed: Option<String>,
    },

    /// Show dataset information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Generate a synthetic sensor CSV for trials
    Generate {
        /// Output CSV path
        #[arg(short, long, default_value = "sensor_data.csv")]
        output: PathBuf,

        /// Number of hourly readings to generate
        #[arg(long, default_value = "720")]
        rows: usize,

        /// Generator seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    data: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    artifact: Option<&PathBuf>,
    plot: Option<&PathBuf>,
    output: Option<&PathBuf>,
    temp_threshold: Option<f64>,
    air_threshold: Option<f64>,
    contamination: Option<f64>,
    test_fraction: Option<f64>,
    split_seed: Option<u64>,
    anomaly_seed: Option<&str>,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(path) = data {
        config.input_path = path.clone();
    }
    if let Some(path) = artifact {
        config.artifact_path = path.clone();
    }
    if let Some(path) = plot {
        config.plot_path = path.clone();
    }
    if let Some(path) = output {
        config.cleaned_path = path.clone();
    }
    if let Some(t) = temp_threshold {
        config.temperature_threshold = t;
    }
    if let Some(a) = air_threshold {
        config.air_quality_threshold = a;
    }
    if let Some(c) = contamination {
        config.contamination = c.clamp(0.0, 0.5);
    }
    if let Some(f) = test_fraction {
        config.test_fraction = f;
    }
    if let Some(s) = split_seed {
        config.split_seed = s;
    }
    if let Some(raw) = anomaly_seed {
        config.anomaly_seed = parse_seed(raw)?;
    }

    section("Run");

    step_run(&format!("Processing {}", config.input_path.display()));
    let start = Instant::now();
    let summary = SensorPipeline::new(config).run()?;
    step_done(&format!(
        "{} rows in {:?}",
        summary.n_rows,
        start.elapsed()
    ));

    println!();
    kv("Filled cells", &summary.cells_filled.to_string());
    kv("Unsafe rows", &summary.n_unsafe.to_string());
    kv("Anomalies", &summary.n_anomalies.to_string());
    kv(
        "Training time",
        &format!("{:.3}s", summary.training_time_secs),
    );

    section("Classification Report (boosted trees)");
    println!();
    println!("{}", summary.report);
    println!();
    println!("  {}", muted("Confusion Matrix"));
    println!("{}", summary.confusion);

    if !summary.feature_importances.is_empty() {
        section("Feature Importances");
        let mut ranked = summary.feature_importances.clone();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (name, value) in ranked {
            println!("  {:<16} {:>6.3}", muted(&name), value);
        }
    }

    section("Artifacts");
    kv("Model", &summary.artifact_path.display().to_string());
    kv("Chart", &summary.plot_path.display().to_string());
    kv("Cleaned CSV", &summary.cleaned_path.display().to_string());
    println!();

    Ok(())
}

fn parse_seed(raw: &str) -> anyhow::Result<Option<u64>> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let seed = raw
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("invalid seed: {raw:?} (expected integer or \"none\")"))?;
    Ok(Some(seed))
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(data_path.clone()))?
        .finish()?;

    kv("File", &data_path.display().to_string());
    kv("Rows", &df.height().to_string());
    kv("Columns", &df.width().to_string());
    println!();

    println!(
        "  {:<20} {:<14} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(52)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<14} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

// ─── Synthetic data ────────────────────────────────────────────────────────────

/// Box-Muller draw from N(mean, std_dev)
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.gen::<f64>().max(1e-15);
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + std_dev * z
}

pub fn cmd_generate(output: &PathBuf, rows: usize, seed: u64) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let mut timestamps = Vec::with_capacity(rows);
    let mut temperature: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut humidity: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut light_level: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut air_quality: Vec<Option<f64>> = Vec::with_capacity(rows);

    for i in 0..rows {
        let ts = start + chrono::Duration::hours(i as i64);
        let hour = ts.hour() as f64;
        let diurnal = (std::f64::consts::TAU * (hour - 9.0) / 24.0).sin();

        let mut temp = 23.0 + 8.0 * diurnal + gauss(&mut rng, 0.0, 0.7);
        if rng.gen::<f64>() < 0.04 {
            temp += rng.gen_range(10.0..18.0);
        }

        let hum = (58.0 - 12.0 * diurnal + gauss(&mut rng, 0.0, 2.0)).clamp(5.0, 100.0);

        let light = if (6.0..18.0).contains(&hour) {
            (700.0 * (std::f64::consts::PI * (hour - 6.0) / 12.0).sin()
                + gauss(&mut rng, 0.0, 30.0))
            .max(0.0)
        } else {
            rng.gen_range(0.0..5.0)
        };

        let mut air = 260.0 + 90.0 * (std::f64::consts::TAU * (hour - 8.0) / 24.0).sin()
            + gauss(&mut rng, 0.0, 25.0);
        if rng.gen::<f64>() < 0.05 {
            air += rng.gen_range(300.0..500.0);
        }
        air = air.max(0.0);

        timestamps.push(ts.format("%Y-%m-%d %H:%M:%S").to_string());
        temperature.push((rng.gen::<f64>() >= 0.02).then_some(round1(temp)));
        humidity.push((rng.gen::<f64>() >= 0.03).then_some(round1(hum)));
        light_level.push((rng.gen::<f64>() >= 0.02).then_some(round1(light)));
        air_quality.push((rng.gen::<f64>() >= 0.02).then_some(round1(air)));
    }

    let mut df = DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("temperature".into(), &temperature),
        Column::new("humidity".into(), &humidity),
        Column::new("light_level".into(), &light_level),
        Column::new("air_quality".into(), &air_quality),
    ])?;

    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file).finish(&mut df)?;

    println!(
        "  {} wrote {} hourly readings to {}",
        ok("✓"),
        rows,
        output.display()
    );
    Ok(())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
