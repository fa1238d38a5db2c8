//! Environmental trend chart

use crate::data::{AIR_QUALITY, TEMPERATURE, TIMESTAMP};
use crate::error::{EnvmonError, Result};
use chrono::{DateTime, NaiveDateTime};
use plotters::prelude::*;
use polars::prelude::*;
use std::path::Path;

/// Renderer for the temperature / air-quality trend chart.
///
/// Draws both series over time with dashed horizontal reference lines at the
/// safety thresholds, a legend, and rotated timestamp labels, to a PNG file.
pub struct TrendPlot {
    width: u32,
    height: u32,
    temperature_threshold: f64,
    air_quality_threshold: f64,
}

impl TrendPlot {
    /// Create a renderer with the given threshold reference lines
    pub fn new(temperature_threshold: f64, air_quality_threshold: f64) -> Self {
        Self {
            width: 1200,
            height: 600,
            temperature_threshold,
            air_quality_threshold,
        }
    }

    /// Set the output raster size in pixels
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Render the chart for the given table to a PNG file
    pub fn render(&self, df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let times = self.timestamps(df)?;
        let temperature = self.values(df, TEMPERATURE)?;
        let air_quality = self.values(df, AIR_QUALITY)?;

        if times.is_empty() {
            return Err(EnvmonError::PlotError("no rows to plot".to_string()));
        }

        let mut t_min = *times.first().unwrap();
        let mut t_max = *times.last().unwrap();
        for t in &times {
            if *t < t_min {
                t_min = *t;
            }
            if *t > t_max {
                t_max = *t;
            }
        }
        if t_min == t_max {
            t_max += chrono::Duration::hours(1);
        }

        let mut y_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        for v in temperature
            .iter()
            .chain(air_quality.iter())
            .chain([self.temperature_threshold, self.air_quality_threshold].iter())
        {
            y_max = y_max.max(*v);
            y_min = y_min.min(*v);
        }
        let pad = (y_max - y_min).abs().max(1.0) * 0.05;
        let y_range = (y_min - pad)..(y_max + pad);

        let path = path.as_ref();
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Environmental Trends Over Time", ("sans-serif", 28))
            .margin(16)
            .x_label_area_size(70)
            .y_label_area_size(55)
            .build_cartesian_2d(t_min..t_max, y_range)
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("timestamp")
            .x_labels(10)
            .x_label_formatter(&|dt| dt.format("%m-%d %H:%M").to_string())
            .x_label_style(
                ("sans-serif", 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .draw()
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?;

        let temp_points: Vec<(NaiveDateTime, f64)> =
            times.iter().cloned().zip(temperature).collect();
        chart
            .draw_series(LineSeries::new(temp_points, RED.stroke_width(2)))
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?
            .label("Temperature")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        let air_points: Vec<(NaiveDateTime, f64)> =
            times.iter().cloned().zip(air_quality).collect();
        chart
            .draw_series(LineSeries::new(air_points, BLUE.stroke_width(2)))
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?
            .label("Air Quality")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        let temp_line = vec![
            (t_min, self.temperature_threshold),
            (t_max, self.temperature_threshold),
        ];
        chart
            .draw_series(DashedLineSeries::new(
                temp_line,
                8,
                5,
                RED.mix(0.6).stroke_width(1),
            ))
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?
            .label("Temp Threshold")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.6).stroke_width(1))
            });

        let air_line = vec![
            (t_min, self.air_quality_threshold),
            (t_max, self.air_quality_threshold),
        ];
        let orange = RGBColor(255, 140, 0);
        chart
            .draw_series(DashedLineSeries::new(air_line, 8, 5, orange.stroke_width(1)))
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?
            .label("Air Quality Threshold")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], orange.stroke_width(1))
            });

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .draw()
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?;

        root.present()
            .map_err(|e| EnvmonError::PlotError(e.to_string()))?;
        Ok(())
    }

    fn timestamps(&self, df: &DataFrame) -> Result<Vec<NaiveDateTime>> {
        let millis = df
            .column(TIMESTAMP)
            .map_err(|_| EnvmonError::MissingColumn(TIMESTAMP.to_string()))?
            .cast(&DataType::Int64)
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;

        millis
            .i64()
            .map_err(|e| EnvmonError::DataError(e.to_string()))?
            .into_iter()
            .map(|opt| {
                let ms = opt.ok_or_else(|| {
                    EnvmonError::TimestampError("null timestamp in plot data".to_string())
                })?;
                DateTime::from_timestamp_millis(ms)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| {
                        EnvmonError::TimestampError(format!("out-of-range timestamp: {ms}"))
                    })
            })
            .collect()
    }

    fn values(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let series = df
            .column(column)
            .map_err(|_| EnvmonError::MissingColumn(column.to_string()))?
            .cast(&DataType::Float64)
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;

        Ok(series
            .f64()
            .map_err(|e| EnvmonError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}
