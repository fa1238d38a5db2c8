//! Trend chart rendering

mod trend;

pub use trend::TrendPlot;
