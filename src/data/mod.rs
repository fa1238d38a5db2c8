//! Sensor data handling
//!
//! Loading, imputation, time-feature derivation, and threshold labeling for
//! the sensor reading table.

mod features;
mod imputer;
mod labeler;
mod loader;

pub use features::{derive_time_features, DAY_END_HOUR, DAY_START_HOUR};
pub use imputer::ForwardFillImputer;
pub use labeler::label_unsafe;
pub use loader::{save_csv, SensorLoader};

/// Timestamp column name
pub const TIMESTAMP: &str = "timestamp";
/// Temperature column name (°C)
pub const TEMPERATURE: &str = "temperature";
/// Relative humidity column name (%)
pub const HUMIDITY: &str = "humidity";
/// Ambient light column name (lux)
pub const LIGHT_LEVEL: &str = "light_level";
/// Air-quality index column name
pub const AIR_QUALITY: &str = "air_quality";

/// Derived hour-of-day column name
pub const HOUR: &str = "hour";
/// Derived daytime flag column name
pub const IS_DAY: &str = "is_day";
/// Threshold label column name
pub const UNSAFE: &str = "unsafe";
/// Outlier flag column name
pub const ANOMALY: &str = "anomaly";

/// Sensor value columns present in the input file
pub const SENSOR_COLUMNS: [&str; 4] = [TEMPERATURE, HUMIDITY, LIGHT_LEVEL, AIR_QUALITY];

/// Model input columns, in feature-matrix order
pub const FEATURE_COLUMNS: [&str; 6] = [TEMPERATURE, HUMIDITY, LIGHT_LEVEL, AIR_QUALITY, HOUR, IS_DAY];
