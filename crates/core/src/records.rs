//! Persisted record shapes and the inbound telemetry shape
//!
//! Field names follow the stored (PascalCase) layout of the backing tables;
//! the structs here only rename, they never transform. Row identity
//! (partition/row key, timestamp, etag) is owned by the table store and
//! carried opaquely.

use serde::{Deserialize, Serialize};

/// Row identity assigned by the table store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIdentity {
    /// Partition key
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,

    /// Row key (the device identifier for environment readings)
    #[serde(rename = "RowKey")]
    pub row_key: String,

    /// Server-assigned timestamp, absent on rows built locally
    #[serde(rename = "Timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Etag for optimistic concurrency, absent on rows built locally
    #[serde(rename = "odata.etag", skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl RowIdentity {
    /// Identity for a row built locally (no timestamp or etag yet)
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            timestamp: None,
            etag: None,
        }
    }
}

/// One device's latest environment reading, as stored in the device-state table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Row identity (row key equals the device identifier)
    #[serde(flatten)]
    pub identity: RowIdentity,

    /// Device identifier
    #[serde(rename = "DeviceId")]
    pub device_id: String,

    /// Temperature in Celsius
    #[serde(rename = "Celsius")]
    pub celsius: f64,

    /// Relative humidity in percent
    #[serde(rename = "Humidity", skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// Barometric pressure in hectopascals
    #[serde(rename = "hPa", skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    /// Monotonically assigned update count for the device
    #[serde(rename = "Count")]
    pub count: i64,
}

/// One classification result, as stored in the classifications table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Row identity
    #[serde(flatten)]
    pub identity: RowIdentity,

    /// Monotonically assigned sequence count
    #[serde(rename = "Count")]
    pub count: i64,

    /// Predicted label
    #[serde(rename = "Tag")]
    pub tag: String,

    /// Prediction probability
    #[serde(rename = "Probability")]
    pub probability: f64,
}

/// Per-device linear calibration coefficients
///
/// Any coefficient pair may be absent; an absent pair leaves the
/// corresponding measurement uncalibrated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    #[serde(rename = "TemperatureSlope", skip_serializing_if = "Option::is_none")]
    pub temperature_slope: Option<f64>,

    #[serde(rename = "TemperatureYIntercept", skip_serializing_if = "Option::is_none")]
    pub temperature_y_intercept: Option<f64>,

    #[serde(rename = "HumiditySlope", skip_serializing_if = "Option::is_none")]
    pub humidity_slope: Option<f64>,

    #[serde(rename = "HumidityYIntercept", skip_serializing_if = "Option::is_none")]
    pub humidity_y_intercept: Option<f64>,

    #[serde(rename = "PressureSlope", skip_serializing_if = "Option::is_none")]
    pub pressure_slope: Option<f64>,

    #[serde(rename = "PressureYIntercept", skip_serializing_if = "Option::is_none")]
    pub pressure_y_intercept: Option<f64>,
}

/// Inbound telemetry as posted by devices
///
/// Devices disagree on key casing, so every field accepts the aliases seen
/// in the field: `deviceId`/`DeviceId`, `temperature`/`Temperature`/`Celsius`,
/// `pressure`/`Pressure`/`hPa`/`HPa`, and so on.
#[derive(Debug, Clone, Deserialize)]
pub struct Telemetry {
    /// Device identifier
    #[serde(rename = "deviceId", alias = "DeviceId")]
    pub device_id: String,

    /// Temperature in Celsius; a reading without one is skipped at ingest
    #[serde(rename = "temperature", alias = "Temperature", alias = "Celsius", default)]
    pub celsius: Option<f64>,

    /// Relative humidity in percent
    #[serde(rename = "humidity", alias = "Humidity", default)]
    pub humidity: Option<f64>,

    /// Barometric pressure in hectopascals
    #[serde(
        rename = "pressure",
        alias = "Pressure",
        alias = "hPa",
        alias = "HPa",
        default
    )]
    pub pressure: Option<f64>,

    /// Originating message identifier, if the device sends one
    #[serde(rename = "messageId", alias = "Id", default)]
    pub message_id: Option<String>,
}
