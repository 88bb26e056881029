//! Telemetry calibration and range validation
//!
//! Devices report raw sensor values; a per-device calibration row supplies
//! linear coefficients (`value * slope + intercept`) for each measurement.
//! After calibration, readings outside the sensors' operating ranges are
//! rejected so a miscalibrated or failing device cannot poison the
//! device-state table.

use crate::records::{CalibrationRow, EnvironmentReading};

/// Valid temperature range in Celsius
pub const CELSIUS_RANGE: (f64, f64) = (-40.0, 80.0);

/// Valid barometric pressure range in hectopascals
pub const PRESSURE_RANGE: (f64, f64) = (600.0, 1600.0);

/// Valid relative humidity range in percent
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);

/// Apply a device's calibration coefficients to a reading in place
///
/// A measurement whose slope or intercept is absent passes through
/// unchanged, as does an absent measurement.
pub fn apply(cal: &CalibrationRow, reading: &mut EnvironmentReading) {
    reading.celsius = linear(
        reading.celsius,
        cal.temperature_slope,
        cal.temperature_y_intercept,
    );
    reading.humidity = reading
        .humidity
        .map(|v| linear(v, cal.humidity_slope, cal.humidity_y_intercept));
    reading.pressure = reading
        .pressure
        .map(|v| linear(v, cal.pressure_slope, cal.pressure_y_intercept));
}

/// Whether a reading's measurements all fall inside their operating ranges
///
/// Absent measurements pass; only present, out-of-range values fail.
pub fn validate(reading: &EnvironmentReading) -> bool {
    in_range(Some(reading.celsius), CELSIUS_RANGE)
        && in_range(reading.pressure, PRESSURE_RANGE)
        && in_range(reading.humidity, HUMIDITY_RANGE)
}

fn linear(value: f64, slope: Option<f64>, intercept: Option<f64>) -> f64 {
    match (slope, intercept) {
        (Some(slope), Some(intercept)) => value * slope + intercept,
        _ => value,
    }
}

fn in_range(value: Option<f64>, (lo, hi): (f64, f64)) -> bool {
    match value {
        Some(v) => (lo..=hi).contains(&v),
        None => true,
    }
}
