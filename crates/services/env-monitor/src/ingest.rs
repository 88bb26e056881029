//! Telemetry ingestion into the device-state table
//!
//! Each inbound reading is calibrated, validated, and merged into the
//! device's state row. Rows are contended with other writers, so merges are
//! etag-guarded and retried from a fresh read on conflict. A failing reading
//! never fails its batch; it is logged and counted as skipped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use relaycast_core::calibrate;
use relaycast_core::error::{Error, Result};
use relaycast_core::records::{CalibrationRow, EnvironmentReading, RowIdentity, Telemetry};
use relaycast_core::table::{entity_etag, TableStore};

/// Upper bound on merge attempts per reading before giving up
const MAX_MERGE_ATTEMPTS: usize = 10;

/// Batch ingestion outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Readings merged into the device-state table
    pub accepted: usize,

    /// Readings dropped (no temperature, failed validation, or gave up)
    pub skipped: usize,
}

/// Ingests telemetry batches into the device-state table
pub struct DeviceStateIngestor {
    store: Arc<dyn TableStore>,
    state_table: String,
    calibration_table: String,
    partition_key: String,

    /// Per-device calibration cache; devices without a calibration row are
    /// cached as `None` so they are only looked up once
    calibrations: Mutex<HashMap<String, Option<CalibrationRow>>>,
}

impl DeviceStateIngestor {
    /// Create an ingestor writing under `partition_key`
    pub fn new(
        store: Arc<dyn TableStore>,
        state_table: String,
        calibration_table: String,
        partition_key: String,
    ) -> Self {
        Self {
            store,
            state_table,
            calibration_table,
            partition_key,
            calibrations: Mutex::new(HashMap::new()),
        }
    }

    /// Ingest a batch of readings, isolating per-reading failures
    pub async fn ingest_batch(&self, readings: &[Telemetry]) -> IngestSummary {
        let mut accepted = 0;
        let mut skipped = 0;

        for telemetry in readings {
            match self.ingest_one(telemetry).await {
                Ok(true) => accepted += 1,
                Ok(false) => {
                    tracing::debug!(device = %telemetry.device_id, "reading failed validation");
                    skipped += 1;
                }
                Err(error) => {
                    tracing::warn!(device = %telemetry.device_id, %error, "reading dropped");
                    skipped += 1;
                }
            }
        }

        IngestSummary { accepted, skipped }
    }

    /// Merge one reading; `Ok(false)` means it was skipped by validation
    async fn ingest_one(&self, telemetry: &Telemetry) -> Result<bool> {
        let Some(celsius) = telemetry.celsius else {
            return Ok(false);
        };

        for _ in 0..MAX_MERGE_ATTEMPTS {
            let existing = self
                .store
                .get_entity(&self.state_table, &self.partition_key, &telemetry.device_id)
                .await?;

            let (count, etag) = match &existing {
                Some(entity) => (
                    entity.get("Count").and_then(Value::as_i64).unwrap_or(0),
                    entity_etag(entity).map(str::to_string),
                ),
                None => (0, None),
            };

            let mut reading = EnvironmentReading {
                identity: RowIdentity::new(&self.partition_key, &telemetry.device_id),
                device_id: telemetry.device_id.clone(),
                celsius,
                humidity: telemetry.humidity,
                pressure: telemetry.pressure,
                count: count + 1,
            };

            if let Some(cal) = self.calibration(&telemetry.device_id).await? {
                calibrate::apply(&cal, &mut reading);
            }
            if !calibrate::validate(&reading) {
                return Ok(false);
            }

            let entity = serde_json::to_value(&reading)?;
            let outcome = match &etag {
                Some(etag) => {
                    self.store
                        .merge_entity(
                            &self.state_table,
                            &self.partition_key,
                            &telemetry.device_id,
                            etag,
                            &entity,
                        )
                        .await
                }
                None => self.store.insert_entity(&self.state_table, &entity).await,
            };

            match outcome {
                Ok(()) => return Ok(true),
                // Another writer got there first; re-read and try again
                Err(error) if error.is_conflict() => continue,
                Err(error) => return Err(error),
            }
        }

        Err(Error::Storage(format!(
            "gave up after {MAX_MERGE_ATTEMPTS} merge attempts for device {}",
            telemetry.device_id
        )))
    }

    /// Calibration row for a device, fetched once and cached
    async fn calibration(&self, device_id: &str) -> Result<Option<CalibrationRow>> {
        if let Some(cached) = self
            .calibrations
            .lock()
            .expect("poisoned calibration cache")
            .get(device_id)
        {
            return Ok(cached.clone());
        }

        let fetched = self
            .store
            .get_entity(&self.calibration_table, &self.partition_key, device_id)
            .await?
            .map(serde_json::from_value::<CalibrationRow>)
            .transpose()?;

        self.calibrations
            .lock()
            .expect("poisoned calibration cache")
            .insert(device_id.to_string(), fetched.clone());

        Ok(fetched)
    }
}
