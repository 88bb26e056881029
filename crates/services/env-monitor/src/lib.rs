//! Environment monitor relay service
//!
//! Relays device environment telemetry to a real-time broadcast channel:
//! raw payloads posted by upstream processes are forwarded verbatim,
//! dashboards negotiate their own channel credentials, and the current
//! device-state table can be snapshotted onto the channel on demand. The
//! service also ingests raw telemetry batches, calibrating and validating
//! them before merging into the device-state table.

pub mod api;
pub mod config;
pub mod ingest;
