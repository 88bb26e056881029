//! Image classifier relay service
//!
//! Relays scanned-image classification results to a real-time broadcast
//! channel: raw payloads posted by the classification pipeline are forwarded
//! verbatim, dashboards negotiate their own channel credentials, and the
//! classifications table can be snapshotted onto the channel on demand.

pub mod api;
pub mod config;
