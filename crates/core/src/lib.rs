//! Core abstractions for the Relaycast relay services
//!
//! This crate is transport-free: it defines the persisted record shapes, the
//! client traits for the two external collaborators (the broadcast channel
//! service and the table store), the calibration/validation rules applied to
//! inbound telemetry, and the shared error type. The service binaries and the
//! client crates depend on this crate; nothing here depends on HTTP.

pub mod auth;
pub mod calibrate;
pub mod channel;
pub mod error;
pub mod records;
pub mod table;

// Re-export main types
pub use channel::{BroadcastChannel, ConnectionDescriptor, NEW_MESSAGE};
pub use error::{Error, Result};
pub use table::{Continuation, EntitySegment, TableStore};
