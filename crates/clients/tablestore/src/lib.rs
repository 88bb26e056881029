//! REST client for the managed table store
//!
//! The table store is a schema-light row store addressed per table, with
//! segmented scans (one page per request, continuation carried in response
//! headers) and etag-guarded merges for optimistic concurrency. Requests are
//! authorized with a shared-access query-string credential appended to every
//! URL. Entities cross the API as raw JSON objects; this crate does not
//! interpret them.
//!
//! # Usage
//!
//! ```ignore
//! use relaycast_core::TableStore;
//! use relaycast_tablestore::TableServiceClient;
//!
//! let client = TableServiceClient::new(
//!     "https://tables.example.net",
//!     "sv=2024&sig=…",
//! )?;
//!
//! let segment = client.query_segment("DeviceState", None).await?;
//! ```

pub mod client;
pub mod error;

// Re-export main types
pub use client::TableServiceClient;
pub use error::TableError;
