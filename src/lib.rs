//! Marketgate - Multi-venue cryptocurrency market-data ingestion gateway.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── domain/      # Regions, exchanges, normalized records, envelopes
//! ├── config/      # Settings + per-region market files
//! ├── venue/       # (region, exchange, transport) -> descriptor registry
//! ├── subscribe/   # Wire-exact per-venue subscribe frames
//! ├── bus/         # Kafka producer + deterministic partitioners
//! ├── stream/      # Session, pipeline, retry supervisor, orchestrator
//! └── rest/        # Consolidated poller + socket-fallback loop
//! ```
//!
//! Data flows `stream::session -> stream::pipeline -> bus` per venue;
//! the REST path in `rest/` publishes one consolidated record per
//! region per second and stands in for a venue whose socket is being
//! repaired.

pub mod bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod rest;
pub mod stream;
pub mod subscribe;
pub mod venue;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
