//! Core domain types for marketgate.
//!
//! ## Identity Types
//!
//! - [`Region`] - Ingestion region (`korea`, `asia`, `ne`) with its venue roster
//! - [`ExchangeId`] - The ten supported exchanges
//! - [`StreamKind`] - `ticker` or `orderbook`; picks the subscribe frame and topic suffix
//! - [`Transport`] - `socket` or `rest`
//!
//! ## Normalized Records
//!
//! - [`PriceData`] - Six fixed-point price fields, quantized to 0.1 half-up
//! - [`PriceSnapshot`] - `"<exchange>-<SYMBOL>"` record wrapping [`PriceData`]
//! - [`VenueSlot`] - Consolidated-schema slot: a snapshot, or JSON `false` on fetch failure
//! - [`ConsolidatedSnapshot`] - Per-region REST record published once per cycle
//!
//! ## Publish Envelopes
//!
//! - [`SocketLowData`] - Batch envelope flushed by the preprocessing pipeline
//! - [`QueueEntry`] - One filtered message waiting in the pipeline queue

mod exchange;
mod region;
mod snapshot;

pub use exchange::{ExchangeId, StreamKind, Transport};
pub use region::Region;
pub use snapshot::{
    ConsolidatedSnapshot, PriceData, PriceSnapshot, QueueEntry, SocketLowData, VenueSlot,
};
