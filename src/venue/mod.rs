//! Venue descriptor registry.
//!
//! A [`Venue`] pins down everything a session needs about one
//! `(region, exchange, transport)` triple: the endpoint URL, the ticker
//! whitelist for socket venues, and the REST parameter list for REST
//! venues. The registry is built once at startup from the settings file
//! and the per-region market files and never mutated afterwards.

mod registry;

pub use registry::{Venue, VenueRegistry};
