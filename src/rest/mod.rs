//! REST polling path: consolidated per-region snapshots and the
//! fallback loop that covers a venue while its socket is unhealthy.

mod client;
mod poller;

pub use client::RestClient;
pub use poller::RestPoller;
