//! Streaming ingestion: session, preprocessing pipeline, retry
//! supervision and the per-region orchestrator.
//!
//! Data flows `session -> pipeline -> bus`; control flows
//! `session <-> supervisor` on faults, with the REST poller standing in
//! while a socket is declared unhealthy.

mod orchestrator;
mod pipeline;
mod session;
mod supervisor;

pub use orchestrator::{run_region, run_region_rest, RegionContext};
pub use pipeline::{classify, project_fields, Pipeline, RawClass, BATCH_THRESHOLD, QUEUE_BOUND};
pub use session::{run_session, SessionConfig, SessionProbe};
pub use supervisor::{run_supervised, RetryPolicy};
