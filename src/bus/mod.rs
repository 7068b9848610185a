//! Message bus: deterministic partitioning and the Kafka producer.
//!
//! Two partitioning modes exist. Streaming feeds pin each
//! `(exchange, data-type)` pair to a fixed partition so per-key ordering
//! holds end to end; the consolidated REST feed hashes its key the way
//! Kafka's default partitioner does.

mod partitioner;
mod producer;

pub use partitioner::{hashed_partition, pinned_partition, PartitionMode};
pub use producer::{BusSink, KafkaBus};
