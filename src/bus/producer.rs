//! Batched, idempotent Kafka producer with a per-topic retry buffer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::bus::{hashed_partition, pinned_partition, PartitionMode};
use crate::config::KafkaConfig;
use crate::error::Result;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);
const METADATA_TIMEOUT: Duration = Duration::from_secs(1);
/// How many buffered envelopes one successful publish may drain.
const DRAIN_CAP: usize = 5;

/// Seam between the pipeline/poller and the concrete bus so tests can
/// capture publishes without a broker.
#[async_trait]
pub trait BusSink: Send + Sync {
    /// Publish one framed record. Delivery is at-least-once; an
    /// undeliverable record is buffered, never lost silently.
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<()>;
}

struct PendingRecord {
    key: String,
    bytes: Vec<u8>,
    partition: i32,
}

struct BusState {
    producer: Option<FutureProducer>,
    retry_buffer: HashMap<String, VecDeque<PendingRecord>>,
    partitions: HashMap<String, Vec<i32>>,
}

/// Region-scoped Kafka producer handle, shared by every task of the
/// region. The underlying producer is created lazily on first publish
/// and kept alive until [`KafkaBus::shutdown`].
pub struct KafkaBus {
    config: KafkaConfig,
    mode: PartitionMode,
    /// All partition indexes provisioned for this bus's topics.
    all_partitions: Vec<i32>,
    state: Arc<Mutex<BusState>>,
}

impl KafkaBus {
    #[must_use]
    pub fn new(config: KafkaConfig, mode: PartitionMode, partition_count: usize) -> Self {
        Self {
            config,
            mode,
            all_partitions: (0..partition_count as i32).collect(),
            state: Arc::new(Mutex::new(BusState {
                producer: None,
                retry_buffer: HashMap::new(),
                partitions: HashMap::new(),
            })),
        }
    }

    fn create_producer(&self) -> std::result::Result<FutureProducer, KafkaError> {
        ClientConfig::new()
            .set("bootstrap.servers", &self.config.bootstrap_servers)
            .set(
                "security.protocol",
                self.config.security_protocol.to_ascii_lowercase(),
            )
            .set("batch.size", self.config.max_batch_size.to_string())
            .set("message.max.bytes", self.config.max_request_size.to_string())
            .set("acks", &self.config.acks)
            .set("enable.idempotence", "true")
            .set("retry.backoff.ms", "100")
            .create()
    }

    /// Producer handle, created on demand. A failed start is reported to
    /// the caller so the record can be buffered and retried next call.
    fn producer(&self) -> std::result::Result<FutureProducer, KafkaError> {
        let mut state = self.state.lock();
        if let Some(producer) = &state.producer {
            return Ok(producer.clone());
        }
        let producer = self.create_producer()?;
        state.producer = Some(producer.clone());
        Ok(producer)
    }

    /// Partitions the brokers report for `topic`, cached after the first
    /// lookup. Metadata failures fall back to the configured range so a
    /// flapping broker cannot stall the pipeline.
    fn available_partitions(&self, producer: &FutureProducer, topic: &str) -> Vec<i32> {
        if let Some(cached) = self.state.lock().partitions.get(topic) {
            return cached.clone();
        }

        let fetched = producer
            .client()
            .fetch_metadata(Some(topic), METADATA_TIMEOUT)
            .ok()
            .and_then(|metadata| {
                metadata
                    .topics()
                    .iter()
                    .find(|t| t.name() == topic)
                    .map(|t| t.partitions().iter().map(|p| p.id()).collect::<Vec<i32>>())
            })
            .filter(|partitions| !partitions.is_empty())
            .unwrap_or_else(|| self.all_partitions.clone());

        self.state
            .lock()
            .partitions
            .insert(topic.to_owned(), fetched.clone());
        fetched
    }

    fn partition_for(&self, key: &str, available: &[i32]) -> i32 {
        match self.mode {
            PartitionMode::Pinned => pinned_partition(key, &self.all_partitions, available),
            PartitionMode::Hashed => hashed_partition(key, &self.all_partitions),
        }
    }

    async fn send(
        &self,
        producer: &FutureProducer,
        topic: &str,
        key: &str,
        bytes: &[u8],
        partition: i32,
    ) -> std::result::Result<(), KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(bytes)
            .partition(partition);

        producer
            .send(record, SEND_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|(err, _message)| err)
    }

    fn buffer(&self, topic: &str, record: PendingRecord) {
        let mut state = self.state.lock();
        state
            .retry_buffer
            .entry(topic.to_owned())
            .or_default()
            .push_back(record);
    }

    fn take_buffered(&self, topic: &str, max: usize) -> Vec<PendingRecord> {
        let mut state = self.state.lock();
        let Some(queue) = state.retry_buffer.get_mut(topic) else {
            return Vec::new();
        };
        let take = queue.len().min(max);
        queue.drain(..take).collect()
    }

    /// Re-send previously buffered records for `topic`, oldest first.
    /// A record that fails again goes back to the buffer.
    async fn drain_buffered(&self, producer: &FutureProducer, topic: &str, available: &[i32]) {
        for record in self.take_buffered(topic, DRAIN_CAP) {
            match self
                .send(producer, topic, &record.key, &record.bytes, record.partition)
                .await
            {
                Ok(()) => {
                    info!(topic, key = %record.key, "redelivered buffered record");
                }
                Err(err) => {
                    warn!(topic, error = %err, "redelivery failed, keeping record buffered");
                    let partition = self.partition_for(&record.key, available);
                    self.buffer(topic, PendingRecord { partition, ..record });
                }
            }
        }
    }

    /// Flush in-flight records and drop the producer. Buffered records
    /// are retained for a later restart.
    pub fn shutdown(&self) {
        let producer = self.state.lock().producer.take();
        if let Some(producer) = producer {
            if let Err(err) = producer.flush(SEND_TIMEOUT) {
                error!(error = %err, "failed to flush producer on shutdown");
            }
        }
    }

    /// Records still waiting for redelivery, by topic.
    #[must_use]
    pub fn buffered_len(&self, topic: &str) -> usize {
        self.state
            .lock()
            .retry_buffer
            .get(topic)
            .map_or(0, VecDeque::len)
    }
}

/// Broker-class failures get buffered and retried; anything else is
/// buffered too but flagged as unexpected.
fn is_broker_error(err: &KafkaError) -> bool {
    matches!(
        err.rdkafka_error_code(),
        Some(
            RDKafkaErrorCode::BrokerTransportFailure
                | RDKafkaErrorCode::AllBrokersDown
                | RDKafkaErrorCode::BrokerNotAvailable
                | RDKafkaErrorCode::NetworkException
                | RDKafkaErrorCode::OperationTimedOut
                | RDKafkaErrorCode::MessageTimedOut
        )
    )
}

#[async_trait]
impl BusSink for KafkaBus {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<()> {
        let bytes = serde_json::to_vec(&payload)?;
        info!(topic, size_bytes = bytes.len(), "publishing record");

        let producer = match self.producer() {
            Ok(producer) => producer,
            Err(err) => {
                error!(topic, error = %err, "producer start failed, buffering record");
                let partition = self.partition_for(key, &self.all_partitions);
                self.buffer(
                    topic,
                    PendingRecord {
                        key: key.to_owned(),
                        bytes,
                        partition,
                    },
                );
                return Ok(());
            }
        };

        let available = self.available_partitions(&producer, topic);
        let partition = self.partition_for(key, &available);

        match self.send(&producer, topic, key, &bytes, partition).await {
            Ok(()) => {
                self.drain_buffered(&producer, topic, &available).await;
                Ok(())
            }
            Err(err) => {
                if is_broker_error(&err) {
                    error!(topic, error = %err, "broker error, buffering record");
                } else {
                    error!(topic, error = %err, "unexpected produce error, buffering record");
                }
                self.buffer(
                    topic,
                    PendingRecord {
                        key: key.to_owned(),
                        bytes,
                        partition,
                    },
                );
                Ok(())
            }
        }
    }
}
