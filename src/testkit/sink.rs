//! In-memory bus sink for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::bus::BusSink;
use crate::error::Result;

/// One captured publish call.
#[derive(Debug, Clone)]
pub struct PublishedRecord {
    pub topic: String,
    pub key: String,
    pub payload: Value,
}

/// A [`BusSink`] that records every publish instead of talking to a
/// broker. Publish order is preserved.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<PublishedRecord>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, in publish order.
    #[must_use]
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.records.lock().clone()
    }

    /// Records published to one topic, in publish order.
    #[must_use]
    pub fn topic_records(&self, topic: &str) -> Vec<PublishedRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BusSink for RecordingSink {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<()> {
        self.records.lock().push(PublishedRecord {
            topic: topic.to_owned(),
            key: key.to_owned(),
            payload,
        });
        Ok(())
    }
}
