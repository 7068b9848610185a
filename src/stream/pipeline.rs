//! Preprocessing pipeline: filter, project, batch, flush.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::bus::BusSink;
use crate::domain::{ExchangeId, QueueEntry, Region, SocketLowData, StreamKind};
use crate::error::{Error, Result};

/// A flushed envelope carries exactly this many raw messages.
pub const BATCH_THRESHOLD: usize = 100;

/// In-process queue bound. The wire can outrun the bus during broker
/// hiccups; beyond this the oldest entries are dropped and counted.
pub const QUEUE_BOUND: usize = 10_000;

/// Container keys whose nested payload gets promoted during ticker
/// field projection.
const CONTAINER_KEYS: [&str; 5] = ["data", "result", "time_ms", "ts", "timestamp"];

/// Classification of one raw exchange message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawClass {
    /// Subscription ack / heartbeat noise. Never buffered.
    ControlFrame,
    OrderbookSnapshot,
    OrderbookUpdate,
    Ticker,
    Unknown,
}

fn has_entry(message: &Value, key: &str, expected: &str) -> bool {
    message.get(key).and_then(Value::as_str) == Some(expected)
}

/// Explicit classifier over raw venue JSON.
#[must_use]
pub fn classify(message: &Value) -> RawClass {
    if has_entry(message, "response_type", "SUBSCRIBED")
        || has_entry(message, "channel", "heartbeat")
        || has_entry(message, "method", "subscribe")
        || has_entry(message, "event", "korbit:subscribe")
    {
        return RawClass::ControlFrame;
    }
    match message.get("type").and_then(Value::as_str) {
        Some("snapshot") => RawClass::OrderbookSnapshot,
        Some("update") => RawClass::OrderbookUpdate,
        Some("ticker") => RawClass::Ticker,
        _ => RawClass::Unknown,
    }
}

/// Promote the whitelisted keys of a nested container. Arrays
/// contribute their first element.
fn project_container(value: &Value, columns: &[String], out: &mut Map<String, Value>) {
    let target = match value {
        Value::Array(items) => match items.first() {
            Some(first) => first,
            None => return,
        },
        other => other,
    };
    if let Value::Object(fields) = target {
        for (key, field) in fields {
            if columns.iter().any(|c| c == key) {
                out.insert(key.clone(), field.clone());
            }
        }
    }
}

/// Ticker field projection (§ preprocessing): retain whitelisted
/// top-level scalars, keep numeric container keys as-is, and promote
/// whitelisted keys out of object/array containers.
#[must_use]
pub fn project_fields(message: &Value, columns: &[String]) -> Value {
    let Value::Object(fields) = message else {
        return message.clone();
    };

    let mut out = Map::new();
    for (key, value) in fields {
        if !CONTAINER_KEYS.contains(&key.as_str()) {
            if columns.iter().any(|c| c == key) {
                out.insert(key.clone(), value.clone());
            }
            continue;
        }
        match value {
            Value::Number(_) => {
                out.insert(key.clone(), value.clone());
            }
            Value::Object(_) | Value::Array(_) => project_container(value, columns, &mut out),
            _ => {}
        }
    }
    Value::Object(out)
}

/// Unwrap `{arg, data}` envelopes (okx/bybit style) to the inner
/// payload; arrays unwrap to their first element.
fn unwrap_envelope(message: Value) -> Value {
    let is_wrapped = message.get("arg").is_some() && message.get("data").is_some();
    if !is_wrapped {
        return message;
    }
    match message.get("data") {
        Some(Value::Array(items)) => items.first().cloned().unwrap_or_else(|| json!({})),
        Some(inner) => inner.clone(),
        None => message,
    }
}

/// Per-session preprocessing pipeline. Owns the bounded message queue
/// and the per-exchange batch buffers; emits to the bus on flush.
pub struct Pipeline {
    region: Region,
    exchange: ExchangeId,
    kind: StreamKind,
    symbol: String,
    ticker_columns: Vec<String>,
    topic: String,
    error_topic: String,
    key: String,
    bus: Arc<dyn BusSink>,
    queue: VecDeque<QueueEntry>,
    overflow_dropped: u64,
    buffers: HashMap<String, Vec<Value>>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        region: Region,
        exchange: ExchangeId,
        kind: StreamKind,
        symbol: &str,
        ticker_columns: Vec<String>,
        topic_root: &str,
        error_topic: &str,
        bus: Arc<dyn BusSink>,
    ) -> Self {
        Self {
            region,
            exchange,
            kind,
            symbol: symbol.to_owned(),
            ticker_columns,
            topic: format!("{}-{}", topic_root, kind.as_str()),
            error_topic: error_topic.to_owned(),
            key: exchange.partition_key(kind, symbol),
            bus,
            queue: VecDeque::new(),
            overflow_dropped: 0,
            buffers: HashMap::new(),
        }
    }

    /// Parse one wire frame and append it to the queue. Control frames
    /// are dropped here; ticker frames pass through the field
    /// projection first.
    pub fn enqueue(&mut self, raw: &str) -> Result<()> {
        let message: Value = serde_json::from_str(raw).map_err(Error::Json)?;

        let processed = match self.kind {
            StreamKind::Ticker => {
                let message = unwrap_envelope(message);
                if classify(&message) == RawClass::ControlFrame {
                    debug!(exchange = %self.exchange, "dropping control frame");
                    return Ok(());
                }
                project_fields(&message, &self.ticker_columns)
            }
            StreamKind::Orderbook => message,
        };

        if self.queue.len() >= QUEUE_BOUND {
            self.queue.pop_front();
            self.overflow_dropped += 1;
            warn!(
                exchange = %self.exchange,
                dropped = self.overflow_dropped,
                "queue overflow, dropped oldest entry"
            );
        }
        self.queue.push_back(QueueEntry {
            market: self.exchange.as_str().to_owned(),
            symbol: self.symbol.clone(),
            message: processed,
        });
        Ok(())
    }

    /// Dequeue one entry, classify it, batch it, and flush a full
    /// buffer to the bus.
    pub async fn drain_once(&mut self) -> Result<()> {
        let Some(entry) = self.queue.pop_front() else {
            return Ok(());
        };

        // Projection can strip a frame down to nothing; an empty object
        // carries no information worth batching.
        if entry.message.as_object().is_some_and(Map::is_empty) {
            return Ok(());
        }

        match classify(&entry.message) {
            RawClass::ControlFrame => return Ok(()),
            RawClass::OrderbookSnapshot => {
                debug!(exchange = %self.exchange, "buffering orderbook snapshot")
            }
            RawClass::OrderbookUpdate | RawClass::Ticker | RawClass::Unknown => {}
        }

        let buffer = self.buffers.entry(entry.market.clone()).or_default();
        buffer.push(entry.message);

        if buffer.len() >= BATCH_THRESHOLD {
            let batch = std::mem::take(buffer);
            self.flush(&entry.market, batch).await?;
        }
        Ok(())
    }

    async fn flush(&self, market: &str, batch: Vec<Value>) -> Result<()> {
        info!(
            topic = %self.topic,
            key = %self.key,
            len = batch.len(),
            "flushing batch"
        );
        let envelope = SocketLowData::new(self.region, market, &self.symbol, batch);
        self.bus
            .publish(&self.topic, &self.key, serde_json::to_value(envelope)?)
            .await
    }

    /// Publish a processing failure to the error topic as a
    /// single-element envelope.
    pub async fn send_error(&self, error: &Error) {
        let envelope = SocketLowData::new(
            self.region,
            self.exchange.as_str(),
            &self.symbol,
            vec![json!({"error": error.to_string()})],
        );
        let key = self.exchange.error_key(&self.symbol);
        let payload = match serde_json::to_value(envelope) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to encode error envelope");
                return;
            }
        };
        if let Err(err) = self.bus.publish(&self.error_topic, &key, payload).await {
            warn!(error = %err, "failed to publish error envelope");
        }
    }

    /// Entries currently waiting in the queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Raw messages currently buffered for `market`.
    #[must_use]
    pub fn buffered(&self, market: &str) -> usize {
        self.buffers.get(market).map_or(0, Vec::len)
    }

    /// Entries dropped to the overflow policy since startup.
    #[must_use]
    pub fn overflow_dropped(&self) -> u64 {
        self.overflow_dropped
    }
}
