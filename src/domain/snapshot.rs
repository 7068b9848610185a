//! Normalized price records and publish envelopes.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ExchangeId, Region};

/// Quantization step shared by every numeric field: one decimal place,
/// half-up.
fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Pull a decimal out of a vendor JSON field. Venues disagree on whether
/// prices arrive as numbers or strings; missing fields decode to `None`.
fn decimal_field(api: &Value, field: &str) -> Option<Decimal> {
    match api.get(field)? {
        Value::Number(n) => n.to_string().parse().ok().map(quantize),
        Value::String(s) => s.parse().ok().map(quantize),
        _ => None,
    }
}

/// The six normalized price fields. All values are quantized to 0.1 with
/// half-up rounding at construction, so re-normalizing a record is a
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceData {
    pub opening_price: Option<Decimal>,
    pub trade_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub prev_closing_price: Option<Decimal>,
    pub acc_trade_volume_24h: Option<Decimal>,
}

impl PriceData {
    /// Build from a vendor response using the venue's six-entry
    /// parameter list: `[opening, max, min, trade, prev_closing,
    /// acc_volume_24h]` field names in the vendor payload.
    #[must_use]
    pub fn from_api(api: &Value, params: &[String]) -> Self {
        let field = |idx: usize| params.get(idx).and_then(|name| decimal_field(api, name));
        Self {
            opening_price: field(0),
            max_price: field(1),
            min_price: field(2),
            trade_price: field(3),
            prev_closing_price: field(4),
            acc_trade_volume_24h: field(5),
        }
    }

    /// Re-apply quantization to every field. Idempotent over `from_api`
    /// output.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            opening_price: self.opening_price.map(quantize),
            trade_price: self.trade_price.map(quantize),
            max_price: self.max_price.map(quantize),
            min_price: self.min_price.map(quantize),
            prev_closing_price: self.prev_closing_price.map(quantize),
            acc_trade_volume_24h: self.acc_trade_volume_24h.map(quantize),
        }
    }
}

/// One venue's normalized view of a symbol at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// `"<exchange>-<UPPER_SYMBOL>"`, e.g. `"upbit-BTC"`.
    pub market: String,
    pub symbol: String,
    /// Epoch seconds; monotonic within a venue stream.
    pub timestamp: i64,
    pub data: PriceData,
}

impl PriceSnapshot {
    #[must_use]
    pub fn from_api(
        exchange: ExchangeId,
        symbol: &str,
        timestamp: i64,
        api: &Value,
        params: &[String],
    ) -> Self {
        let symbol = symbol.to_uppercase();
        Self {
            market: format!("{}-{}", exchange.as_str(), symbol),
            symbol,
            timestamp,
            data: PriceData::from_api(api, params),
        }
    }
}

/// Consolidated-schema slot for one venue. A venue whose fetch failed
/// serializes as JSON `false` rather than aborting the whole cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VenueSlot {
    Snapshot(PriceSnapshot),
    Unavailable(bool),
}

impl VenueSlot {
    #[must_use]
    pub fn unavailable() -> Self {
        VenueSlot::Unavailable(false)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, VenueSlot::Snapshot(_))
    }
}

/// Per-region REST record published once per polling cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedSnapshot {
    pub timestamp: i64,
    #[serde(flatten)]
    pub venues: BTreeMap<String, VenueSlot>,
}

impl ConsolidatedSnapshot {
    #[must_use]
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            venues: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, exchange: ExchangeId, slot: VenueSlot) {
        self.venues.insert(exchange.as_str().to_owned(), slot);
    }
}

/// Envelope for one flushed batch of raw socket messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketLowData {
    pub region: String,
    pub market: String,
    pub symbol: String,
    pub data: Vec<Value>,
}

impl SocketLowData {
    #[must_use]
    pub fn new(region: Region, market: &str, symbol: &str, data: Vec<Value>) -> Self {
        Self {
            region: region.as_str().to_owned(),
            market: market.to_owned(),
            symbol: symbol.to_owned(),
            data,
        }
    }
}

/// One filtered message waiting in the pipeline queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub market: String,
    pub symbol: String,
    pub message: Value,
}
