//! Canonical venue frames for driving the pipeline in tests.

use serde_json::{json, Value};

/// An upbit realtime ticker frame with the given trade price.
#[must_use]
pub fn upbit_ticker_frame(trade_price: f64) -> String {
    json!({
        "type": "ticker",
        "code": "KRW-BTC",
        "opening_price": 63_500_000.0,
        "trade_price": trade_price,
        "prev_closing_price": 63_400_000.0,
        "acc_trade_volume_24h": 2754.048,
        "timestamp": 1_689_633_864_000_i64,
        "stream_type": "REALTIME",
    })
    .to_string()
}

/// A coinone ticker data frame (no `type` discriminator on the wire).
#[must_use]
pub fn coinone_ticker_frame(last: &str) -> String {
    json!({
        "response_type": "DATA",
        "channel": "TICKER",
        "data": {
            "quote_currency": "KRW",
            "target_currency": "BTC",
            "last": last,
            "high": "64200000",
            "low": "63100000",
        },
    })
    .to_string()
}

/// A kraken book frame, either the initial snapshot or an update.
#[must_use]
pub fn kraken_book_frame(kind: &str, seq: u64) -> String {
    json!({
        "type": kind,
        "symbol": "BTC/USD",
        "seq": seq,
        "bids": [["64000.1", "0.5"]],
        "asks": [["64000.9", "0.3"]],
    })
    .to_string()
}

/// The subscription ack coinone sends before streaming data.
#[must_use]
pub fn subscribed_ack() -> String {
    json!({"response_type": "SUBSCRIBED"}).to_string()
}
