//! End-to-end pipeline scenarios driven through the recording sink.

use std::sync::Arc;

use serde_json::json;

use marketgate::domain::{ExchangeId, Region, StreamKind};
use marketgate::stream::{Pipeline, BATCH_THRESHOLD};
use marketgate::testkit::{
    coinone_ticker_frame, kraken_book_frame, subscribed_ack, upbit_ticker_frame, RecordingSink,
};

fn upbit_columns() -> Vec<String> {
    [
        "type",
        "code",
        "opening_price",
        "high_price",
        "low_price",
        "trade_price",
        "prev_closing_price",
        "acc_trade_volume_24h",
        "timestamp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn coinone_columns() -> Vec<String> {
    ["target_currency", "last", "high", "low"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// One hundred consecutive upbit ticker frames produce exactly one
/// envelope with the full batch under the pinned topic and key.
#[tokio::test]
async fn upbit_ticker_batch_publishes_once_at_one_hundred() {
    let bus = Arc::new(RecordingSink::new());
    let mut pipeline = Pipeline::new(
        Region::Korea,
        ExchangeId::Upbit,
        StreamKind::Ticker,
        "BTC",
        upbit_columns(),
        "RegionKorea_Preprocessing",
        "ErrorTopic",
        bus.clone(),
    );

    for i in 0..BATCH_THRESHOLD {
        pipeline
            .enqueue(&upbit_ticker_frame(64_000_000.0 + i as f64))
            .unwrap();
        pipeline.drain_once().await.unwrap();
    }

    let records = bus.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.topic, "RegionKorea_Preprocessing-ticker");
    assert_eq!(record.key, "upbit:ticker-BTC");
    assert_eq!(record.payload["region"], json!("korea"));
    assert_eq!(record.payload["market"], json!("upbit"));
    assert_eq!(record.payload["symbol"], json!("BTC"));
    assert_eq!(record.payload["data"].as_array().unwrap().len(), 100);
}

/// A subscription ack followed by a legitimate frame: only the second
/// reaches the batch buffer.
#[tokio::test]
async fn subscribe_ack_is_filtered_before_buffering() {
    let bus = Arc::new(RecordingSink::new());
    let mut pipeline = Pipeline::new(
        Region::Korea,
        ExchangeId::Coinone,
        StreamKind::Ticker,
        "BTC",
        coinone_columns(),
        "RegionKorea_Preprocessing",
        "ErrorTopic",
        bus.clone(),
    );

    pipeline.enqueue(&subscribed_ack()).unwrap();
    pipeline.drain_once().await.unwrap();
    assert_eq!(pipeline.buffered("coinone"), 0);

    pipeline.enqueue(&coinone_ticker_frame("64000000")).unwrap();
    pipeline.drain_once().await.unwrap();
    assert_eq!(pipeline.buffered("coinone"), 1);
    assert!(bus.records().is_empty());
}

/// Kraken book stream: a snapshot plus 99 updates flush together; the
/// 101st frame stays buffered for the next batch.
#[tokio::test]
async fn kraken_snapshot_and_updates_share_one_batch() {
    let bus = Arc::new(RecordingSink::new());
    let mut pipeline = Pipeline::new(
        Region::Ne,
        ExchangeId::Kraken,
        StreamKind::Orderbook,
        "BTC",
        Vec::new(),
        "RegionNE_Preprocessing",
        "ErrorTopic",
        bus.clone(),
    );

    pipeline.enqueue(&kraken_book_frame("snapshot", 0)).unwrap();
    pipeline.drain_once().await.unwrap();
    for seq in 1..100 {
        pipeline.enqueue(&kraken_book_frame("update", seq)).unwrap();
        pipeline.drain_once().await.unwrap();
    }

    let records = bus.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "RegionNE_Preprocessing-orderbook");
    assert_eq!(records[0].key, "kraken:orderbook-BTC");
    let data = records[0].payload["data"].as_array().unwrap();
    assert_eq!(data.len(), 100);
    assert_eq!(data[0]["type"], json!("snapshot"));
    assert_eq!(data[99]["type"], json!("update"));

    pipeline.enqueue(&kraken_book_frame("update", 100)).unwrap();
    pipeline.drain_once().await.unwrap();
    assert_eq!(bus.records().len(), 1);
    assert_eq!(pipeline.buffered("kraken"), 1);
}

/// Wire order is preserved inside every published envelope.
#[tokio::test]
async fn batches_preserve_wire_order() {
    let bus = Arc::new(RecordingSink::new());
    let mut pipeline = Pipeline::new(
        Region::Ne,
        ExchangeId::Kraken,
        StreamKind::Orderbook,
        "BTC",
        Vec::new(),
        "RegionNE_Preprocessing",
        "ErrorTopic",
        bus.clone(),
    );

    for seq in 0..250 {
        pipeline.enqueue(&kraken_book_frame("update", seq)).unwrap();
        pipeline.drain_once().await.unwrap();
    }

    let records = bus.records();
    assert_eq!(records.len(), 2);
    let mut expected = 0u64;
    for record in &records {
        let data = record.payload["data"].as_array().unwrap();
        assert!(!data.is_empty() && data.len() <= BATCH_THRESHOLD);
        for message in data {
            assert_eq!(message["seq"], json!(expected));
            expected += 1;
        }
    }
    assert_eq!(expected, 200);
}

/// Every envelope carries between 1 and 100 raw messages.
#[tokio::test]
async fn envelopes_never_exceed_the_batch_threshold() {
    let bus = Arc::new(RecordingSink::new());
    let mut pipeline = Pipeline::new(
        Region::Asia,
        ExchangeId::Okx,
        StreamKind::Ticker,
        "BTC",
        vec!["instId".into(), "last".into()],
        "RegionAsia_Preprocessing",
        "ErrorTopic",
        bus.clone(),
    );

    for i in 0..350 {
        let frame = json!({
            "arg": {"channel": "tickers", "instId": "BTC-USDT"},
            "data": [{"instId": "BTC-USDT", "last": format!("{i}")}],
        })
        .to_string();
        pipeline.enqueue(&frame).unwrap();
        pipeline.drain_once().await.unwrap();
    }

    let records = bus.records();
    assert_eq!(records.len(), 3);
    for record in records {
        let len = record.payload["data"].as_array().unwrap().len();
        assert!(len >= 1 && len <= BATCH_THRESHOLD);
    }
}
