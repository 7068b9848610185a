use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{ExchangeId, StreamKind};
use crate::error::Result;

/// Build the subscribe frame `exchange` expects for `kind` on `symbol`.
///
/// Returned as a [`Value`] so the session can serialize it once for the
/// wire and reuse it for the recovery probe.
pub fn subscribe_frame(exchange: ExchangeId, kind: StreamKind, symbol: &str) -> Result<Value> {
    let frame = match exchange {
        ExchangeId::Upbit | ExchangeId::Bithumb => upbithumb(kind, symbol)?,
        ExchangeId::Coinone => serde_json::to_value(coinone(kind, symbol))?,
        ExchangeId::Korbit => serde_json::to_value(korbit(kind, symbol))?,
        ExchangeId::Binance => serde_json::to_value(binance(kind, symbol))?,
        ExchangeId::Kraken => serde_json::to_value(kraken(kind, symbol))?,
        ExchangeId::Gateio => serde_json::to_value(gateio(kind, symbol))?,
        ExchangeId::Okx => serde_json::to_value(okx(kind, symbol))?,
        ExchangeId::Bybit => serde_json::to_value(bybit(kind, symbol))?,
        ExchangeId::Coinbase => serde_json::to_value(coinbase(kind, symbol))?,
    };
    Ok(frame)
}

#[derive(Debug, Serialize)]
struct Ticket {
    ticket: String,
}

#[derive(Debug, Serialize)]
struct UpbithumbRequest {
    #[serde(rename = "type")]
    req_type: &'static str,
    codes: Vec<String>,
    #[serde(rename = "isOnlyRealtime")]
    is_only_realtime: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<u32>,
}

fn upbithumb(kind: StreamKind, symbol: &str) -> Result<Value> {
    let request = UpbithumbRequest {
        req_type: match kind {
            StreamKind::Ticker => "ticker",
            StreamKind::Orderbook => "orderbook",
        },
        codes: vec![format!("KRW-{}", symbol.to_uppercase())],
        is_only_realtime: true,
        level: match kind {
            StreamKind::Ticker => None,
            StreamKind::Orderbook => Some(1000),
        },
    };
    let ticket = Ticket {
        ticket: Uuid::new_v4().to_string(),
    };
    Ok(Value::Array(vec![
        serde_json::to_value(ticket)?,
        serde_json::to_value(request)?,
    ]))
}

#[derive(Debug, Serialize)]
struct CoinoneTopic {
    quote_currency: &'static str,
    target_currency: String,
}

#[derive(Debug, Serialize)]
struct CoinoneRequest {
    request_type: &'static str,
    channel: &'static str,
    topic: CoinoneTopic,
}

fn coinone(kind: StreamKind, symbol: &str) -> CoinoneRequest {
    CoinoneRequest {
        request_type: "SUBSCRIBE",
        channel: match kind {
            StreamKind::Ticker => "TICKER",
            StreamKind::Orderbook => "ORDERBOOK",
        },
        topic: CoinoneTopic {
            quote_currency: "KRW",
            target_currency: symbol.to_uppercase(),
        },
    }
}

#[derive(Debug, Serialize)]
struct KorbitChannels {
    channels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct KorbitRequest {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    timestamp: i64,
    event: &'static str,
    data: KorbitChannels,
}

fn korbit(kind: StreamKind, symbol: &str) -> KorbitRequest {
    KorbitRequest {
        access_token: None,
        timestamp: Utc::now().timestamp(),
        event: "korbit:subscribe",
        data: KorbitChannels {
            channels: vec![format!("{}:{}_krw", kind.as_str(), symbol.to_lowercase())],
        },
    }
}

#[derive(Debug, Serialize)]
struct BinanceRequest {
    id: String,
    method: &'static str,
    params: Vec<String>,
}

fn binance(kind: StreamKind, symbol: &str) -> BinanceRequest {
    let req_type = match kind {
        StreamKind::Ticker => "ticker",
        StreamKind::Orderbook => "depth20",
    };
    BinanceRequest {
        id: Uuid::new_v4().to_string(),
        method: "SUBSCRIBE",
        params: vec![format!("{}usdt@{}", symbol.to_lowercase(), req_type)],
    }
}

#[derive(Debug, Serialize)]
struct KrakenParams {
    channel: &'static str,
    symbol: Vec<String>,
}

#[derive(Debug, Serialize)]
struct KrakenRequest {
    method: &'static str,
    params: KrakenParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    req_id: Option<u32>,
}

fn kraken(kind: StreamKind, symbol: &str) -> KrakenRequest {
    let (channel, req_id) = match kind {
        StreamKind::Ticker => ("ticker", None),
        StreamKind::Orderbook => ("book", Some(1)),
    };
    KrakenRequest {
        method: "subscribe",
        params: KrakenParams {
            channel,
            symbol: vec![format!("{}/USD", symbol.to_uppercase())],
        },
        req_id,
    }
}

#[derive(Debug, Serialize)]
struct GateioRequest {
    time: i64,
    channel: String,
    event: &'static str,
    payload: Vec<String>,
}

fn gateio(kind: StreamKind, symbol: &str) -> GateioRequest {
    let pair = format!("{}_USDT", symbol.to_uppercase());
    let (req_type, payload) = match kind {
        StreamKind::Ticker => ("tickers", vec![pair]),
        StreamKind::Orderbook => ("order_book", vec![pair, "100".into(), "100ms".into()]),
    };
    GateioRequest {
        time: Utc::now().timestamp(),
        channel: format!("spot.{req_type}"),
        event: "subscribe",
        payload,
    }
}

#[derive(Debug, Serialize)]
struct OkxArg {
    channel: &'static str,
    #[serde(rename = "instId")]
    inst_id: String,
}

#[derive(Debug, Serialize)]
struct OkxRequest {
    op: &'static str,
    args: Vec<OkxArg>,
}

fn okx(kind: StreamKind, symbol: &str) -> OkxRequest {
    OkxRequest {
        op: "subscribe",
        args: vec![OkxArg {
            channel: match kind {
                StreamKind::Ticker => "tickers",
                StreamKind::Orderbook => "books",
            },
            inst_id: format!("{}-USDT", symbol.to_uppercase()),
        }],
    }
}

#[derive(Debug, Serialize)]
struct BybitRequest {
    req_id: String,
    op: &'static str,
    args: Vec<String>,
}

fn bybit(kind: StreamKind, symbol: &str) -> BybitRequest {
    let pair = format!("{}USDT", symbol.to_uppercase());
    let arg = match kind {
        StreamKind::Ticker => format!("tickers.{pair}"),
        StreamKind::Orderbook => format!("orderbook.50.{pair}"),
    };
    BybitRequest {
        req_id: Uuid::new_v4().to_string(),
        op: "subscribe",
        args: vec![arg],
    }
}

#[derive(Debug, Serialize)]
struct CoinbaseRequest {
    #[serde(rename = "type")]
    req_type: &'static str,
    product_ids: Vec<String>,
    channels: Vec<&'static str>,
}

fn coinbase(kind: StreamKind, symbol: &str) -> CoinbaseRequest {
    CoinbaseRequest {
        req_type: "subscribe",
        product_ids: vec![format!("{}-USDT", symbol.to_uppercase())],
        channels: vec![match kind {
            StreamKind::Ticker => "ticker",
            StreamKind::Orderbook => "level2",
        }],
    }
}
