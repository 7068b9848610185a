//! Subscribe frame coverage across every venue and stream kind.

use marketgate::domain::{ExchangeId, Region, StreamKind};
use marketgate::subscribe::subscribe_frame;

#[test]
fn every_roster_venue_builds_a_frame_for_its_streams() {
    for region in Region::ALL {
        for kind in [StreamKind::Ticker, StreamKind::Orderbook] {
            for &exchange in region.socket_venues(kind) {
                let frame = subscribe_frame(exchange, kind, "BTC")
                    .unwrap_or_else(|e| panic!("{exchange}/{kind}: {e}"));
                assert!(
                    frame.is_object() || frame.is_array(),
                    "{exchange}/{kind} produced a scalar frame"
                );
            }
        }
    }
}

#[test]
fn frames_are_deterministic_apart_from_tickets_and_timestamps() {
    // Venues without a uuid/timestamp component must produce identical
    // frames on every call.
    for exchange in [ExchangeId::Coinone, ExchangeId::Okx, ExchangeId::Coinbase] {
        let a = subscribe_frame(exchange, StreamKind::Ticker, "BTC").unwrap();
        let b = subscribe_frame(exchange, StreamKind::Ticker, "BTC").unwrap();
        assert_eq!(a, b, "{exchange} frame is not deterministic");
    }
}

#[test]
fn symbols_are_cased_per_venue_dialect() {
    let binance = subscribe_frame(ExchangeId::Binance, StreamKind::Ticker, "Eth").unwrap();
    assert_eq!(binance["params"][0], "ethusdt@ticker");

    let upbit = subscribe_frame(ExchangeId::Upbit, StreamKind::Ticker, "eth").unwrap();
    assert_eq!(upbit[1]["codes"][0], "KRW-ETH");

    let korbit = subscribe_frame(ExchangeId::Korbit, StreamKind::Orderbook, "ETH").unwrap();
    assert_eq!(korbit["data"]["channels"][0], "orderbook:eth_krw");
}
