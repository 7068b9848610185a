//! Exchange, stream and transport identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The exchanges the gateway knows how to subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Upbit,
    Bithumb,
    Coinone,
    Korbit,
    Binance,
    Kraken,
    Coinbase,
    Okx,
    Bybit,
    Gateio,
}

impl ExchangeId {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Upbit => "upbit",
            ExchangeId::Bithumb => "bithumb",
            ExchangeId::Coinone => "coinone",
            ExchangeId::Korbit => "korbit",
            ExchangeId::Binance => "binance",
            ExchangeId::Kraken => "kraken",
            ExchangeId::Coinbase => "coinbase",
            ExchangeId::Okx => "okx",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Gateio => "gateio",
        }
    }

    /// Bus partition key for one of this exchange's streams:
    /// `"<exchange>:<kind>-<symbol>"`.
    #[must_use]
    pub fn partition_key(&self, kind: StreamKind, symbol: &str) -> String {
        format!("{}:{}-{}", self.as_str(), kind.as_str(), symbol)
    }

    /// Key used when publishing a processing failure to the error topic.
    #[must_use]
    pub fn error_key(&self, symbol: &str) -> String {
        format!("{}:error-{}", self.as_str(), symbol)
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upbit" => Ok(ExchangeId::Upbit),
            "bithumb" => Ok(ExchangeId::Bithumb),
            "coinone" => Ok(ExchangeId::Coinone),
            "korbit" => Ok(ExchangeId::Korbit),
            "binance" => Ok(ExchangeId::Binance),
            "kraken" => Ok(ExchangeId::Kraken),
            "coinbase" => Ok(ExchangeId::Coinbase),
            "okx" => Ok(ExchangeId::Okx),
            "bybit" => Ok(ExchangeId::Bybit),
            "gateio" => Ok(ExchangeId::Gateio),
            other => Err(Error::Config(format!("unknown exchange: {other}"))),
        }
    }
}

/// Which stream a session subscribes to. Also the topic suffix
/// (`<root>-ticker` / `<root>-orderbook`) and the second token of the
/// partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Ticker,
    Orderbook,
}

impl StreamKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Ticker => "ticker",
            StreamKind::Orderbook => "orderbook",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ticker" => Ok(StreamKind::Ticker),
            "orderbook" => Ok(StreamKind::Orderbook),
            other => Err(Error::Config(format!("unknown stream kind: {other}"))),
        }
    }
}

/// How a venue is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Socket,
    Rest,
}

impl Transport {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Socket => "socket",
            Transport::Rest => "rest",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_key_format() {
        assert_eq!(
            ExchangeId::Upbit.partition_key(StreamKind::Ticker, "BTC"),
            "upbit:ticker-BTC"
        );
        assert_eq!(
            ExchangeId::Kraken.partition_key(StreamKind::Orderbook, "BTC"),
            "kraken:orderbook-BTC"
        );
    }

    #[test]
    fn error_key_format() {
        assert_eq!(ExchangeId::Coinone.error_key("BTC"), "coinone:error-BTC");
    }
}
