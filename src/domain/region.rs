//! Ingestion regions and their venue rosters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ExchangeId, StreamKind};
use crate::error::Error;

/// An ingestion region. Each region runs its own fan-out of venue
/// sessions and owns its own topic root and partition map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Korea,
    Asia,
    Ne,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Korea, Region::Asia, Region::Ne];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Korea => "korea",
            Region::Asia => "asia",
            Region::Ne => "ne",
        }
    }

    /// Capitalized form used in the consolidated REST topic name
    /// (`TotalKoreaRestDataInBTC`).
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Region::Korea => "Korea",
            Region::Asia => "Asia",
            Region::Ne => "NE",
        }
    }

    /// Socket venues launched by the region orchestrator.
    ///
    /// Coinbase streams ticker only; the orderbook launcher skips it.
    #[must_use]
    pub fn socket_venues(&self, kind: StreamKind) -> &'static [ExchangeId] {
        match (self, kind) {
            (Region::Korea, _) => &[
                ExchangeId::Upbit,
                ExchangeId::Bithumb,
                ExchangeId::Coinone,
                ExchangeId::Korbit,
            ],
            (Region::Asia, _) => &[ExchangeId::Okx, ExchangeId::Bybit, ExchangeId::Gateio],
            (Region::Ne, StreamKind::Ticker) => &[
                ExchangeId::Binance,
                ExchangeId::Kraken,
                ExchangeId::Coinbase,
            ],
            (Region::Ne, StreamKind::Orderbook) => &[ExchangeId::Binance, ExchangeId::Kraken],
        }
    }

    /// Venues polled for the consolidated REST snapshot.
    #[must_use]
    pub fn rest_venues(&self) -> &'static [ExchangeId] {
        match self {
            Region::Korea => &[
                ExchangeId::Upbit,
                ExchangeId::Bithumb,
                ExchangeId::Coinone,
                ExchangeId::Korbit,
            ],
            Region::Asia => &[ExchangeId::Okx, ExchangeId::Bybit, ExchangeId::Gateio],
            Region::Ne => &[ExchangeId::Binance, ExchangeId::Kraken],
        }
    }

    /// Total partition count provisioned for this region's streaming topics.
    #[must_use]
    pub const fn partition_count(&self) -> usize {
        match self {
            Region::Korea => 8,
            Region::Ne => 5,
            Region::Asia => 7,
        }
    }

    /// Topic for the consolidated REST snapshot of `symbol`.
    #[must_use]
    pub fn rest_topic(&self, symbol: &str) -> String {
        format!("Total{}RestDataIn{}", self.title(), symbol.to_uppercase())
    }

    /// Key under which every consolidated snapshot for this region is
    /// published.
    #[must_use]
    pub fn rest_key(&self) -> String {
        format!("{}-Total", self.as_str())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "korea" => Ok(Region::Korea),
            "asia" => Ok(Region::Asia),
            "ne" => Ok(Region::Ne),
            other => Err(Error::Config(format!("unknown region: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_topic_uses_title_case_and_upper_symbol() {
        assert_eq!(Region::Korea.rest_topic("btc"), "TotalKoreaRestDataInBTC");
        assert_eq!(Region::Ne.rest_topic("ETH"), "TotalNERestDataInETH");
    }

    #[test]
    fn ne_orderbook_roster_excludes_coinbase() {
        let roster = Region::Ne.socket_venues(StreamKind::Orderbook);
        assert!(!roster.contains(&ExchangeId::Coinbase));
        assert!(Region::Ne
            .socket_venues(StreamKind::Ticker)
            .contains(&ExchangeId::Coinbase));
    }

    #[test]
    fn parses_from_cli_strings() {
        assert_eq!("korea".parse::<Region>().unwrap(), Region::Korea);
        assert_eq!("NE".parse::<Region>().unwrap(), Region::Ne);
        assert!("emea".parse::<Region>().is_err());
    }
}
