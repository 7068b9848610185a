use std::collections::HashMap;

use crate::config::{MarketFiles, Settings};
use crate::domain::{ExchangeId, Region, Transport};
use crate::error::{Error, Result};

/// Immutable descriptor of one exchange at one transport.
#[derive(Debug, Clone)]
pub struct Venue {
    pub region: Region,
    pub exchange: ExchangeId,
    pub transport: Transport,
    pub url: String,
    /// Keys retained by the ticker field projection (socket venues).
    pub ticker_columns: Vec<String>,
    /// Vendor field names for the six normalized price fields (REST venues).
    pub parameters: Vec<String>,
}

/// Registry of every venue enumerated by the config files.
#[derive(Debug)]
pub struct VenueRegistry {
    venues: HashMap<(Region, ExchangeId, Transport), Venue>,
}

impl VenueRegistry {
    /// Build the registry for all three regions. Fails fast on any
    /// missing URL, unparseable market file, or exchange tag the
    /// gateway does not know.
    pub fn load(settings: &Settings, market_files: &MarketFiles) -> Result<Self> {
        let mut venues = HashMap::new();

        for region in Region::ALL {
            for (tag, socket_cfg) in market_files.socket(region)? {
                let exchange: ExchangeId = tag.parse()?;
                let url = socket_url(settings, &tag)?;
                venues.insert(
                    (region, exchange, Transport::Socket),
                    Venue {
                        region,
                        exchange,
                        transport: Transport::Socket,
                        url,
                        ticker_columns: socket_cfg.ticker_columns,
                        parameters: Vec::new(),
                    },
                );
            }

            for (tag, rest_cfg) in market_files.rest(region)? {
                let exchange: ExchangeId = tag.parse()?;
                let url = rest_url(settings, &tag)?;
                venues.insert(
                    (region, exchange, Transport::Rest),
                    Venue {
                        region,
                        exchange,
                        transport: Transport::Rest,
                        url,
                        ticker_columns: Vec::new(),
                        parameters: rest_cfg.parameters,
                    },
                );
            }
        }

        Ok(Self { venues })
    }

    /// All venues registered for `region`, both transports.
    #[must_use]
    pub fn list(&self, region: Region) -> Vec<&Venue> {
        let mut venues: Vec<&Venue> = self
            .venues
            .values()
            .filter(|v| v.region == region)
            .collect();
        venues.sort_by_key(|v| (v.exchange.as_str(), v.transport.as_str()));
        venues
    }

    pub fn lookup(
        &self,
        region: Region,
        exchange: ExchangeId,
        transport: Transport,
    ) -> Result<&Venue> {
        self.venues
            .get(&(region, exchange, transport))
            .ok_or_else(|| Error::UnknownVenue {
                region: region.to_string(),
                exchange: exchange.to_string(),
                transport: transport.to_string(),
            })
    }
}

fn socket_url(settings: &Settings, tag: &str) -> Result<String> {
    settings
        .urls
        .get(tag)
        .and_then(|u| u.socket.clone())
        .ok_or_else(|| Error::Config(format!("no socket url configured for {tag}")))
}

fn rest_url(settings: &Settings, tag: &str) -> Result<String> {
    settings
        .urls
        .get(tag)
        .and_then(|u| u.rest.clone())
        .ok_or_else(|| Error::Config(format!("no rest url configured for {tag}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Settings) {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "korea_market_socket.toml",
            r#"
                [upbit]
                ticker_columns = ["type", "code", "trade_price"]
            "#,
        );
        write_file(
            tmp.path(),
            "korea_market_rest.toml",
            r#"
                [upbit]
                parameters = [
                    "opening_price", "high_price", "low_price",
                    "trade_price", "prev_closing_price", "acc_trade_volume_24h",
                ]
            "#,
        );
        for region in ["asia", "ne"] {
            write_file(tmp.path(), &format!("{region}_market_socket.toml"), "");
            write_file(tmp.path(), &format!("{region}_market_rest.toml"), "");
        }

        let settings: Settings = toml::from_str(
            r#"
                [urls.upbit]
                socket = "wss://api.upbit.com/websocket/v1"
                rest = "https://api.upbit.com/v1"
            "#,
        )
        .unwrap();

        (tmp, settings)
    }

    #[test]
    fn lookup_returns_registered_venue() {
        let (tmp, settings) = fixture();
        let registry = VenueRegistry::load(&settings, &MarketFiles::new(tmp.path())).unwrap();

        let venue = registry
            .lookup(Region::Korea, ExchangeId::Upbit, Transport::Socket)
            .unwrap();
        assert_eq!(venue.url, "wss://api.upbit.com/websocket/v1");
        assert_eq!(venue.ticker_columns, vec!["type", "code", "trade_price"]);

        let rest = registry
            .lookup(Region::Korea, ExchangeId::Upbit, Transport::Rest)
            .unwrap();
        assert_eq!(rest.parameters.len(), 6);
    }

    #[test]
    fn unknown_venue_is_an_error() {
        let (tmp, settings) = fixture();
        let registry = VenueRegistry::load(&settings, &MarketFiles::new(tmp.path())).unwrap();

        assert!(matches!(
            registry.lookup(Region::Asia, ExchangeId::Okx, Transport::Socket),
            Err(Error::UnknownVenue { .. })
        ));
    }

    #[test]
    fn list_is_scoped_to_the_region() {
        let (tmp, settings) = fixture();
        let registry = VenueRegistry::load(&settings, &MarketFiles::new(tmp.path())).unwrap();

        assert_eq!(registry.list(Region::Korea).len(), 2);
        assert!(registry.list(Region::Ne).is_empty());
    }
}
