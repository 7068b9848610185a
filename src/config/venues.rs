//! Per-region venue files: `_market_socket.toml` and `_market_rest.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::Region;
use crate::error::{Error, Result};

/// Socket entry: which response keys survive the ticker field
/// projection.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketVenueConfig {
    pub ticker_columns: Vec<String>,
}

/// REST entry: the six vendor field names feeding the normalized record,
/// in `[opening, max, min, trade, prev_closing, acc_volume_24h]` order.
#[derive(Debug, Clone, Deserialize)]
pub struct RestVenueConfig {
    pub parameters: Vec<String>,
}

/// Loader for the pair of market files of one region.
#[derive(Debug, Clone)]
pub struct MarketFiles {
    dir: PathBuf,
}

impl MarketFiles {
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Exchange tag → ticker whitelist for one region's socket venues.
    pub fn socket(&self, region: Region) -> Result<BTreeMap<String, SocketVenueConfig>> {
        self.read(&format!("{}_market_socket.toml", region.as_str()))
    }

    /// Exchange tag → REST parameter list for one region's REST venues.
    pub fn rest(&self, region: Region) -> Result<BTreeMap<String, RestVenueConfig>> {
        let venues: BTreeMap<String, RestVenueConfig> =
            self.read(&format!("{}_market_rest.toml", region.as_str()))?;
        for (exchange, cfg) in &venues {
            if cfg.parameters.len() != 6 {
                return Err(Error::Config(format!(
                    "{} rest parameters must name exactly 6 fields, got {}",
                    exchange,
                    cfg.parameters.len()
                )));
            }
        }
        Ok(venues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn loads_socket_whitelists() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "korea_market_socket.toml",
            r#"
                [upbit]
                ticker_columns = ["type", "code", "trade_price"]
            "#,
        );
        let files = MarketFiles::new(tmp.path());
        let socket = files.socket(Region::Korea).unwrap();
        assert_eq!(socket["upbit"].ticker_columns.len(), 3);
    }

    #[test]
    fn rest_parameter_list_must_have_six_entries() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "asia_market_rest.toml",
            r#"
                [okx]
                parameters = ["open24h", "high24h"]
            "#,
        );
        let files = MarketFiles::new(tmp.path());
        assert!(files.rest(Region::Asia).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let files = MarketFiles::new(tmp.path());
        assert!(matches!(
            files.socket(Region::Ne),
            Err(Error::Config(_))
        ));
    }
}
