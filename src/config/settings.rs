//! Top-level settings file: Kafka keys, topic roots, venue URL table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::LoggingConfig;
use crate::domain::Region;
use crate::error::{Error, Result};

/// Recognized Kafka producer keys (§ bus settings).
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub security_protocol: String,
    pub max_batch_size: u32,
    pub max_request_size: u32,
    pub acks: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".into(),
            security_protocol: "PLAINTEXT".into(),
            max_batch_size: 16_384,
            max_request_size: 1_048_576,
            acks: "all".into(),
        }
    }
}

/// Region topic roots and the shared error topic. The streaming write
/// topic is derived as `"<root>-<kind>"` at publish time.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    pub korea_real_topic: String,
    pub asia_real_topic: String,
    pub ne_real_topic: String,
    #[serde(default = "TopicConfig::default_error_topic")]
    pub error_topic: String,
}

impl TopicConfig {
    fn default_error_topic() -> String {
        "ErrorTopic".into()
    }

    /// Root for a region's streaming topics.
    #[must_use]
    pub fn root(&self, region: Region) -> &str {
        match region {
            Region::Korea => &self.korea_real_topic,
            Region::Asia => &self.asia_real_topic,
            Region::Ne => &self.ne_real_topic,
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            korea_real_topic: "RegionKorea_Preprocessing".into(),
            asia_real_topic: "RegionAsia_Preprocessing".into(),
            ne_real_topic: "RegionNE_Preprocessing".into(),
            error_topic: Self::default_error_topic(),
        }
    }
}

/// Socket and REST endpoints for one exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueUrls {
    #[serde(default)]
    pub socket: Option<String>,
    #[serde(default)]
    pub rest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    /// Exchange tag → endpoint pair.
    pub urls: BTreeMap<String, VenueUrls>,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!(
                "Failed to read settings file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {e}")))?;

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.kafka.bootstrap_servers.is_empty() {
            return Err(Error::Config("kafka.bootstrap_servers cannot be empty".into()));
        }
        if self.urls.is_empty() {
            return Err(Error::Config("urls table cannot be empty".into()));
        }
        for (exchange, urls) in &self.urls {
            if urls.socket.is_none() && urls.rest.is_none() {
                return Err(Error::Config(format!(
                    "urls.{exchange} needs at least one of socket/rest"
                )));
            }
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [topics]
        korea_real_topic = "RegionKorea_Preprocessing"
        asia_real_topic = "RegionAsia_Preprocessing"
        ne_real_topic = "RegionNE_Preprocessing"

        [urls.upbit]
        socket = "wss://api.upbit.com/websocket/v1"
        rest = "https://api.upbit.com/v1"
    "#;

    #[test]
    fn parses_minimal_settings() {
        let settings: Settings = toml::from_str(MINIMAL).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.kafka.acks, "all");
        assert_eq!(settings.topics.error_topic, "ErrorTopic");
        assert_eq!(
            settings.topics.root(Region::Korea),
            "RegionKorea_Preprocessing"
        );
    }

    #[test]
    fn rejects_venue_without_endpoints() {
        let raw = r#"
            [urls.upbit]
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_empty_url_table() {
        let settings: Settings = toml::from_str("[urls]").unwrap();
        assert!(settings.validate().is_err());
    }
}
