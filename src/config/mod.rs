//! Settings and per-region venue configuration.
//!
//! Three kinds of input files, all TOML:
//!
//! - `settings.toml`: logging, Kafka producer keys, region topic roots,
//!   and the venue URL table.
//! - `<region>_market_socket.toml`: per-exchange ticker-field whitelist
//!   for the streaming path.
//! - `<region>_market_rest.toml`: per-exchange six-entry parameter list
//!   naming the normalized price fields in the vendor response.

mod logging;
mod settings;
mod venues;

pub use logging::LoggingConfig;
pub use settings::{KafkaConfig, Settings, TopicConfig, VenueUrls};
pub use venues::{MarketFiles, RestVenueConfig, SocketVenueConfig};
