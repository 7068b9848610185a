use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown venue: {region}/{exchange} ({transport})")]
    UnknownVenue {
        region: String,
        exchange: String,
        transport: String,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Read deadline elapsed")]
    ReadTimeout,

    #[error("Liveness window expired without a pong")]
    PongTimeout,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Session cancelled")]
    Cancelled,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bus error: {0}")]
    Bus(#[from] rdkafka::error::KafkaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl Error {
    /// Wire faults the retry supervisor treats as recoverable by
    /// reconnecting: read deadlines, orderly/unorderly closes,
    /// cancellation, and protocol-level websocket failures. Everything
    /// else goes straight to REST fallback.
    pub fn is_transient_wire(&self) -> bool {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match self {
            Error::ReadTimeout | Error::PongTimeout | Error::ConnectionClosed | Error::Cancelled => {
                true
            }
            Error::WebSocket(ws) => matches!(
                ws,
                WsError::ConnectionClosed
                    | WsError::AlreadyClosed
                    | WsError::Protocol(_)
                    | WsError::Io(_)
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
