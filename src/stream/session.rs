//! Per-venue WebSocket session.
//!
//! State machine: `Connecting -> Subscribed -> Streaming`, leaving via
//! `Closing` (cancellation) or `Faulted` (wire/other error handed to the
//! retry supervisor). The session owns its socket for its whole
//! lifetime; dropping the future at any await point closes it.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::time::{timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::stream::Pipeline;

/// Wire timing shared by sessions and the recovery probe.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Interval between outbound Ping frames.
    pub ping_interval: Duration,
    /// Longest tolerated silence before the connection is declared dead.
    pub pong_timeout: Duration,
    /// Per-frame read deadline while streaming.
    pub read_deadline: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
            read_deadline: Duration::from_secs(30),
        }
    }
}

/// Dial, subscribe, then pump frames into the pipeline until a wire
/// fault occurs. Returns only on fault; the caller decides whether to
/// reconnect or fall back.
pub async fn run_session(
    url: &str,
    subscribe_frame: &Value,
    config: SessionConfig,
    pipeline: &mut Pipeline,
) -> Result<()> {
    // Connecting
    let (ws, _response) = connect_async(url).await?;
    let (mut sink, mut stream) = ws.split();

    // Subscribed
    sink.send(Message::Text(subscribe_frame.to_string())).await?;

    let initial = timeout(config.read_deadline, stream.next())
        .await
        .map_err(|_| Error::ReadTimeout)?;
    match initial {
        Some(Ok(frame)) => {
            debug!(url, ?frame, "initial frame");
            info!(url, "connected");
        }
        Some(Err(err)) => return Err(err.into()),
        None => return Err(Error::ConnectionClosed),
    }

    // Streaming
    let mut ping = tokio::time::interval(config.ping_interval);
    ping.reset();
    let mut last_inbound = Instant::now();

    loop {
        let read_deadline = last_inbound + config.read_deadline;
        tokio::select! {
            _ = ping.tick() => {
                if last_inbound.elapsed() >= config.pong_timeout {
                    return Err(Error::PongTimeout);
                }
                sink.send(Message::Ping(Vec::new())).await?;
            }
            () = tokio::time::sleep_until(read_deadline) => {
                return Err(Error::ReadTimeout);
            }
            frame = stream.next() => {
                last_inbound = Instant::now();
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(pipeline, &text).await;
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        match String::from_utf8(bytes) {
                            Ok(text) => handle_frame(pipeline, &text).await,
                            Err(err) => warn!(error = %err, "non-utf8 binary frame"),
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        sink.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        info!(url, ?frame, "closed by server");
                        return Err(Error::ConnectionClosed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => return Err(Error::ConnectionClosed),
                }
            }
        }
    }
}

/// Feed one frame through the pipeline. Processing failures are
/// reported to the error topic and do not tear the session down.
async fn handle_frame(pipeline: &mut Pipeline, text: &str) {
    if let Err(err) = pipeline.enqueue(text) {
        warn!(error = %err, "failed to preprocess frame");
        pipeline.send_error(&err).await;
        return;
    }
    if let Err(err) = pipeline.drain_once().await {
        warn!(error = %err, "failed to drain queue entry");
        pipeline.send_error(&err).await;
    }
}

/// Recovery probe: dial, subscribe, and read one frame within the
/// deadline. Used by the retry supervisor and the REST fallback loop to
/// decide when streaming can resume.
#[derive(Debug, Clone)]
pub struct SessionProbe {
    url: String,
    subscribe_frame: Value,
    deadline: Duration,
}

impl SessionProbe {
    #[must_use]
    pub fn new(url: &str, subscribe_frame: Value) -> Self {
        Self {
            url: url.to_owned(),
            subscribe_frame,
            deadline: Duration::from_secs(30),
        }
    }

    pub async fn attempt(&self) -> bool {
        match timeout(self.deadline, self.dial_and_read()).await {
            Ok(Ok(())) => {
                info!(url = %self.url, "probe succeeded");
                true
            }
            Ok(Err(err)) => {
                warn!(url = %self.url, error = %err, "probe failed");
                false
            }
            Err(_) => {
                warn!(url = %self.url, "probe timed out");
                false
            }
        }
    }

    async fn dial_and_read(&self) -> Result<()> {
        let (ws, _response) = connect_async(&self.url).await?;
        let (mut sink, mut stream) = ws.split();
        sink.send(Message::Text(self.subscribe_frame.to_string()))
            .await?;

        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(_) | Message::Binary(_) => return Ok(()),
                _ => continue,
            }
        }
        Err(Error::ConnectionClosed)
    }
}
