//! Retry supervision around a venue session.
//!
//! Transient wire faults retry with exponential backoff and a liveness
//! probe between attempts; anything else (and an exhausted retry
//! budget) hands the venue to the REST poller until its integrated
//! probe sees the socket answering again.

use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::rest::RestPoller;
use crate::stream::{run_session, Pipeline, SessionConfig, SessionProbe};

/// Backoff parameters for reconnect attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before reconnect attempt `attempt` (zero-based):
    /// `min(base * 2^attempt, max)` plus up to 10% jitter.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter = doubled.mul_f64(rand::thread_rng().gen_range(0.0..0.1));
        doubled + jitter
    }
}

/// What the supervisor does about one session fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultAction {
    /// Sleep out the backoff for this attempt, probe, reconnect.
    Backoff { attempt: u32 },
    /// Hand the venue to the REST poller.
    Fallback,
}

/// Transient faults burn through the retry budget; anything else falls
/// back immediately.
fn next_action(policy: &RetryPolicy, transient: bool, attempt: u32) -> FaultAction {
    if transient && attempt < policy.retries {
        FaultAction::Backoff { attempt }
    } else {
        FaultAction::Fallback
    }
}

/// Drive one venue's session forever. The session is always either
/// streaming or being repaired; this function returns only if the task
/// is cancelled.
#[allow(clippy::too_many_arguments)]
pub async fn run_supervised(
    url: &str,
    subscribe_frame: Value,
    session_config: SessionConfig,
    policy: RetryPolicy,
    symbol: &str,
    poller: &RestPoller,
    pipeline: &mut Pipeline,
) -> Result<()> {
    let probe = SessionProbe::new(url, subscribe_frame.clone());
    let mut attempt: u32 = 0;

    loop {
        let fault = match run_session(url, &subscribe_frame, session_config, pipeline).await {
            Ok(()) => {
                attempt = 0;
                continue;
            }
            Err(fault) => fault,
        };

        match next_action(&policy, fault.is_transient_wire(), attempt) {
            FaultAction::Backoff { attempt: current } => {
                let delay = policy.delay(current);
                attempt += 1;
                warn!(
                    url,
                    error = %fault,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "wire fault, reconnecting after backoff"
                );
                tokio::time::sleep(delay).await;

                if probe.attempt().await {
                    info!(url, "liveness probe passed, resuming stream");
                    attempt = 0;
                }
            }
            FaultAction::Fallback => {
                error!(url, error = %fault, "socket unhealthy, falling back to REST");
                poller.run_fallback(symbol, &probe).await;
                attempt = 0;
            }
        }
    }
}
