//! Per-region fan-out of venue sessions.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::bus::{KafkaBus, PartitionMode};
use crate::config::{KafkaConfig, TopicConfig};
use crate::domain::{ExchangeId, Region, StreamKind, Transport};
use crate::error::Result;
use crate::rest::RestPoller;
use crate::stream::{run_supervised, Pipeline, RetryPolicy, SessionConfig};
use crate::subscribe::subscribe_frame;
use crate::venue::VenueRegistry;

/// Everything a region's tasks share: the registry, topic roots and
/// producer settings. Producer handles are created per region so no
/// process-wide mutable state exists.
#[derive(Clone)]
pub struct RegionContext {
    pub region: Region,
    pub symbol: String,
    pub registry: Arc<VenueRegistry>,
    pub topics: TopicConfig,
    pub kafka: KafkaConfig,
}

impl RegionContext {
    fn rest_poller(&self, bus: Arc<KafkaBus>) -> RestPoller {
        let venues = self
            .registry
            .list(self.region)
            .into_iter()
            .filter(|v| v.transport == Transport::Rest)
            .cloned()
            .collect();
        RestPoller::new(self.region, venues, bus)
    }
}

/// Launch one supervised session per socket venue of the region and
/// await them all. A venue in trouble repairs itself through the retry
/// supervisor; its task ends only on cancellation.
pub async fn run_region(
    ctx: RegionContext,
    kind: StreamKind,
    venue_filter: Option<ExchangeId>,
) -> Result<()> {
    let socket_bus = Arc::new(KafkaBus::new(
        ctx.kafka.clone(),
        PartitionMode::Pinned,
        ctx.region.partition_count(),
    ));
    let rest_bus = Arc::new(KafkaBus::new(
        ctx.kafka.clone(),
        PartitionMode::Hashed,
        ctx.region.partition_count(),
    ));
    let poller = Arc::new(ctx.rest_poller(rest_bus.clone()));

    let mut sessions = JoinSet::new();
    for &exchange in ctx.region.socket_venues(kind) {
        if venue_filter.is_some_and(|only| only != exchange) {
            continue;
        }

        let venue = ctx
            .registry
            .lookup(ctx.region, exchange, Transport::Socket)?
            .clone();
        let frame = subscribe_frame(exchange, kind, &ctx.symbol)?;
        let mut pipeline = Pipeline::new(
            ctx.region,
            exchange,
            kind,
            &ctx.symbol,
            venue.ticker_columns.clone(),
            ctx.topics.root(ctx.region),
            &ctx.topics.error_topic,
            socket_bus.clone(),
        );

        let symbol = ctx.symbol.clone();
        let poller = poller.clone();
        info!(region = %ctx.region, %exchange, %kind, "launching venue session");
        sessions.spawn(async move {
            run_supervised(
                &venue.url,
                frame,
                SessionConfig::default(),
                RetryPolicy::default(),
                &symbol,
                &poller,
                &mut pipeline,
            )
            .await
        });
    }

    if sessions.is_empty() {
        warn!(region = %ctx.region, %kind, "no venues matched the filter");
    }

    while let Some(joined) = sessions.join_next().await {
        match joined {
            Ok(Ok(())) => info!(region = %ctx.region, "venue session finished"),
            Ok(Err(err)) => error!(region = %ctx.region, error = %err, "venue session failed"),
            Err(err) if err.is_cancelled() => info!(region = %ctx.region, "venue session cancelled"),
            Err(err) => error!(region = %ctx.region, error = %err, "venue session panicked"),
        }
    }

    socket_bus.shutdown();
    rest_bus.shutdown();
    Ok(())
}

/// Standalone consolidated REST loop for one region.
pub async fn run_region_rest(ctx: RegionContext) -> Result<()> {
    let rest_bus = Arc::new(KafkaBus::new(
        ctx.kafka.clone(),
        PartitionMode::Hashed,
        ctx.region.partition_count(),
    ));
    let poller = ctx.rest_poller(rest_bus.clone());
    let result = poller.run(&ctx.symbol).await;
    rest_bus.shutdown();
    result
}
