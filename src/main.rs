use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::task::JoinSet;
use tracing::{error, info};

use marketgate::config::{MarketFiles, Settings};
use marketgate::domain::{ExchangeId, Region, StreamKind};
use marketgate::error::Error;
use marketgate::stream::{run_region, run_region_rest, RegionContext};
use marketgate::venue::VenueRegistry;

#[derive(Parser)]
#[command(name = "marketgate", version, about = "Multi-venue market-data ingestion gateway")]
struct Cli {
    /// Settings file with Kafka keys, topic roots and the venue URL table.
    #[arg(long, default_value = "config/settings.toml")]
    settings: String,

    /// Directory holding the per-region market files.
    #[arg(long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream ticker feeds for one region, or all regions.
    Ticker {
        #[arg(long)]
        region: Option<Region>,
        /// Restrict to a single venue.
        #[arg(long)]
        venue: Option<ExchangeId>,
        #[arg(long, default_value = "BTC")]
        symbol: String,
    },
    /// Stream orderbook feeds for one region, or all regions.
    Orderbook {
        #[arg(long)]
        region: Option<Region>,
        #[arg(long)]
        venue: Option<ExchangeId>,
        #[arg(long, default_value = "BTC")]
        symbol: String,
    },
    /// Publish consolidated REST snapshots for one region, or all regions.
    Rest {
        #[arg(long)]
        region: Option<Region>,
        #[arg(long, default_value = "BTC")]
        symbol: String,
    },
}

impl Command {
    fn regions(region: Option<Region>) -> Vec<Region> {
        region.map_or_else(|| Region::ALL.to_vec(), |r| vec![r])
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let settings = match Settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Failed to load settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    settings.init_logging();

    let market_files = MarketFiles::new(&cli.config_dir);
    let registry = match VenueRegistry::load(&settings, &market_files) {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            error!(error = %err, "failed to build venue registry");
            return ExitCode::FAILURE;
        }
    };

    info!("marketgate starting");

    let outcome = tokio::select! {
        result = run(cli.command, &settings, registry) => result,
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    match outcome {
        Ok(()) => {
            info!("marketgate stopped");
            ExitCode::SUCCESS
        }
        Err(err @ Error::Config(_)) | Err(err @ Error::UnknownVenue { .. }) => {
            error!(error = %err, "fatal configuration error");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    settings: &Settings,
    registry: Arc<VenueRegistry>,
) -> marketgate::error::Result<()> {
    let context = |region: Region, symbol: &str| RegionContext {
        region,
        symbol: symbol.to_owned(),
        registry: registry.clone(),
        topics: settings.topics.clone(),
        kafka: settings.kafka.clone(),
    };

    match command {
        Command::Ticker { region, venue, symbol } => {
            run_streams(
                Command::regions(region)
                    .into_iter()
                    .map(|r| context(r, &symbol))
                    .collect(),
                StreamKind::Ticker,
                venue,
            )
            .await
        }
        Command::Orderbook { region, venue, symbol } => {
            run_streams(
                Command::regions(region)
                    .into_iter()
                    .map(|r| context(r, &symbol))
                    .collect(),
                StreamKind::Orderbook,
                venue,
            )
            .await
        }
        Command::Rest { region, symbol } => {
            let mut regions = JoinSet::new();
            for ctx in Command::regions(region)
                .into_iter()
                .map(|r| context(r, &symbol))
            {
                regions.spawn(run_region_rest(ctx));
            }
            join_regions(regions).await
        }
    }
}

/// One top-level task per region; regions run in parallel on the
/// multi-thread runtime.
async fn run_streams(
    contexts: Vec<RegionContext>,
    kind: StreamKind,
    venue: Option<ExchangeId>,
) -> marketgate::error::Result<()> {
    let mut regions = JoinSet::new();
    for ctx in contexts {
        regions.spawn(run_region(ctx, kind, venue));
    }
    join_regions(regions).await
}

async fn join_regions(
    mut regions: JoinSet<marketgate::error::Result<()>>,
) -> marketgate::error::Result<()> {
    let mut first_error = None;
    while let Some(joined) = regions.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(error = %err, "region terminated with error");
                first_error.get_or_insert(err);
            }
            Err(err) => {
                error!(error = %err, "region task panicked");
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
