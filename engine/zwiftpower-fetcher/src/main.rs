//! `zp`: ZwiftPower club and rider statistics
//!
//! - default: import the configured club and write one CSV row per rider
//! - rider: aggregate a single rider by id
//! - serve: HTTP trigger service writing results into an output directory

use clap::{Parser, Subcommand};
use rider_stats::{StatsConfig, TeamAggregator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use zwiftpower_fetcher::{
    logging, service, FetcherConfig, RiderReport, RowWriter, TriggerService, ZwiftPowerFetcher,
};

#[derive(Parser)]
#[command(name = "zp")]
#[command(about = "Rolling-window race statistics for ZwiftPower clubs and riders")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file; environment variables still override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Club to import (CLUBID)
    #[arg(long, global = true)]
    club: Option<u64>,

    /// Output CSV file, stdout when omitted (FILENAME)
    #[arg(short, long, global = true)]
    filename: Option<PathBuf>,

    /// Restrict to this many riders, 0 for all (LIMIT)
    #[arg(short, long, global = true)]
    limit: Option<i64>,

    /// Comma-separated window lengths in days (WINDOW_DAYS)
    #[arg(long, global = true)]
    window_days: Option<String>,

    /// Riders fetched at the same time (CONCURRENCY)
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a single rider known only by id
    Rider {
        /// ZwiftPower rider id
        #[arg(default_value_t = 98588)]
        id: u64,

        /// Print the full aggregate as JSON instead of a CSV row
        #[arg(long)]
        json: bool,
    },

    /// Serve GET /trigger and the output directory over HTTP
    Serve {
        /// Listen port (PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for results.csv (OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Command line flags take precedence over file and environment
    fn apply(&self, config: &mut FetcherConfig) -> anyhow::Result<()> {
        if let Some(club) = self.club {
            config.zwiftpower.club_id = Some(club);
        }
        if let Some(filename) = &self.filename {
            config.output.filename = Some(filename.clone());
        }
        if let Some(limit) = self.limit {
            config.output.limit = limit;
        }
        if let Some(windows) = &self.window_days {
            config.stats.window_days = StatsConfig::parse_window_days(windows)?;
        }
        if let Some(concurrency) = self.concurrency {
            config.stats.concurrency = concurrency;
        }
        if let Some(Commands::Serve { port, output_dir }) = &self.command {
            if let Some(port) = port {
                config.service.port = *port;
            }
            if let Some(output_dir) = output_dir {
                config.service.output_dir = output_dir.clone();
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::initialize_logging() {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => FetcherConfig::load_from_file(path)?,
        None => FetcherConfig::from_env()?,
    };
    cli.apply(&mut config)?;
    config.validate()?;

    let fetcher = ZwiftPowerFetcher::new(config.zwiftpower.clone())?;
    let team = TeamAggregator::new(config.stats.clone(), fetcher)?;

    match cli.command {
        None => {
            let club_id = config.require_club_id()?;
            info!("Importing club {}", club_id);

            let riders = team.import_team(club_id, config.output.row_limit()).await?;
            let mut writer = RowWriter::open(config.output.filename.as_deref())?;
            writer.write_table(&config.stats.window_days, &riders)
        }
        Some(Commands::Rider { id, json }) => {
            info!("Importing rider {}", id);

            let rider = team.import_rider(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&RiderReport::new(&rider))?);
                Ok(())
            } else {
                let mut writer = RowWriter::open(config.output.filename.as_deref())?;
                writer.write_table(&config.stats.window_days, std::slice::from_ref(&rider))
            }
        }
        Some(Commands::Serve { .. }) => {
            let club_id = config.require_club_id()?;
            let trigger =
                TriggerService::new(team, club_id, config.output.row_limit(), config.service);
            service::serve(Arc::new(trigger)).await
        }
    }
}
