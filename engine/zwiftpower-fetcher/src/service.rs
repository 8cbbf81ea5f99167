//! HTTP trigger service
//!
//! `GET /trigger` runs a club import and replaces the results file in the
//! output directory. Every other path is served from that directory.

use crate::config::ServiceConfig;
use crate::models::ImportEvent;
use crate::output::RowWriter;
use anyhow::Context;
use rider_stats::{ResultsSource, RiderAggregate, RowLimit, TeamAggregator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

/// Club import bound to an output directory
pub struct TriggerService<S> {
    team: TeamAggregator<S>,
    club_id: u64,
    limit: RowLimit,
    config: ServiceConfig,
    run_lock: Mutex<()>,
}

impl<S: ResultsSource> TriggerService<S> {
    pub fn new(
        team: TeamAggregator<S>,
        club_id: u64,
        limit: RowLimit,
        config: ServiceConfig,
    ) -> Self {
        Self { team, club_id, limit, config, run_lock: Mutex::new(()) }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Import the club and atomically replace the results file
    pub async fn run_import(&self) -> anyhow::Result<ImportEvent> {
        // One run at a time so renames never interleave
        let _guard = self.run_lock.lock().await;

        let riders = self.team.import_team(self.club_id, self.limit).await?;
        let count = riders.len();

        let target = self.config.results_path();
        let staging = self.staging_path();
        let window_days = self.team.config().window_days.clone();
        let destination = target.clone();
        tokio::task::spawn_blocking(move || {
            replace_results(&staging, &destination, &window_days, &riders)
        })
        .await
        .context("Results writer task failed")??;

        Ok(ImportEvent::rows_written(self.club_id, count, target.display().to_string()))
    }

    fn staging_path(&self) -> PathBuf {
        self.config.output_dir.join(format!(".{}.tmp", self.config.results_file))
    }

    async fn trigger(self: Arc<Self>) -> Result<impl warp::Reply, warp::Rejection> {
        info!("Import triggered for club {}", self.club_id);

        let (event, status) = match self.run_import().await {
            Ok(event) => (event, StatusCode::OK),
            Err(e) => {
                error!("Import failed: {:#}", e);
                let event = ImportEvent::import_failed(self.club_id, format!("{e:#}"));
                (event, StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        Ok(warp::reply::with_status(warp::reply::json(&event), status))
    }
}

/// Write the table to `staging` and move it over `target`. The staging file
/// never outlives a failed attempt.
fn replace_results(
    staging: &Path,
    target: &Path,
    window_days: &[u32],
    riders: &[RiderAggregate],
) -> anyhow::Result<()> {
    let result = write_and_rename(staging, target, window_days, riders);
    if result.is_err() && staging.exists() {
        if let Err(e) = std::fs::remove_file(staging) {
            warn!("Failed to remove {}: {}", staging.display(), e);
        }
    }
    result
}

fn write_and_rename(
    staging: &Path,
    target: &Path,
    window_days: &[u32],
    riders: &[RiderAggregate],
) -> anyhow::Result<()> {
    let mut writer = RowWriter::open(Some(staging))?;
    writer.write_table(window_days, riders)?;
    drop(writer);

    std::fs::rename(staging, target).with_context(|| {
        format!("Failed to move {} to {}", staging.display(), target.display())
    })
}

/// Create the trigger and static file routes
pub fn create_routes<S>(
    service: Arc<TriggerService<S>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
    S: ResultsSource + 'static,
{
    let output_dir = service.config().output_dir.clone();
    let service_filter = warp::any().map(move || service.clone());

    let trigger = warp::path("trigger")
        .and(warp::path::end())
        .and(warp::get())
        .and(service_filter)
        .and_then(|service: Arc<TriggerService<S>>| async move { service.trigger().await });

    trigger.or(warp::fs::dir(output_dir))
}

/// Serve until the process is stopped
pub async fn serve<S>(service: Arc<TriggerService<S>>) -> anyhow::Result<()>
where
    S: ResultsSource + 'static,
{
    let port = service.config().port;
    std::fs::create_dir_all(&service.config().output_dir).with_context(|| {
        format!("Failed to create output directory {}", service.config().output_dir.display())
    })?;

    info!("Listening on port {}, serving {}", port, service.config().output_dir.display());
    warp::serve(create_routes(service)).run(([0, 0, 0, 0], port)).await;
    Ok(())
}
