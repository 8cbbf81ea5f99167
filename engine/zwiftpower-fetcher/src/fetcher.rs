use crate::config::ZwiftPowerConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode, Url};
use rider_stats::{ClubRoster, Event, ResultsSource, RiderHistory, RosterRider, StatsError};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, info};

/// ZwiftPower results cache client
pub struct ZwiftPowerFetcher {
    config: ZwiftPowerConfig,
    client: Client,
}

impl ZwiftPowerFetcher {
    /// Create a new fetcher with the CloudFront cookies installed
    pub fn new(config: ZwiftPowerConfig) -> anyhow::Result<Self> {
        let jar = Arc::new(Jar::default());
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid ZwiftPower base URL: {}", config.base_url))?;
        let domain = config.cookie_domain()?;

        for cookie in cloudfront_cookies(&config, &domain) {
            jar.add_cookie_str(&cookie, &base);
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .cookie_provider(jar)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ZwiftPowerConfig {
        &self.config
    }

    /// GET a cache document and return its raw body
    async fn get_body(&self, url: &str) -> rider_stats::Result<Vec<u8>> {
        debug!("Fetching {}", url);

        let response =
            self.client.get(url).send().await.map_err(|e| StatsError::fetch(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StatsError::fetch(url, format!("unexpected status {status}")));
        }

        let body = response.bytes().await.map_err(|e| StatsError::fetch(url, e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ResultsSource for ZwiftPowerFetcher {
    async fn fetch_roster(&self, club_id: u64) -> rider_stats::Result<Vec<RosterRider>> {
        let url = self.config.team_url(club_id);
        info!("Fetching roster for club {} from: {}", club_id, url);

        let body = self.get_body(&url).await?;
        let roster = ClubRoster::from_slice(&body, &url)?;

        info!("Successfully fetched {} riders for club {}", roster.riders.len(), club_id);
        Ok(roster.riders)
    }

    async fn fetch_history(&self, zwid: u64) -> rider_stats::Result<Vec<Event>> {
        let url = self.config.profile_url(zwid);

        let body = self.get_body(&url).await?;
        let history = RiderHistory::from_slice(&body, &url)?;

        debug!("Fetched {} events for rider {}", history.events.len(), zwid);
        Ok(history.events)
    }
}

/// Set-Cookie strings for the signed CloudFront access cookies. Unset values are skipped.
fn cloudfront_cookies(config: &ZwiftPowerConfig, domain: &str) -> Vec<String> {
    let cloudfront = &config.cloudfront;
    [
        ("CloudFront-Policy", &cloudfront.policy),
        ("CloudFront-Signature", &cloudfront.signature),
        ("CloudFront-Key-Pair-Id", &cloudfront.key_pair_id),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(name, value)| format!("{name}={value}; Domain={domain}; Path=/; HttpOnly"))
    .collect()
}
