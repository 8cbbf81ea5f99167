use anyhow::Context;
use rider_stats::{RowLimit, StatsConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the ZwiftPower fetcher and its front ends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// ZwiftPower API configuration
    pub zwiftpower: ZwiftPowerConfig,

    /// Aggregation configuration
    pub stats: StatsConfig,

    /// Row output configuration
    pub output: OutputConfig,

    /// Trigger service configuration
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZwiftPowerConfig {
    /// Base URL of the results cache
    pub base_url: String,

    /// Club to import in club mode
    pub club_id: Option<u64>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Signed CloudFront cookies granting access to the cache
    pub cloudfront: CloudFrontConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudFrontConfig {
    pub policy: String,
    pub signature: String,
    pub key_pair_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output CSV file; stdout when unset
    pub filename: Option<PathBuf>,

    /// Restrict to this many riders. 0 means no limit.
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen port
    pub port: u16,

    /// Directory that receives results and is served over HTTP
    pub output_dir: PathBuf,

    /// File name of the results table inside `output_dir`
    pub results_file: String,
}

impl Default for ZwiftPowerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zwiftpower.com".to_string(),
            club_id: None,
            timeout_secs: 30,
            cloudfront: CloudFrontConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { port: 8080, output_dir: PathBuf::from("/tmp"), results_file: "results.csv".into() }
    }
}

impl ZwiftPowerConfig {
    /// Club roster URL
    pub fn team_url(&self, club_id: u64) -> String {
        format!("{}/cache3/teams/{}_riders.json", self.base_url.trim_end_matches('/'), club_id)
    }

    /// Rider profile history URL
    pub fn profile_url(&self, zwid: u64) -> String {
        format!("{}/cache3/profile/{}_all.json", self.base_url.trim_end_matches('/'), zwid)
    }

    /// Domain the CloudFront cookies are scoped to
    pub fn cookie_domain(&self) -> anyhow::Result<String> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid ZwiftPower base URL: {}", self.base_url))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("ZwiftPower base URL has no host: {}", self.base_url))
    }
}

impl OutputConfig {
    pub fn row_limit(&self) -> RowLimit {
        RowLimit::from_raw(self.limit)
    }
}

impl ServiceConfig {
    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }
}

impl FetcherConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::read_file(path)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a TOML file; missing sections keep their defaults
    pub fn read_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(club) = get("CLUBID") {
            self.zwiftpower.club_id =
                Some(club.trim().parse().context("CLUBID must be a numeric club id")?);
        }

        if let Some(base_url) = get("ZWIFTPOWER_BASE_URL") {
            self.zwiftpower.base_url = base_url;
        }

        if let Some(policy) = get("CLOUDFRONTPOLICY") {
            self.zwiftpower.cloudfront.policy = policy;
        }

        if let Some(signature) = get("CLOUDFRONTSIGNATURE") {
            self.zwiftpower.cloudfront.signature = signature;
        }

        if let Some(key_pair_id) = get("CLOUDFRONTKEYPAIRID") {
            self.zwiftpower.cloudfront.key_pair_id = key_pair_id;
        }

        if let Some(filename) = get("FILENAME") {
            self.output.filename = Some(PathBuf::from(filename));
        }

        if let Some(limit) = get("LIMIT") {
            self.output.limit = limit.trim().parse().context("LIMIT must be an integer")?;
        }

        if let Some(windows) = get("WINDOW_DAYS") {
            self.stats.window_days = StatsConfig::parse_window_days(&windows)?;
        }

        if let Some(concurrency) = get("CONCURRENCY") {
            self.stats.concurrency =
                concurrency.trim().parse().context("CONCURRENCY must be a positive integer")?;
        }

        if let Some(port) = get("PORT") {
            self.service.port = port.trim().parse().context("PORT must be a valid port")?;
        }

        if let Some(output_dir) = get("OUTPUT_DIR") {
            self.service.output_dir = PathBuf::from(output_dir);
        }

        Ok(self)
    }

    /// Validate settings shared by every mode
    pub fn validate(&self) -> anyhow::Result<()> {
        self.stats.validate()?;
        self.zwiftpower.cookie_domain()?;
        Ok(())
    }

    /// Club id, required for club mode and the trigger service
    pub fn require_club_id(&self) -> anyhow::Result<u64> {
        self.zwiftpower
            .club_id
            .ok_or_else(|| anyhow::anyhow!("Environment variable CLUBID must be provided."))
    }
}
