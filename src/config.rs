use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::http_client::DEFAULT_USER_AGENT;
use crate::models::MonitoringFrequency;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ROBOTS_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_BODY_LIMIT: usize = 50_000;
pub const DEFAULT_SCORE_DROP_THRESHOLD: f64 = 10.0;
pub const DEFAULT_STATE_FILE: &str = "sitecheck-state.json";

/// Settings handed to the scanner, fetcher and robots client
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub robots_timeout: Duration,
    pub max_redirects: usize,
    /// Maximum number of body characters kept for the checks
    pub body_limit: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            robots_timeout: Duration::from_secs(DEFAULT_ROBOTS_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Settings for the monitoring sweep and alert detection
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub score_drop_threshold: f64,
    /// Configs processed at once during a sweep; 1 means strictly sequential
    pub concurrency: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            score_drop_threshold: DEFAULT_SCORE_DROP_THRESHOLD,
            concurrency: 1,
        }
    }
}

/// Fully resolved settings: CLI over config file over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub scanner: ScannerSettings,
    pub monitor: MonitorSettings,
    pub state_file: PathBuf,
    pub output: String,
    pub verbose: bool,
    pub sites: Vec<SiteEntry>,
}

/// A site to register for monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteEntry {
    pub domain: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub frequency: MonitoringFrequency,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Configuration file structure
/// All fields are optional to allow partial configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// User-Agent sent with every request
    pub user_agent: Option<String>,

    /// Page request timeout in seconds
    pub timeout: Option<u64>,

    /// robots.txt request timeout in seconds
    pub robots_timeout: Option<u64>,

    /// Maximum number of redirect hops to follow
    pub max_redirects: Option<usize>,

    /// Score drop (in points) that raises an alert
    pub score_drop_threshold: Option<f64>,

    /// Monitoring configs processed concurrently
    pub concurrency: Option<usize>,

    /// Path of the JSON state file
    pub state_file: Option<String>,

    /// Output format: text or json
    pub output: Option<String>,

    /// Verbose output
    pub verbose: Option<bool>,

    /// Sites registered for monitoring
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Configuration file format based on file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                _ => None,
            })
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let format = ConfigFormat::from_path(path)
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;

        let config = match format {
            ConfigFormat::Json => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    /// Get the default configuration file paths to check (in order of priority)
    /// Returns paths in order: current directory, user config directory
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
            for ext in format.extensions() {
                paths.push(PathBuf::from(format!("sitecheck.{}", ext)));
            }
        }

        // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        if let Some(config_home) = config_home {
            let config_dir = config_home.join("sitecheck");
            for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
                for ext in format.extensions() {
                    paths.push(config_dir.join(format!("config.{}", ext)));
                }
            }
        }

        paths
    }

    /// Try to load configuration from default paths
    /// Returns the first configuration file found, or None if no config exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        for path in Self::default_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Ok(Some(Self::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Loads the file named by `--config`, or the first default path found
    pub fn load(cli: &Cli) -> Result<Self> {
        match &cli.config {
            Some(path) => Self::from_file(Path::new(path)),
            None => Ok(Self::from_default_paths()?.unwrap_or_default()),
        }
    }

    /// Merge this configuration with CLI arguments
    /// CLI arguments take precedence over config file values
    pub fn resolve(&self, cli: &Cli) -> Result<Settings> {
        let timeout = cli.timeout.or(self.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let robots_timeout = self.robots_timeout.unwrap_or(DEFAULT_ROBOTS_TIMEOUT_SECS);
        if timeout == 0 || robots_timeout == 0 {
            bail!("Timeouts must be at least one second");
        }

        let concurrency = cli
            .command
            .concurrency()
            .or(self.concurrency)
            .unwrap_or(1);
        if concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }

        let output = cli
            .command
            .output()
            .map(str::to_string)
            .or_else(|| self.output.clone())
            .unwrap_or_else(|| "text".to_string());

        Ok(Settings {
            scanner: ScannerSettings {
                user_agent: self
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                request_timeout: Duration::from_secs(timeout),
                robots_timeout: Duration::from_secs(robots_timeout),
                max_redirects: self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
                body_limit: DEFAULT_BODY_LIMIT,
            },
            monitor: MonitorSettings {
                score_drop_threshold: self
                    .score_drop_threshold
                    .unwrap_or(DEFAULT_SCORE_DROP_THRESHOLD),
                concurrency,
            },
            state_file: cli
                .state
                .clone()
                .or_else(|| self.state_file.clone())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            output,
            verbose: cli.verbose || self.verbose.unwrap_or(false),
            sites: self.sites.clone(),
        })
    }
}
