//! Configuration infrastructure
//!
//! Contains configuration loading and management for the search service.
//!
//! Configuration is organized into three sections:
//! 1. Server settings (HTTP bind address)
//! 2. Scraping settings (concurrency, deadlines, browser, enabled sites)
//! 3. Logging settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "PRICE_SCOUT_CONFIG";

/// Environment variable overriding the HTTP port
pub const PORT_ENV: &str = "PRICE_SCOUT_PORT";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scraping: ScrapingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Scrape job and orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Maximum jobs running at once; 0 runs every site at once
    pub max_concurrent_jobs: usize,

    /// Deadline for a whole search across all sites; 0 disables it
    pub global_timeout_seconds: u64,

    /// Bound on a single page navigation
    pub navigation_timeout_seconds: u64,

    /// Site names to query; empty means every registered site
    pub enabled_sites: Vec<String>,

    /// Browser launch settings
    pub browser: BrowserSettings,
}

/// Chromium launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,

    /// Disable the Chromium sandbox (needed in most containers)
    pub no_sandbox: bool,

    /// Explicit Chromium/Chrome binary; auto-detected when unset
    pub executable: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,

    /// Timeout for individual CDP requests
    pub request_timeout_seconds: u64,

    /// Additional command line switches passed to Chromium
    pub extra_args: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; next to the executable when unset
    pub directory: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "chromiumoxide": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: defaults::MAX_CONCURRENT_JOBS,
            global_timeout_seconds: defaults::GLOBAL_TIMEOUT_SECONDS,
            navigation_timeout_seconds: defaults::NAVIGATION_TIMEOUT_SECONDS,
            enabled_sites: Vec::new(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: defaults::BROWSER_HEADLESS,
            no_sandbox: defaults::BROWSER_NO_SANDBOX,
            executable: None,
            window_width: defaults::BROWSER_WINDOW_WIDTH,
            window_height: defaults::BROWSER_WINDOW_HEIGHT,
            request_timeout_seconds: defaults::BROWSER_REQUEST_TIMEOUT_SECONDS,
            extra_args: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("tower_http".to_string(), "info".to_string());
                filters.insert("html5ever".to_string(), "error".to_string());
                filters.insert("selectors".to_string(), "error".to_string());
                filters.insert("price_scout".to_string(), defaults::LOG_LEVEL.to_string());
                filters
            },
        }
    }
}

impl ScrapingConfig {
    pub fn global_timeout(&self) -> Option<Duration> {
        (self.global_timeout_seconds > 0).then(|| Duration::from_secs(self.global_timeout_seconds))
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_seconds.max(1))
    }
}

impl AppConfig {
    /// Apply environment overrides on top of the file configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var(PORT_ENV) {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Ignoring invalid {}={:?}: {}", PORT_ENV, port, e),
            }
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("price-scout");

        Ok(config_dir)
    }

    /// Create a configuration manager for the default location, or the path
    /// named by `PRICE_SCOUT_CONFIG`
    pub fn new() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(Self::with_path(path));
        }

        let config_path = Self::get_config_dir()?.join("price_scout_config.json");
        Ok(Self { config_path })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("Configuration file is invalid: {}", parse_error);
                warn!("Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    /// Default bind host for the HTTP service
    pub const SERVER_HOST: &str = "127.0.0.1";

    /// Default HTTP port
    pub const SERVER_PORT: u16 = 5001;

    /// Default job concurrency (0 = one slot per site)
    pub const MAX_CONCURRENT_JOBS: usize = 0;

    /// Default deadline for a whole search in seconds
    pub const GLOBAL_TIMEOUT_SECONDS: u64 = 60;

    /// Default page navigation timeout in seconds
    pub const NAVIGATION_TIMEOUT_SECONDS: u64 = 30;

    /// Default settle delay for sites without a readiness selector
    pub const SETTLE_DELAY_SECONDS: u64 = 5;

    pub const BROWSER_HEADLESS: bool = true;
    pub const BROWSER_NO_SANDBOX: bool = false;
    pub const BROWSER_WINDOW_WIDTH: u32 = 1920;
    pub const BROWSER_WINDOW_HEIGHT: u32 = 1080;
    pub const BROWSER_REQUEST_TIMEOUT_SECONDS: u64 = 30;

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;

    /// File name of the service log
    pub const LOG_FILE_NAME: &str = "price-scout.log";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_default_config_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();

        assert!(manager.config_path().exists());
        assert_eq!(config.server.port, defaults::SERVER_PORT);
        assert_eq!(config.scraping.global_timeout(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn round_trips_saved_settings() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));
        let mut config = AppConfig::default();
        config.scraping.enabled_sites = vec!["amazon".to_string(), "myntra".to_string()];
        config.scraping.global_timeout_seconds = 0;

        manager.save_config(&config).await.unwrap();
        let loaded = manager.load_config().await.unwrap();

        assert_eq!(loaded.scraping.enabled_sites, vec!["amazon", "myntra"]);
        assert_eq!(loaded.scraping.global_timeout(), None);
    }

    #[tokio::test]
    async fn partial_file_fills_missing_sections_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"host": "0.0.0.0", "port": 8080}}"#).unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, defaults::LOG_LEVEL);
    }

    #[tokio::test]
    async fn partial_sections_keep_user_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"scraping": {"max_concurrent_jobs": 2, "browser": {"no_sandbox": true}},
                "server": {"port": 9000}}"#,
        )
        .unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, defaults::SERVER_HOST);
        assert_eq!(config.scraping.max_concurrent_jobs, 2);
        assert_eq!(
            config.scraping.global_timeout_seconds,
            defaults::GLOBAL_TIMEOUT_SECONDS
        );
        assert!(config.scraping.browser.no_sandbox);
        assert!(config.scraping.browser.headless);
        assert!(!path.with_extension("json.corrupted").exists());
    }

    #[tokio::test]
    async fn corrupted_file_is_backed_up_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();

        assert_eq!(config.server.port, defaults::SERVER_PORT);
        assert!(path.with_extension("json.corrupted").exists());
    }
}
