//! List query configuration with precedence and validation
use listwise_core::{
    constants::{
        DEFAULT_CURRENT_PAGE, DEFAULT_DATA_PROVIDER, DEFAULT_OVERTIME_INTERVAL_MS,
        DEFAULT_PAGE_SIZE, ENV_CONFIG_PATH, ENV_DATA_PROVIDER, ENV_LIVE_MODE,
        ENV_OVERTIME_INTERVAL_MS, ENV_PAGE_SIZE, ENV_PAGINATION_MODE, ENV_STALE_TIME_MS,
        NOTIFICATION_KEY_SUFFIX,
    },
    Error, LiveMode, PaginationMode, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Overtime monitor defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeConfig {
    pub enabled: bool,
    /// Tick interval in milliseconds
    pub interval_ms: u64,
    /// Thresholds in milliseconds, applied when a query configures none
    pub thresholds_ms: Vec<u64>,
}

impl Default for OvertimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_OVERTIME_INTERVAL_MS,
            thresholds_ms: Vec::new(),
        }
    }
}

impl OvertimeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn thresholds(&self) -> Vec<Duration> {
        self.thresholds_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

/// Defaults applied to every list query of a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub default_page_size: u32,
    pub default_current_page: u32,
    pub default_pagination_mode: PaginationMode,
    /// Provider used when neither the call site nor the resource names one
    pub default_data_provider: String,
    /// Live mode for queries that do not choose one
    pub live_mode: LiveMode,
    /// How long a successful result is served without refetching
    pub stale_time_ms: u64,
    pub overtime: OvertimeConfig,
    pub notification_key_suffix: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            default_current_page: DEFAULT_CURRENT_PAGE,
            default_pagination_mode: PaginationMode::Server,
            default_data_provider: DEFAULT_DATA_PROVIDER.to_string(),
            live_mode: LiveMode::Off,
            stale_time_ms: 0,
            overtime: OvertimeConfig::default(),
            notification_key_suffix: NOTIFICATION_KEY_SUFFIX.to_string(),
        }
    }
}

impl ListConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    /// Reject values no query could run with
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::configuration("default_page_size must be at least 1"));
        }
        if self.default_current_page == 0 {
            return Err(Error::configuration(
                "default_current_page must be at least 1",
            ));
        }
        if self.default_data_provider.trim().is_empty() {
            return Err(Error::configuration(
                "default_data_provider must not be empty",
            ));
        }
        if self.overtime.interval_ms == 0 {
            return Err(Error::configuration(
                "overtime.interval_ms must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
    /// Assembled in code through [`ListConfigBuilder`]
    Programmatic,
}

/// Configuration together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: ListConfig,
    pub source: ConfigSource,
}

/// Builder for list configurations
#[derive(Debug, Clone, Default)]
pub struct ListConfigBuilder {
    config: ListConfig,
}

impl ListConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one returned by the loader
    pub fn from_config(config: ListConfig) -> Self {
        Self { config }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.config.default_page_size = page_size;
        self
    }

    pub fn with_current_page(mut self, current_page: u32) -> Self {
        self.config.default_current_page = current_page;
        self
    }

    pub fn with_pagination_mode(mut self, mode: PaginationMode) -> Self {
        self.config.default_pagination_mode = mode;
        self
    }

    pub fn with_data_provider(mut self, name: impl Into<String>) -> Self {
        self.config.default_data_provider = name.into();
        self
    }

    pub fn with_live_mode(mut self, mode: LiveMode) -> Self {
        self.config.live_mode = mode;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.config.stale_time_ms = u64::try_from(stale_time.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_overtime(mut self, overtime: OvertimeConfig) -> Self {
        self.config.overtime = overtime;
        self
    }

    pub fn with_notification_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.notification_key_suffix = suffix.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ListConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Values a config file or the environment may override
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverlay {
    default_page_size: Option<u32>,
    default_current_page: Option<u32>,
    default_pagination_mode: Option<PaginationMode>,
    default_data_provider: Option<String>,
    live_mode: Option<LiveMode>,
    stale_time_ms: Option<u64>,
    overtime: Option<OvertimeOverlay>,
    notification_key_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OvertimeOverlay {
    enabled: Option<bool>,
    interval_ms: Option<u64>,
    thresholds_ms: Option<Vec<u64>>,
}

impl ConfigOverlay {
    fn apply(self, config: &mut ListConfig) {
        if let Some(page_size) = self.default_page_size {
            config.default_page_size = page_size;
        }
        if let Some(current_page) = self.default_current_page {
            config.default_current_page = current_page;
        }
        if let Some(mode) = self.default_pagination_mode {
            config.default_pagination_mode = mode;
        }
        if let Some(provider) = self.default_data_provider {
            config.default_data_provider = provider;
        }
        if let Some(live_mode) = self.live_mode {
            config.live_mode = live_mode;
        }
        if let Some(stale_time_ms) = self.stale_time_ms {
            config.stale_time_ms = stale_time_ms;
        }
        if let Some(overtime) = self.overtime {
            if let Some(enabled) = overtime.enabled {
                config.overtime.enabled = enabled;
            }
            if let Some(interval_ms) = overtime.interval_ms {
                config.overtime.interval_ms = interval_ms;
            }
            if let Some(thresholds_ms) = overtime.thresholds_ms {
                config.overtime.thresholds_ms = thresholds_ms;
            }
        }
        if let Some(suffix) = self.notification_key_suffix {
            config.notification_key_suffix = suffix;
        }
    }
}

/// Configuration loader that handles precedence:
/// defaults, then the JSON file named by `LISTWISE_CONFIG`, then `LISTWISE_*` variables
pub struct ListConfigLoader;

impl ListConfigLoader {
    /// Load configuration from the process environment
    pub fn load() -> Result<LoadedConfig> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load configuration reading variables through `env`
    pub fn load_with<F>(env: F) -> Result<LoadedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ListConfig::default();
        let mut source = ConfigSource::Default;

        if let Some(path) = env(ENV_CONFIG_PATH).filter(|path| !path.trim().is_empty()) {
            let path = PathBuf::from(path);
            Self::load_from_file(&path)?.apply(&mut config);
            source = ConfigSource::ConfigFile(path);
        }

        if let Some(overlay) = Self::load_from_env(&env)? {
            overlay.apply(&mut config);
            source = ConfigSource::EnvironmentVariable("LISTWISE_*".to_string());
        }

        config.validate()?;
        tracing::debug!(?source, "Loaded list configuration");
        Ok(LoadedConfig { config, source })
    }

    fn load_from_file(path: &Path) -> Result<ConfigOverlay> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "invalid config file {}: {e}",
                path.display()
            ))
        })
    }

    fn load_from_env<F>(env: &F) -> Result<Option<ConfigOverlay>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut has_env_config = false;
        let mut overlay = ConfigOverlay::default();

        if let Some(value) = env(ENV_PAGE_SIZE) {
            overlay.default_page_size = Some(parse_number(ENV_PAGE_SIZE, &value)?);
            has_env_config = true;
        }

        if let Some(value) = env(ENV_PAGINATION_MODE) {
            overlay.default_pagination_mode = Some(PaginationMode::from_str(&value)?);
            has_env_config = true;
        }

        if let Some(value) = env(ENV_LIVE_MODE) {
            overlay.live_mode = Some(LiveMode::from_str(&value)?);
            has_env_config = true;
        }

        if let Some(value) = env(ENV_STALE_TIME_MS) {
            overlay.stale_time_ms = Some(parse_number(ENV_STALE_TIME_MS, &value)?);
            has_env_config = true;
        }

        if let Some(value) = env(ENV_OVERTIME_INTERVAL_MS) {
            overlay.overtime = Some(OvertimeOverlay {
                interval_ms: Some(parse_number(ENV_OVERTIME_INTERVAL_MS, &value)?),
                ..OvertimeOverlay::default()
            });
            has_env_config = true;
        }

        if let Some(value) = env(ENV_DATA_PROVIDER) {
            overlay.default_data_provider = Some(value);
            has_env_config = true;
        }

        Ok(has_env_config.then_some(overlay))
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("{name} must be a number, got '{value}'")))
}
