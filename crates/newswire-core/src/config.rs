use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub keys: ApiKeysConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            ingest: IngestConfig::default(),
            sync: SyncConfig::default(),
            keys: ApiKeysConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Tenant that owns articles written by this process
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
    /// Countries to pull headlines for (ISO 3166-1 alpha-2, lowercase)
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,
    /// Topic slugs iterated per country
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Country used by the startup seed pass
    #[serde(default = "default_country")]
    pub default_country: String,
    /// Category used by the startup seed pass
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Seconds to wait after startup before the seed pass
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
    /// Max entries taken from a single feed fetch
    #[serde(default = "default_feed_entry_limit")]
    pub feed_entry_limit: usize,
    /// Page size requested from API sources
    #[serde(default = "default_api_page_size")]
    pub api_page_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tenant_id: default_tenant(),
            countries: default_countries(),
            categories: default_categories(),
            default_country: default_country(),
            default_category: default_category(),
            startup_delay_secs: default_startup_delay(),
            feed_entry_limit: default_feed_entry_limit(),
            api_page_size: default_api_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Pause between successive calls to the same source, milliseconds
    #[serde(default = "default_call_delay")]
    pub call_delay_ms: u64,
    /// Pause between country batches, milliseconds
    #[serde(default = "default_country_delay")]
    pub country_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            call_delay_ms: default_call_delay(),
            country_delay_ms: default_country_delay(),
        }
    }
}

/// Per-source API keys. Environment variables win over the config file;
/// a missing key disables the owning source for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    #[serde(default)]
    pub newsapi: Option<String>,
    #[serde(default)]
    pub gnews: Option<String>,
}

impl AppConfig {
    /// Load configuration from file, or use defaults if not found.
    /// API keys and the tenant id are overridable from the environment.
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Overlay environment variables onto the loaded file values
    fn apply_env(&mut self) {
        if let Ok(tenant) = std::env::var("NEWSWIRE_TENANT") {
            if !tenant.is_empty() {
                self.ingest.tenant_id = tenant;
            }
        }
        if let Ok(key) = std::env::var("NEWSAPI_KEY") {
            if !key.is_empty() {
                self.keys.newsapi = Some(key);
            }
        }
        if let Ok(key) = std::env::var("GNEWS_KEY") {
            if !key.is_empty() {
                self.keys.gnews = Some(key);
            }
        }
    }

    /// Get the configuration file path
    /// Always uses ~/.config/newswire/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newswire")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.general.data_dir.join("newswire.db")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newswire")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_countries() -> Vec<String> {
    vec!["us".to_string(), "gb".to_string()]
}

fn default_categories() -> Vec<String> {
    vec![
        "general".to_string(),
        "business".to_string(),
        "technology".to_string(),
        "sports".to_string(),
        "health".to_string(),
        "science".to_string(),
        "entertainment".to_string(),
    ]
}

fn default_country() -> String {
    "us".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

fn default_startup_delay() -> u64 {
    10
}

fn default_feed_entry_limit() -> usize {
    10
}

fn default_api_page_size() -> usize {
    20
}

fn default_timeout() -> u64 {
    8
}

fn default_call_delay() -> u64 {
    2000
}

fn default_country_delay() -> u64 {
    5000
}
