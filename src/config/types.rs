// Configuration types module
// Defines the process configuration read at startup

use serde::Deserialize;
use std::path::PathBuf;

/// Placeholder shared secret used when no key is configured
pub const DEFAULT_VIP_KEY: &str = "VIP";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub static_files: StaticConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Backing store for the configuration document
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON file holding the `free` / `order` lists
    pub path: PathBuf,
    /// Shared secret required on writes
    pub vip_key: String,
}

impl StoreConfig {
    /// Whether the shared secret was left at its placeholder value
    pub fn uses_default_key(&self) -> bool {
        self.vip_key == DEFAULT_VIP_KEY
    }
}

/// Static asset serving
#[derive(Debug, Deserialize, Clone)]
pub struct StaticConfig {
    pub root: PathBuf,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Write access lines for failed (4xx/5xx) requests
    pub access_log: bool,
    /// Access log format (common, combined, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}
