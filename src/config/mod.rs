// Configuration module entry point
// Loads process configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, StaticConfig, DEFAULT_VIP_KEY};

/// Environment options recognized outside the prefixed namespace
#[derive(Debug, Default, Clone)]
pub struct LegacyEnv {
    /// `CONFIG_FILE` - backing store path
    pub config_file: Option<String>,
    /// `VIP_KEY` - shared secret
    pub vip_key: Option<String>,
    /// `PORT` - listen port
    pub port: Option<String>,
}

impl LegacyEnv {
    pub fn from_process() -> Self {
        Self {
            config_file: std::env::var("CONFIG_FILE").ok(),
            vip_key: std::env::var("VIP_KEY").ok(),
            port: std::env::var("PORT").ok(),
        }
    }
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The file is optional; defaults and environment fill in the rest
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, &LegacyEnv::from_process())
    }

    /// Same as [`Config::load_from`] with explicit legacy overrides
    pub fn load_with_env(config_path: &str, env: &LegacyEnv) -> Result<Self, config::ConfigError> {
        let port = env
            .port
            .as_deref()
            .map(|p| {
                p.trim().parse::<u16>().map_err(|e| {
                    config::ConfigError::Message(format!("Invalid PORT value '{p}': {e}"))
                })
            })
            .transpose()?;

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("LISTKEEPER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 80)?
            .set_default("store.path", "/data/config.json")?
            .set_default("store.vip_key", DEFAULT_VIP_KEY)?
            .set_default("static_files.root", "/app/static")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "listkeeper")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_override_option("store.path", env.config_file.clone())?
            .set_override_option("store.vip_key", env.vip_key.clone())?
            .set_override_option("server.port", port.map(i64::from))?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
