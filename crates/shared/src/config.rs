//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Payment gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JWT configuration values.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token expiration in days.
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
}

fn default_token_expiry_days() -> i64 {
    7
}

/// Payment gateway configuration.
///
/// The key pair here is the process-wide fallback used for milkmen who have
/// not configured their own credentials. Both halves are optional: a
/// deployment without gateway access can still record purchases and create
/// vendor-initiated payment records.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Default gateway key id (fallback for unconfigured milkmen).
    pub key_id: Option<String>,
    /// Default gateway key secret (fallback for unconfigured milkmen).
    pub key_secret: Option<String>,
    /// Gateway API base URL.
    #[serde(default = "default_gateway_base")]
    pub api_base: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            api_base: default_gateway_base(),
        }
    }
}

fn default_gateway_base() -> String {
    "https://api.razorpay.com/v1".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MILKBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
