use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Socius social backend core
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "socius-server", version, about = "Socius live delivery and feed server")]
pub struct Config {
    /// Port the WebSocket transport listens on
    #[arg(long, env = "SOCIUS_PORT", default_value = "8700")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "SOCIUS_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./socius.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "SOCIUS_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Session lifetime in days for tokens issued by the session verifier
    #[arg(long, env = "SOCIUS_SESSION_TTL_DAYS", default_value = "7")]
    pub session_ttl_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8700,
            bind_address: "0.0.0.0".to_string(),
            config: "./socius.toml".to_string(),
            json_logs: false,
            generate_config: false,
            session_ttl_days: 7,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (SOCIUS_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("SOCIUS_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Socius Server Configuration
# Place this file at ./socius.toml or specify with --config <path>
# All settings can be overridden via environment variables (SOCIUS_PORT, etc.)
# or CLI flags (--port, etc.)

# WebSocket transport port (default: 8700)
# port = 8700

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Session lifetime in days for bearer tokens (default: 7)
# session_ttl_days = 7
"#
    .to_string()
}
