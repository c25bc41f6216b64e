//! Command-line plumbing shared by the transfer binaries

use crate::config::{ConnectionDescriptor, ConnectionParams, CONNECTION_URL_ENV, DEFAULT_PORT};
use crate::error::Result;
use clap::Args;
use tracing_subscriber::EnvFilter;

/// Warehouse credential flags
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub database: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Extra connection-string parameters, e.g. `sslmode=require`
    #[arg(long)]
    pub url_parameters: Option<String>,

    /// Full connection string; overrides the individual fields
    #[arg(long)]
    pub db_connection_url: Option<String>,
}

impl ConnectionArgs {
    pub fn to_params(&self, env_connection_url: Option<String>) -> ConnectionParams {
        ConnectionParams {
            db_connection_url: self.db_connection_url.clone(),
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            port: Some(self.port),
            url_parameters: self.url_parameters.clone(),
            env_connection_url,
        }
    }

    /// Resolve against the `DB_CONNECTION_URL` environment fallback.
    pub fn resolve_from_env(&self) -> Result<ConnectionDescriptor> {
        self.to_params(std::env::var(CONNECTION_URL_ENV).ok()).resolve()
    }
}

/// Boolean flags arrive as strings; only the spellings of "true" count.
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "True" | "true" | "TRUE")
}

/// `RUST_LOG`-driven fmt subscriber, `info` by default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
