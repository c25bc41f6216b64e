//! Connection resolution
//!
//! Turns the loose credential flags (or a ready-made connection string) into a
//! single `ConnectionDescriptor`. Resolution is pure: the environment fallback is
//! handed in by the caller and nothing is written back to the process.

use crate::error::{Result, TransferError};
use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Redshift is driven over the PostgreSQL wire protocol.
pub const DRIVER: &str = "postgresql";

/// Canonical Redshift port
pub const DEFAULT_PORT: u16 = 5439;

/// Schema that unqualified tables land in
pub const DEFAULT_SCHEMA: &str = "public";

/// Environment variable consulted when no explicit connection is given
pub const CONNECTION_URL_ENV: &str = "DB_CONNECTION_URL";

const ACCEPTED_SCHEMES: [&str; 3] = ["postgres", "postgresql", "redshift"];

/// Raw connection inputs as supplied on the command line or by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub db_connection_url: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
    pub url_parameters: Option<String>,
    /// Value of `DB_CONNECTION_URL`, read by the caller
    pub env_connection_url: Option<String>,
}

/// A validated warehouse endpoint. Immutable for the duration of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    driver: &'static str,
    url: Url,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ConnectionParams {
    /// Resolve into a descriptor.
    ///
    /// Precedence: explicit connection string, then a complete
    /// host/username/database set, then the environment fallback.
    pub fn resolve(&self) -> Result<ConnectionDescriptor> {
        if let Some(url) = present(&self.db_connection_url) {
            return ConnectionDescriptor::from_url(url);
        }

        let host = present(&self.host);
        let username = present(&self.username);
        let database = present(&self.database);

        match (host, username, database) {
            (Some(host), Some(username), Some(database)) => ConnectionDescriptor::from_fields(
                host,
                self.port.unwrap_or(DEFAULT_PORT),
                username,
                self.password.as_deref(),
                database,
                present(&self.url_parameters),
            ),
            (None, None, None) => match present(&self.env_connection_url) {
                Some(url) => ConnectionDescriptor::from_url(url),
                None => Err(TransferError::Configuration(
                    "a connection requires one of: --db-connection-url; \
                     --host, --database and --username; \
                     or DB_CONNECTION_URL set as an environment variable"
                        .to_string(),
                )),
            },
            _ => {
                let missing: Vec<&str> = [
                    ("--host", host),
                    ("--database", database),
                    ("--username", username),
                ]
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(flag, _)| *flag)
                .collect();
                Err(TransferError::Configuration(format!(
                    "incomplete connection fields, missing {}",
                    missing.join(" and ")
                )))
            }
        }
    }
}

impl ConnectionDescriptor {
    /// Parse a full connection string, filling in the default port.
    pub fn from_url(raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw)
            .map_err(|e| TransferError::Configuration(format!("invalid connection string: {}", e)))?;

        if !ACCEPTED_SCHEMES.contains(&url.scheme()) {
            return Err(TransferError::Configuration(format!(
                "unsupported connection scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(TransferError::Configuration(
                "connection string has no host".to_string(),
            ));
        }
        if url.username().is_empty() {
            return Err(TransferError::Configuration(
                "connection string has no username".to_string(),
            ));
        }
        if url.path().trim_matches('/').is_empty() {
            return Err(TransferError::Configuration(
                "connection string has no database".to_string(),
            ));
        }

        if url.port().is_none() {
            url.set_port(Some(DEFAULT_PORT)).map_err(|_| {
                TransferError::Configuration("connection string cannot carry a port".to_string())
            })?;
        }

        Ok(Self { driver: DRIVER, url })
    }

    /// Build from discrete fields. Userinfo is percent-encoded by `url`.
    pub fn from_fields(
        host: &str,
        port: u16,
        username: &str,
        password: Option<&str>,
        database: &str,
        url_parameters: Option<&str>,
    ) -> Result<Self> {
        let invalid = |what: &str| TransferError::Configuration(format!("invalid {}", what));

        let mut url = Url::parse(&format!("{}://localhost", DRIVER))
            .map_err(|e| TransferError::Configuration(e.to_string()))?;
        url.set_host(Some(host)).map_err(|_| invalid("host"))?;
        url.set_port(Some(port)).map_err(|_| invalid("port"))?;
        url.set_username(username).map_err(|_| invalid("username"))?;
        url.set_password(password.filter(|p| !p.is_empty()))
            .map_err(|_| invalid("password"))?;
        url.set_path(&format!("/{}", database));
        url.set_query(url_parameters.map(|p| p.trim_start_matches('?')));

        Ok(Self { driver: DRIVER, url })
    }

    pub fn driver(&self) -> &'static str {
        self.driver
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.url.port().unwrap_or(DEFAULT_PORT)
    }

    pub fn username(&self) -> &str {
        self.url.username()
    }

    pub fn database(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    pub fn url_parameters(&self) -> Option<&str> {
        self.url.query()
    }

    /// Connection string with the driver scheme, password included.
    pub fn connection_string(&self) -> String {
        let mut url = self.url.clone();
        // Non-special to non-special scheme swaps are always accepted.
        let _ = url.set_scheme(self.driver);
        url.to_string()
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        PgConnectOptions::from_str(&self.connection_string())
            .map_err(|e| TransferError::Configuration(e.to_string()))
    }
}

/// Never prints the password.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}@{}:{}/{}",
            self.driver,
            self.username(),
            self.host(),
            self.port(),
            self.database()
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("target", &self.to_string())
            .field("url_parameters", &self.url_parameters())
            .finish()
    }
}
