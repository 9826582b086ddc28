use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Read `RAPPORT_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("RAPPORT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("RAPPORT_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("RAPPORT_DB_PATH").unwrap_or_else(|| "rapport.db".into()).into();
        let host = lookup("RAPPORT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("RAPPORT_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("RAPPORT_PORT must be a port number")?;

        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
        })
    }
}
