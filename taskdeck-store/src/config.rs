/// Configuration for the store
///
/// Loads from environment variables, with a `.env` file honored in
/// development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool upper bound (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: idle connections kept warm (default: 2)
/// - `DATABASE_CONNECT_TIMEOUT_SECONDS`: acquire timeout (default: 30)

use serde::{Deserialize, Serialize};
use std::env;

use crate::db::pool::DatabaseConfig;

/// Store configuration loaded from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Minimum number of idle connections to keep warm
    pub min_connections: u32,

    /// Timeout for acquiring a connection (seconds)
    pub connect_timeout_seconds: u64,
}

impl StoreConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let min_connections = env::var("DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u32>()?;

        let connect_timeout_seconds = env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;

        Ok(Self {
            database_url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
        })
    }

    /// Converts into the pool-layer configuration.
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..DatabaseConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_conversion() {
        let config = StoreConfig {
            database_url: "postgresql://taskdeck@localhost/taskdeck".to_string(),
            max_connections: 7,
            min_connections: 1,
            connect_timeout_seconds: 5,
        };

        let db = config.database();
        assert_eq!(db.url, config.database_url);
        assert_eq!(db.max_connections, 7);
        assert_eq!(db.min_connections, 1);
        assert_eq!(db.connect_timeout_seconds, 5);
    }
}
