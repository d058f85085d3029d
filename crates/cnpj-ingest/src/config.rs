//! Configuration management

use crate::error::{IngestError, Result};
use serde::Serialize;
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Monthly directory of the Receita Federal open-data release
pub const DEFAULT_BASE_URL: &str =
    "https://arquivos.receitafederal.gov.br/dados/cnpj/dados_abertos_cnpj/2025-11/";

/// Default PostgreSQL port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Default timeout of the remote size probe in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 20;

/// Ingestion configuration
#[derive(Debug, Clone, Serialize)]
pub struct IngestConfig {
    pub base_url: String,
    /// Where downloaded archives are kept between runs
    pub output_dir: PathBuf,
    /// Where archive members are extracted, flat
    pub extract_dir: PathBuf,
    pub database: DatabaseConfig,
    pub probe_timeout_secs: u64,
    /// Replaces the default chunk size of the large tables
    pub chunk_size: Option<usize>,
}

/// PostgreSQL credentials
#[derive(Clone, Serialize)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl IngestConfig {
    /// Load configuration from the process environment
    ///
    /// `.env` files are loaded by the caller before this runs.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| IngestError::Config(format!("{} is not set", key)))
        };

        let config = IngestConfig {
            base_url: var("CNPJ_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            output_dir: PathBuf::from(required("OUTPUT_FILES_PATH")?),
            extract_dir: PathBuf::from(required("EXTRACTED_FILES_PATH")?),
            database: DatabaseConfig {
                user: required("DB_USER")?,
                password: lookup("DB_PASSWORD").unwrap_or_default(),
                host: required("DB_HOST")?,
                port: parse_var("DB_PORT", var("DB_PORT"))?.unwrap_or(DEFAULT_DB_PORT),
                name: required("DB_NAME")?,
            },
            probe_timeout_secs: parse_var("CNPJ_PROBE_TIMEOUT_SECS", var("CNPJ_PROBE_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
            chunk_size: parse_var("CNPJ_CHUNK_SIZE", var("CNPJ_CHUNK_SIZE"))?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(IngestError::Config("Base URL cannot be empty".to_string()));
        }

        if self.output_dir.as_os_str().is_empty() || self.extract_dir.as_os_str().is_empty() {
            return Err(IngestError::Config("Working directories cannot be empty".to_string()));
        }

        if self.database.port == 0 {
            return Err(IngestError::Config("Database port must be greater than 0".to_string()));
        }

        if self.probe_timeout_secs == 0 {
            return Err(IngestError::Config("Probe timeout must be greater than 0".to_string()));
        }

        if self.chunk_size == Some(0) {
            return Err(IngestError::Config("Chunk size must be greater than 0".to_string()));
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| IngestError::Config(format!("Invalid {} '{}': {}", key, v, e)))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("OUTPUT_FILES_PATH", "/data/zip"),
            ("EXTRACTED_FILES_PATH", "/data/csv"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "secret"),
            ("DB_HOST", "localhost"),
            ("DB_NAME", "dados_rfb"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    fn load(map: &HashMap<String, String>) -> Result<IngestConfig> {
        IngestConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&vars(&[])).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output_dir, PathBuf::from("/data/zip"));
        assert_eq!(config.database.port, DEFAULT_DB_PORT);
        assert_eq!(config.probe_timeout(), Duration::from_secs(20));
        assert_eq!(config.chunk_size, None);
    }

    #[test]
    fn test_overrides() {
        let config = load(&vars(&[
            ("CNPJ_BASE_URL", "http://mirror.local/cnpj/"),
            ("DB_PORT", "6543"),
            ("CNPJ_PROBE_TIMEOUT_SECS", "5"),
            ("CNPJ_CHUNK_SIZE", "1000"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://mirror.local/cnpj/");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.probe_timeout_secs, 5);
        assert_eq!(config.chunk_size, Some(1000));
    }

    #[test]
    fn test_missing_required_variable() {
        let mut map = vars(&[]);
        map.remove("EXTRACTED_FILES_PATH");

        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("EXTRACTED_FILES_PATH"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&vars(&[("DB_PORT", "not-a-port")])).is_err());
        assert!(load(&vars(&[("CNPJ_CHUNK_SIZE", "0")])).is_err());
        assert!(load(&vars(&[("CNPJ_PROBE_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_password_is_not_exposed() {
        let config = load(&vars(&[])).unwrap();

        assert!(!format!("{:?}", config).contains("secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("secret"));
    }
}
