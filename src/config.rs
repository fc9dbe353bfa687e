use crate::core::engine::RemainderPolicy;
use crate::core::errors::LedgerError;
use crate::core::recalculation::RecomputeMode;
use dotenv::dotenv;
use once_cell::sync::OnceCell;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LedgerError::ConfigError(format!("unknown log format `{}`", other))),
        }
    }
}

/// Where the ledger lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    SqliteMemory,
    SqliteFile(String),
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub recompute_mode: RecomputeMode,
    pub split_remainder: RemainderPolicy,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("recompute_mode", &self.recompute_mode)
            .field("split_remainder", &self.split_remainder)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, LedgerError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys take their defaults;
    /// set but malformed keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| LedgerError::ConfigError(format!("invalid PORT `{}`", raw)))?,
            None => 3000,
        };
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| LedgerError::ConfigError(format!("invalid REQUEST_TIMEOUT_SECS `{}`", raw)))?,
            None => Duration::from_secs(30),
        };

        Ok(Self {
            port,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: lookup("LOG_FORMAT").map(|v| v.parse()).transpose()?.unwrap_or_default(),
            recompute_mode: lookup("RECOMPUTE_MODE").map(|v| v.parse()).transpose()?.unwrap_or_default(),
            split_remainder: lookup("SPLIT_REMAINDER").map(|v| v.parse()).transpose()?.unwrap_or_default(),
            request_timeout,
        })
    }

    pub fn storage_backend(&self) -> Result<StorageBackend, LedgerError> {
        let url = self.database_url.trim();
        if url == "memory" {
            return Ok(StorageBackend::Memory);
        }
        match url.strip_prefix("sqlite:") {
            Some(":memory:") => Ok(StorageBackend::SqliteMemory),
            Some(path) if !path.is_empty() => Ok(StorageBackend::SqliteFile(path.trim_start_matches("//").to_string())),
            _ => Err(LedgerError::ConfigError("unsupported DATABASE_URL".to_string())),
        }
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Process-wide config, loaded from the environment on first use.
pub fn config() -> Result<&'static Config, LedgerError> {
    CONFIG.get_or_try_init(Config::from_env)
}
