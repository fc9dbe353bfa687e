use crate::config::{Config, LogFormat, StorageBackend};
use crate::core::engine::RemainderPolicy;
use crate::core::errors::LedgerError;
use crate::core::recalculation::RecomputeMode;
use std::collections::HashMap;
use std::time::Duration;

fn load(pairs: &[(&str, &str)]) -> Result<Config, LedgerError> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults_apply_when_unset() {
    let config = load(&[]).unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.log_format, LogFormat::Pretty);
    assert_eq!(config.recompute_mode, RecomputeMode::Inline);
    assert_eq!(config.split_remainder, RemainderPolicy::Absorb);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.storage_backend(), Ok(StorageBackend::SqliteMemory));
}

#[test]
fn test_overrides_are_parsed() {
    let config = load(&[
        ("PORT", "8080"),
        ("DATABASE_URL", "sqlite://data/ledger.db"),
        ("LOG_LEVEL", "debug"),
        ("LOG_FORMAT", "JSON"),
        ("RECOMPUTE_MODE", "deferred"),
        ("SPLIT_REMAINDER", "ignore"),
        ("REQUEST_TIMEOUT_SECS", "5"),
    ])
    .unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.recompute_mode, RecomputeMode::Deferred);
    assert_eq!(config.split_remainder, RemainderPolicy::Ignore);
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(
        config.storage_backend(),
        Ok(StorageBackend::SqliteFile("data/ledger.db".to_string()))
    );
}

#[test]
fn test_malformed_values_are_rejected() {
    for pairs in [
        [("PORT", "eighty")],
        [("PORT", "70000")],
        [("RECOMPUTE_MODE", "sometimes")],
        [("LOG_FORMAT", "xml")],
        [("SPLIT_REMAINDER", "round")],
        [("REQUEST_TIMEOUT_SECS", "-1")],
    ] {
        assert!(
            matches!(load(&pairs), Err(LedgerError::ConfigError(_))),
            "{:?} accepted",
            pairs
        );
    }
}

#[test]
fn test_storage_backend_variants() {
    let backend = |url: &str| load(&[("DATABASE_URL", url)]).unwrap().storage_backend();
    assert_eq!(backend("memory"), Ok(StorageBackend::Memory));
    assert_eq!(backend("sqlite::memory:"), Ok(StorageBackend::SqliteMemory));
    assert_eq!(backend("sqlite:ledger.db"), Ok(StorageBackend::SqliteFile("ledger.db".to_string())));
    assert!(matches!(backend("postgres://localhost/db"), Err(LedgerError::ConfigError(_))));
    assert!(matches!(backend("sqlite:"), Err(LedgerError::ConfigError(_))));
}

#[test]
fn test_debug_output_hides_database_url() {
    let config = load(&[("DATABASE_URL", "sqlite:/secret/path.db")]).unwrap();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}
