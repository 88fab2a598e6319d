use std::{fs, path::Path};

use crate::error::{AppError, Context, Result};

use super::{validator, Config};

pub const DEFAULT_CONFIG_PATH: &str = "assets/configs/bittrex.json";

/// Read, expand and validate the ingestion config at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    let mut config: Config = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;

    config.database.url = expand_env_vars(&config.database.url)?;
    config.exchange.base_url = expand_env_vars(&config.exchange.base_url)?;

    validator::validate_config(&config)?;

    Ok(config)
}

/// Replace each `${NAME}` in a config value with that environment variable.
///
/// Error messages never echo `value`, which may carry credentials.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let close = tail
            .find('}')
            .ok_or_else(|| AppError::message("config value has an unclosed `${` placeholder"))?;

        let name = &tail[..close];
        if name.is_empty() {
            return Err(AppError::message("config value has an empty `${}` placeholder"));
        }
        let resolved = std::env::var(name).map_err(|_| {
            AppError::message(format!(
                "environment variable `{name}` referenced by the config is not set"
            ))
        })?;

        expanded.push_str(&resolved);
        rest = &tail[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SnapshotKind;

    #[test]
    fn loads_bundled_config() {
        std::env::set_var("DATABASE_URL", "postgres://ingest@localhost/markets");
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);

        let config = load_config(&path).expect("bundled config loads");

        assert_eq!(config.exchange.name, "bittrex");
        assert_eq!(config.database.url, "postgres://ingest@localhost/markets");
        let book = config
            .pipelines
            .iter()
            .find(|pipeline| pipeline.kind == SnapshotKind::OrderBook)
            .expect("order book pipeline");
        assert_eq!(book.interval_ms, 1_000);
        assert_eq!(book.concurrency, 15);
    }

    #[test]
    fn missing_pipelines_fall_back_to_defaults() {
        let json = r#"{
            "exchange": { "name": "bittrex", "base_url": "https://bittrex.com/api/v1.1/public" },
            "database": { "url": "postgres://localhost/markets" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.pipelines.len(), SnapshotKind::ALL.len());
        assert_eq!(config.exchange.connect_timeout_secs, 60);
        assert!(config.markets.only_active);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn expands_placeholders() {
        std::env::set_var("INGEST_TEST_HOST", "db.internal");
        let expanded = expand_env_vars("postgres://${INGEST_TEST_HOST}/markets").unwrap();
        assert_eq!(expanded, "postgres://db.internal/markets");
    }

    #[test]
    fn leaves_plain_values_alone() {
        let expanded = expand_env_vars("postgres://localhost/markets").unwrap();
        assert_eq!(expanded, "postgres://localhost/markets");
    }

    #[test]
    fn rejects_unclosed_placeholder() {
        let err = expand_env_vars("postgres://${HOST").expect_err("should fail");
        assert!(err.to_string().contains("unclosed"), "{err}");
    }

    #[test]
    fn rejects_empty_placeholder() {
        let err = expand_env_vars("postgres://${}/markets").expect_err("should fail");
        assert!(err.to_string().contains("empty"), "{err}");
    }

    #[test]
    fn names_the_missing_variable() {
        std::env::remove_var("INGEST_TEST_UNSET");
        let err = expand_env_vars("${INGEST_TEST_UNSET}").expect_err("should fail");
        assert!(err.to_string().contains("INGEST_TEST_UNSET"), "{err}");
    }
}
