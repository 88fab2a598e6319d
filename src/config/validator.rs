use std::collections::HashSet;

use crate::error::{AppError, Result};

use super::{Config, MAX_CONCURRENCY};

/// Validate a loaded config and surface every problem at once.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_exchange(config, &mut issues);
    validate_database(config, &mut issues);
    validate_pipelines(config, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "exchange `{}` config invalid:\n  - {}",
            config.exchange.name,
            issues.join("\n  - ")
        )))
    }
}

fn validate_exchange(config: &Config, issues: &mut Vec<String>) {
    if config.exchange.base_url.trim().is_empty() {
        issues.push("exchange.base_url must not be empty".to_string());
    }
    if config.exchange.connect_timeout_secs == 0 {
        issues.push("exchange.connect_timeout_secs must be positive".to_string());
    }
    if config.exchange.request_timeout_secs < config.exchange.connect_timeout_secs {
        issues.push(
            "exchange.request_timeout_secs must not be shorter than connect_timeout_secs"
                .to_string(),
        );
    }
}

fn validate_database(config: &Config, issues: &mut Vec<String>) {
    if config.database.url.trim().is_empty() {
        issues.push("database.url must not be empty".to_string());
    }
    if config.database.max_connections == 0 {
        issues.push("database.max_connections must be positive".to_string());
    }
}

fn validate_pipelines(config: &Config, issues: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();

    for pipeline in &config.pipelines {
        if !seen.insert(pipeline.kind) {
            duplicates.push(pipeline.kind.to_string());
        }
        if pipeline.concurrency == 0 {
            issues.push(format!(
                "pipeline `{}` needs a concurrency budget of at least 1",
                pipeline.kind
            ));
        } else if pipeline.concurrency > MAX_CONCURRENCY {
            issues.push(format!(
                "pipeline `{}` concurrency {} exceeds the limit of {}",
                pipeline.kind, pipeline.concurrency, MAX_CONCURRENCY
            ));
        }
        if pipeline.interval_ms == 0 {
            issues.push(format!(
                "pipeline `{}` needs a positive interval_ms",
                pipeline.kind
            ));
        }
    }

    if !duplicates.is_empty() {
        issues.push(format!(
            "pipelines configured more than once: {}",
            duplicates.join(", ")
        ));
    }

    if config.enabled_pipelines().next().is_none() {
        issues.push("at least one pipeline must be enabled".to_string());
    }
}
