//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod test_metrics;

use chrono::{TimeZone, Utc};
use content_dispatch::config::Config;
use content_dispatch::core::ContentRecord;

/// A config with every required GitHub field set and the API pointed at `base_url`.
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.github.owner = "acme".to_string();
    config.github.repo = "site".to_string();
    config.github.token = "test-token".to_string();
    config.github.api_base_url = base_url.to_string();
    config.github.user_agent = "content-dispatch-tests/1.0".to_string();
    config
}

/// `n` records with ids starting at `first_id`.
pub fn records_from(first_id: i64, n: i64) -> Vec<ContentRecord> {
    (first_id..first_id + n)
        .map(|id| {
            ContentRecord::new(
                id,
                format!("Page {id}"),
                "textPage",
                Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            )
        })
        .collect()
}

pub fn records(n: i64) -> Vec<ContentRecord> {
    records_from(1, n)
}
