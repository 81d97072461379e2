// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use crate::aggregator_service::SINK_BUFFER_SIZE;
use crate::error::ConfigError;
use crate::services::{ApdexThresholds, DEFAULT_APDEX_THRESHOLD_MS};

const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 10;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Collector configuration, read from `TOPOLOGY_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// Apdex threshold for applications without their own, in milliseconds
    pub apdex_default_threshold_ms: u64,
    /// Raw `applicationId:millis` threshold overrides
    pub apdex_thresholds: String,
    /// how often to flush merged metrics, in seconds
    pub flush_interval_secs: u64,
    /// capacity of the channel between listeners and the aggregator
    pub sink_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            apdex_default_threshold_ms: DEFAULT_APDEX_THRESHOLD_MS,
            apdex_thresholds: String::new(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            sink_buffer_size: SINK_BUFFER_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_level = env::var("TOPOLOGY_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());
        let apdex_default_threshold_ms = env::var("TOPOLOGY_APDEX_DEFAULT_THRESHOLD_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_APDEX_THRESHOLD_MS);
        let apdex_thresholds = env::var("TOPOLOGY_APDEX_THRESHOLDS").unwrap_or_default();
        let flush_interval_secs = env::var("TOPOLOGY_FLUSH_INTERVAL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS);
        let sink_buffer_size = env::var("TOPOLOGY_SINK_BUFFER_SIZE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(SINK_BUFFER_SIZE);

        let config = Self {
            log_level,
            apdex_default_threshold_ms,
            apdex_thresholds,
            flush_interval_secs,
            sink_buffer_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apdex_default_threshold_ms == 0 {
            return Err(ConfigError::Invalid(
                "TOPOLOGY_APDEX_DEFAULT_THRESHOLD_MS must be greater than 0".to_string(),
            ));
        }

        if self.flush_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "TOPOLOGY_FLUSH_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.sink_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "TOPOLOGY_SINK_BUFFER_SIZE must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    pub fn apdex_thresholds(&self) -> ApdexThresholds {
        ApdexThresholds::from_env_string(self.apdex_default_threshold_ms, &self.apdex_thresholds)
    }
}
