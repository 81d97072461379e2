// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while turning one segment into relationship metrics.
///
/// Every variant is scoped to the segment being processed; none of them is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("Unable to resolve application for instance {instance_id}")]
    UnresolvedInstance { instance_id: i32 },

    #[error("Malformed span in segment {segment_id}: {reason}")]
    MalformedSpan { segment_id: String, reason: String },

    #[error("Dispatch sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Cannot merge metric {other} into {id}")]
    IdMismatch { id: String, other: String },

    #[error("Invalid metric id: {0}")]
    InvalidMetricId(String),
}

/// Errors raised while loading the collector configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
