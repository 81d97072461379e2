// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collaborators the listener depends on, plus in-memory implementations of the lookup services.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::MetricError;
use crate::metric::RelationshipMetric;

/// Threshold used for applications without a configured value, in milliseconds.
pub const DEFAULT_APDEX_THRESHOLD_MS: u64 = 2000;

/// Maps an application instance to the application that owns it.
pub trait InstanceResolver: Send + Sync {
    fn resolve(&self, instance_id: i32) -> Option<i32>;
}

/// Supplies the Apdex satisfaction threshold of an application, in milliseconds.
pub trait ThresholdProvider: Send + Sync {
    fn threshold(&self, application_id: i32) -> u64;
}

/// Identity of a dispatch graph: which graph, and which entity type flows through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphKey {
    pub graph_id: u32,
    pub entity_type: &'static str,
}

/// Graph that receives application relationship metrics.
pub const APPLICATION_REFERENCE_METRIC_GRAPH: GraphKey = GraphKey {
    graph_id: 106,
    entity_type: "application_reference_metric",
};

/// Downstream processing graph that takes ownership of finished metrics.
///
/// Submission must not block; merge by id and persistence are the sink's job.
pub trait DispatchSink: Send + Sync {
    fn graph_key(&self) -> GraphKey;

    /// Hands one metric over. Returns [`MetricError::SinkUnavailable`] when it cannot be accepted.
    fn submit(&self, metric: RelationshipMetric) -> Result<(), MetricError>;
}

/// Instance to application mapping kept in memory.
#[derive(Debug, Default)]
pub struct InstanceCache {
    applications: RwLock<HashMap<i32, i32>>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, instance_id: i32, application_id: i32) {
        self.applications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance_id, application_id);
    }
}

impl FromIterator<(i32, i32)> for InstanceCache {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        Self {
            applications: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl InstanceResolver for InstanceCache {
    fn resolve(&self, instance_id: i32) -> Option<i32> {
        self.applications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&instance_id)
            .copied()
    }
}

/// Per-application Apdex thresholds with a fallback for unconfigured applications.
#[derive(Debug)]
pub struct ApdexThresholds {
    default_ms: u64,
    thresholds: RwLock<HashMap<i32, u64>>,
}

impl Default for ApdexThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_APDEX_THRESHOLD_MS)
    }
}

impl ApdexThresholds {
    pub fn new(default_ms: u64) -> Self {
        Self {
            default_ms,
            thresholds: RwLock::new(HashMap::new()),
        }
    }

    /// Parses `applicationId:millis` pairs. Pairs are separated by whitespace or commas;
    /// anything that does not parse is ignored.
    pub fn from_env_string(default_ms: u64, env_thresholds: &str) -> Self {
        let normalized = env_thresholds.replace(',', " ");
        let thresholds = normalized
            .split_whitespace()
            .filter_map(|kv| {
                let (application_id, millis) = kv.split_once(':')?;
                Some((application_id.parse().ok()?, millis.parse().ok()?))
            })
            .collect();

        Self {
            default_ms,
            thresholds: RwLock::new(thresholds),
        }
    }

    pub fn set(&self, application_id: i32, threshold_ms: u64) {
        self.thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(application_id, threshold_ms);
    }

    pub fn default_ms(&self) -> u64 {
        self.default_ms
    }
}

impl ThresholdProvider for ApdexThresholds {
    fn threshold(&self, application_id: i32) -> u64 {
        self.thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&application_id)
            .copied()
            .unwrap_or(self.default_ms)
    }
}
