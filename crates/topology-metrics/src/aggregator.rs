// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use tracing::warn;

use crate::metric::RelationshipMetric;

/// Upper bound on the distinct metric ids kept between two flushes.
pub const CONTEXTS: usize = 10_240;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregatorError {
    #[error("Aggregator already tracks {0} contexts")]
    Overflow(usize),
}

/// Sums relationship metrics that share an id until they are consumed.
pub struct ReferenceMetricAggregator {
    max_context: usize,
    metrics: HashMap<String, RelationshipMetric>,
}

impl ReferenceMetricAggregator {
    pub fn new(max_context: usize) -> Self {
        Self {
            max_context,
            metrics: HashMap::new(),
        }
    }

    pub fn insert(&mut self, metric: RelationshipMetric) -> Result<(), AggregatorError> {
        if let Some(existing) = self.metrics.get_mut(metric.id()) {
            if let Err(e) = existing.merge(&metric) {
                warn!(metric_id = metric.id(), "Dropping application reference metric: {e}");
            }
            return Ok(());
        }
        if self.metrics.len() >= self.max_context {
            return Err(AggregatorError::Overflow(self.metrics.len()));
        }
        self.metrics.insert(metric.id().to_string(), metric);
        Ok(())
    }

    pub fn get_entry_by_id(&self, id: &str) -> Option<&RelationshipMetric> {
        self.metrics.get(id)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Drains every merged metric, ordered by id.
    pub fn consume_metrics(&mut self) -> Vec<RelationshipMetric> {
        let mut batch: Vec<RelationshipMetric> = self.metrics.drain().map(|(_, m)| m).collect();
        batch.sort_by(|a, b| a.id().cmp(b.id()));
        batch
    }
}

impl Default for ReferenceMetricAggregator {
    fn default() -> Self {
        Self::new(CONTEXTS)
    }
}
