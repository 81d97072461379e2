// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-segment listener that turns entry spans, exit spans and cross-segment references into
//! application relationship metrics.
//!
//! One listener is created for each segment and consumed by [`SegmentListener::build`]. Every
//! reference of a segment has to be delivered before the entry span it belongs to: an entry span
//! seen with no pending reference is recorded as a call from an end user.

use std::sync::Arc;

use tracing::{debug, error};

use crate::apdex;
use crate::error::MetricError;
use crate::metric::{MetricKey, Observation, RelationshipMetric, USER_APPLICATION_ID};
use crate::segment::{Reference, SegmentInfo, Span, SpanRole};
use crate::services::{DispatchSink, InstanceResolver, ThresholdProvider};
use crate::time_bucket;

/// Receives the events of one segment in arrival order.
pub trait SegmentListener {
    fn on_entry_span(&mut self, span: &Span) -> Result<(), MetricError>;

    fn on_exit_span(&mut self, span: &Span) -> Result<(), MetricError>;

    fn on_reference(
        &mut self,
        reference: &Reference,
        segment: &SegmentInfo,
    ) -> Result<(), MetricError>;

    /// Hands everything collected for the segment to the downstream sink and returns how many
    /// metrics were submitted.
    fn build(self) -> Result<usize, MetricError>;
}

/// Shared collaborators injected into every listener.
#[derive(Clone)]
pub struct ListenerServices {
    pub instance_resolver: Arc<dyn InstanceResolver>,
    pub threshold_provider: Arc<dyn ThresholdProvider>,
    pub sink: Arc<dyn DispatchSink>,
}

/// Caller edge known from a reference, waiting for the entry span that closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingReference {
    front_application_id: i32,
    behind_application_id: i32,
}

pub struct SegmentMetricListener {
    services: ListenerServices,
    finished_metrics: Vec<RelationshipMetric>,
    pending_references: Vec<PendingReference>,
}

impl SegmentMetricListener {
    pub fn new(services: ListenerServices) -> Self {
        Self {
            services,
            finished_metrics: Vec::new(),
            pending_references: Vec::new(),
        }
    }

    /// Metrics collected so far, in the order they were finished.
    pub fn finished_metrics(&self) -> &[RelationshipMetric] {
        &self.finished_metrics
    }

    fn observe(span: &Span, expected_role: SpanRole) -> Result<(i64, Observation), MetricError> {
        let malformed = |reason: String| MetricError::MalformedSpan {
            segment_id: span.segment_id.clone(),
            reason,
        };

        if span.role != expected_role {
            return Err(malformed(format!(
                "span {} is {:?}, expected {:?}",
                span.span_id, span.role, expected_role
            )));
        }
        let duration_ms = span.duration_ms().ok_or_else(|| {
            malformed(format!(
                "span {} ends at {} before it starts at {}",
                span.span_id, span.end_time, span.start_time
            ))
        })?;
        let time_bucket = time_bucket::minute_bucket(span.start_time).ok_or_else(|| {
            malformed(format!(
                "span {} has an out of range start time {}",
                span.span_id, span.start_time
            ))
        })?;

        Ok((
            time_bucket,
            Observation {
                duration_ms,
                is_error: span.is_error,
            },
        ))
    }

    /// Folds one observation into a new metric for `key`. The threshold is looked up on every
    /// call so configuration changes apply to the next observation.
    fn finish(&mut self, key: MetricKey, observation: Observation) {
        let threshold = self
            .services
            .threshold_provider
            .threshold(key.behind_application_id);
        let apdex = apdex::classify(threshold, observation.duration_ms);
        self.finished_metrics
            .push(RelationshipMetric::from_observation(key, observation, apdex));
    }
}

impl SegmentListener for SegmentMetricListener {
    fn on_entry_span(&mut self, span: &Span) -> Result<(), MetricError> {
        let (time_bucket, observation) = Self::observe(span, SpanRole::Entry)?;

        if self.pending_references.is_empty() {
            let key = MetricKey::new(time_bucket, USER_APPLICATION_ID, span.application_id);
            self.finish(key, observation);
            return Ok(());
        }

        // One entry span closes every inbound edge recorded for the segment.
        let pending = self.pending_references.clone();
        for reference in pending {
            let key = MetricKey::new(
                time_bucket,
                reference.front_application_id,
                reference.behind_application_id,
            );
            self.finish(key, observation);
        }
        Ok(())
    }

    fn on_exit_span(&mut self, span: &Span) -> Result<(), MetricError> {
        let (time_bucket, observation) = Self::observe(span, SpanRole::Exit)?;
        let key = MetricKey::new(time_bucket, span.application_id, span.peer_id);
        self.finish(key, observation);
        Ok(())
    }

    fn on_reference(
        &mut self,
        reference: &Reference,
        segment: &SegmentInfo,
    ) -> Result<(), MetricError> {
        let parent_application_id = self
            .services
            .instance_resolver
            .resolve(reference.parent_instance_id)
            .ok_or(MetricError::UnresolvedInstance {
                instance_id: reference.parent_instance_id,
            })?;

        self.pending_references.push(PendingReference {
            front_application_id: parent_application_id,
            behind_application_id: segment.application_id,
        });
        Ok(())
    }

    fn build(self) -> Result<usize, MetricError> {
        let sink = self.services.sink;
        let graph = sink.graph_key();
        debug!(
            graph_id = graph.graph_id,
            entity_type = graph.entity_type,
            "Submitting {} application reference metrics",
            self.finished_metrics.len()
        );

        let mut submitted = 0;
        for metric in self.finished_metrics {
            let metric_id = metric.id().to_string();
            if let Err(e) = sink.submit(metric) {
                error!(
                    metric_id = metric_id.as_str(),
                    submitted, "Failed to submit application reference metric: {e}"
                );
                return Err(e);
            }
            submitted += 1;
        }
        Ok(submitted)
    }
}
