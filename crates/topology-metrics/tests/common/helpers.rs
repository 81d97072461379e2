// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use std::sync::Arc;

use topology_metrics::{
    listener::ListenerServices,
    segment::{Reference, Segment, SegmentInfo, Span, SpanRole},
    services::{DispatchSink, InstanceResolver},
};

use super::mocks::FixedThreshold;

/// 2024-01-01T09:30:42.123Z
pub const START: i64 = 1_704_101_442_123;
pub const THRESHOLD_MS: u64 = 100;

pub fn services(
    instance_resolver: Arc<dyn InstanceResolver>,
    sink: Arc<dyn DispatchSink>,
) -> ListenerServices {
    ListenerServices {
        instance_resolver,
        threshold_provider: Arc::new(FixedThreshold(THRESHOLD_MS)),
        sink,
    }
}

pub fn create_test_span(application_id: i32, role: SpanRole, duration: i64, is_error: bool) -> Span {
    Span {
        span_id: 0,
        application_id,
        instance_id: 50,
        segment_id: "segment-1".to_string(),
        start_time: START,
        end_time: START + duration,
        is_error,
        peer_id: 0,
        role,
    }
}

pub fn create_test_exit_span(application_id: i32, peer_id: i32, duration: i64) -> Span {
    Span {
        peer_id,
        ..create_test_span(application_id, SpanRole::Exit, duration, false)
    }
}

pub fn create_test_segment(
    application_id: i32,
    parent_instance_ids: &[i32],
    spans: Vec<Span>,
) -> Segment {
    Segment {
        info: SegmentInfo {
            segment_id: "segment-1".to_string(),
            application_id,
            instance_id: 50,
        },
        refs: parent_instance_ids
            .iter()
            .map(|&parent_instance_id| Reference { parent_instance_id })
            .collect(),
        spans,
    }
}
