// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock collaborators for driving listeners in tests

use std::collections::HashMap;
use std::sync::Mutex;

use topology_metrics::{
    error::MetricError,
    metric::RelationshipMetric,
    services::{
        DispatchSink, GraphKey, InstanceResolver, ThresholdProvider,
        APPLICATION_REFERENCE_METRIC_GRAPH,
    },
};

/// Sink that keeps every submitted metric in submission order
#[derive(Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<RelationshipMetric>>,
}

impl RecordingSink {
    pub fn submitted(&self) -> Vec<RelationshipMetric> {
        self.submitted.lock().unwrap().clone()
    }
}

impl DispatchSink for RecordingSink {
    fn graph_key(&self) -> GraphKey {
        APPLICATION_REFERENCE_METRIC_GRAPH
    }

    fn submit(&self, metric: RelationshipMetric) -> Result<(), MetricError> {
        self.submitted.lock().unwrap().push(metric);
        Ok(())
    }
}

/// Sink that rejects everything
#[allow(dead_code)]
pub struct UnavailableSink;

impl DispatchSink for UnavailableSink {
    fn graph_key(&self) -> GraphKey {
        APPLICATION_REFERENCE_METRIC_GRAPH
    }

    fn submit(&self, _metric: RelationshipMetric) -> Result<(), MetricError> {
        Err(MetricError::SinkUnavailable("mock sink is down".to_string()))
    }
}

/// Resolver backed by a fixed map that counts lookups
#[derive(Default)]
pub struct MockInstanceResolver {
    instances: HashMap<i32, i32>,
    lookups: Mutex<Vec<i32>>,
}

impl MockInstanceResolver {
    pub fn new(instances: &[(i32, i32)]) -> Self {
        Self {
            instances: instances.iter().copied().collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn lookups(&self) -> Vec<i32> {
        self.lookups.lock().unwrap().clone()
    }
}

impl InstanceResolver for MockInstanceResolver {
    fn resolve(&self, instance_id: i32) -> Option<i32> {
        self.lookups.lock().unwrap().push(instance_id);
        self.instances.get(&instance_id).copied()
    }
}

/// Threshold provider returning one value for every application
pub struct FixedThreshold(pub u64);

impl ThresholdProvider for FixedThreshold {
    fn threshold(&self, _application_id: i32) -> u64 {
        self.0
    }
}
