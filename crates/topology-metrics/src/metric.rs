// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Application relationship metric: one directed "front calls behind" edge
//! observed within one minute bucket.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::apdex::Apdex;
use crate::error::MetricError;

/// Separator between the components of a metric id.
pub const ID_SPLIT: &str = "_";

/// Front application id used when a call has no known caller, i.e. it came from an end user.
pub const USER_APPLICATION_ID: i32 = 1;

/// Identity of a relationship metric. Two metrics with the same key describe the same edge in
/// the same bucket and are merged downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub time_bucket: i64,
    pub front_application_id: i32,
    pub behind_application_id: i32,
}

impl MetricKey {
    pub fn new(time_bucket: i64, front_application_id: i32, behind_application_id: i32) -> Self {
        Self {
            time_bucket,
            front_application_id,
            behind_application_id,
        }
    }

    /// Builds the `timeBucket_front_behind` id string.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{ID_SPLIT}{}{ID_SPLIT}{}",
            self.time_bucket, self.front_application_id, self.behind_application_id
        )
    }
}

impl FromStr for MetricKey {
    type Err = MetricError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = || MetricError::InvalidMetricId(id.to_string());
        let mut parts = id.split(ID_SPLIT);
        let (Some(time_bucket), Some(front), Some(behind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            time_bucket: time_bucket.parse().map_err(|_| invalid())?,
            front_application_id: front.parse().map_err(|_| invalid())?,
            behind_application_id: behind.parse().map_err(|_| invalid())?,
        })
    }
}

/// A single timed call folded into a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub duration_ms: u64,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetric {
    id: String,
    time_bucket: i64,
    front_application_id: i32,
    behind_application_id: i32,
    calls: u64,
    duration_sum: u64,
    error_calls: u64,
    error_duration_sum: u64,
    satisfied_count: u64,
    tolerating_count: u64,
    frustrated_count: u64,
}

impl RelationshipMetric {
    /// Creates a metric holding exactly one observation. The id is derived from `key` here and
    /// nothing about the metric changes afterwards.
    pub fn from_observation(key: MetricKey, observation: Observation, apdex: Apdex) -> Self {
        let duration = observation.duration_ms;
        let (error_calls, error_duration_sum) = if observation.is_error {
            (1, duration)
        } else {
            (0, 0)
        };

        Self {
            id: key.id(),
            time_bucket: key.time_bucket,
            front_application_id: key.front_application_id,
            behind_application_id: key.behind_application_id,
            calls: 1,
            duration_sum: duration,
            error_calls,
            error_duration_sum,
            satisfied_count: u64::from(apdex == Apdex::Satisfied),
            tolerating_count: u64::from(apdex == Apdex::Tolerating),
            frustrated_count: u64::from(apdex == Apdex::Frustrated),
        }
    }

    /// Adds every counter of `other` into this metric, saturating at `u64::MAX`. Both metrics
    /// must share the same id.
    pub fn merge(&mut self, other: &RelationshipMetric) -> Result<(), MetricError> {
        if self.id != other.id {
            return Err(MetricError::IdMismatch {
                id: self.id.clone(),
                other: other.id.clone(),
            });
        }

        self.calls = self.calls.saturating_add(other.calls);
        self.duration_sum = self.duration_sum.saturating_add(other.duration_sum);
        self.error_calls = self.error_calls.saturating_add(other.error_calls);
        self.error_duration_sum = self.error_duration_sum.saturating_add(other.error_duration_sum);
        self.satisfied_count = self.satisfied_count.saturating_add(other.satisfied_count);
        self.tolerating_count = self.tolerating_count.saturating_add(other.tolerating_count);
        self.frustrated_count = self.frustrated_count.saturating_add(other.frustrated_count);
        Ok(())
    }

    pub fn key(&self) -> MetricKey {
        MetricKey::new(
            self.time_bucket,
            self.front_application_id,
            self.behind_application_id,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn time_bucket(&self) -> i64 {
        self.time_bucket
    }

    pub fn front_application_id(&self) -> i32 {
        self.front_application_id
    }

    pub fn behind_application_id(&self) -> i32 {
        self.behind_application_id
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn duration_sum(&self) -> u64 {
        self.duration_sum
    }

    pub fn error_calls(&self) -> u64 {
        self.error_calls
    }

    pub fn error_duration_sum(&self) -> u64 {
        self.error_duration_sum
    }

    pub fn satisfied_count(&self) -> u64 {
        self.satisfied_count
    }

    pub fn tolerating_count(&self) -> u64 {
        self.tolerating_count
    }

    pub fn frustrated_count(&self) -> u64 {
        self.frustrated_count
    }
}
