// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoded trace segment model consumed by the listeners.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanRole {
    /// Inbound work received by the application.
    Entry,
    /// Outbound call made by the application.
    Exit,
    /// Work that never leaves the process; ignored for relationship metrics.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub span_id: i32,
    pub application_id: i32,
    pub instance_id: i32,
    pub segment_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub end_time: i64,
    #[serde(default)]
    pub is_error: bool,
    /// Application id of the called peer, only meaningful for exit spans.
    #[serde(default)]
    pub peer_id: i32,
    pub role: SpanRole,
}

impl Span {
    /// Observed latency, or `None` when the span ends before it starts.
    pub fn duration_ms(&self) -> Option<u64> {
        u64::try_from(self.end_time.checked_sub(self.start_time)?).ok()
    }
}

/// Link from a segment's entry point back to the instance that made the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub parent_instance_id: i32,
}

/// Identity of the segment being processed, shared by every span and reference in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
    pub segment_id: String,
    pub application_id: i32,
    pub instance_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(flatten)]
    pub info: SegmentInfo,
    #[serde(default)]
    pub refs: Vec<Reference>,
    #[serde(default)]
    pub spans: Vec<Span>,
}
