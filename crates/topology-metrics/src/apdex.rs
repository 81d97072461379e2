// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Apdex style latency classification.

use serde::{Deserialize, Serialize};

/// Factor applied to the threshold to get the upper bound of [`Apdex::Tolerating`].
const TOLERATING_FACTOR: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Apdex {
    Satisfied,
    Tolerating,
    Frustrated,
}

/// Classifies an observed duration against a satisfaction threshold, both in milliseconds.
///
/// * `duration <= threshold` is [`Apdex::Satisfied`]
/// * `threshold < duration <= 4 * threshold` is [`Apdex::Tolerating`]
/// * anything slower is [`Apdex::Frustrated`]
pub fn classify(threshold_ms: u64, duration_ms: u64) -> Apdex {
    if duration_ms <= threshold_ms {
        Apdex::Satisfied
    } else if duration_ms <= threshold_ms.saturating_mul(TOLERATING_FACTOR) {
        Apdex::Tolerating
    } else {
        Apdex::Frustrated
    }
}
