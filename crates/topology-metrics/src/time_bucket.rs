// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Minute resolution time buckets.
//!
//! A bucket is the UTC minute of a timestamp written as the decimal integer
//! `yyyyMMddHHmm`, e.g. `2024-01-01T09:30:42Z` falls in bucket `202401010930`.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

const MINUTE_FACTOR: i64 = 1;
const HOUR_FACTOR: i64 = 100;
const DAY_FACTOR: i64 = 10_000;
const MONTH_FACTOR: i64 = 1_000_000;
const YEAR_FACTOR: i64 = 100_000_000;

/// Returns the minute bucket for an epoch timestamp in milliseconds, or `None` when the
/// timestamp cannot be represented as a calendar date.
pub fn minute_bucket(epoch_millis: i64) -> Option<i64> {
    let time = DateTime::<Utc>::from_timestamp_millis(epoch_millis)?;
    Some(
        i64::from(time.year()) * YEAR_FACTOR
            + i64::from(time.month()) * MONTH_FACTOR
            + i64::from(time.day()) * DAY_FACTOR
            + i64::from(time.hour()) * HOUR_FACTOR
            + i64::from(time.minute()) * MINUTE_FACTOR,
    )
}

/// Converts a minute bucket back into the UTC instant that starts it.
pub fn bucket_start(bucket: i64) -> Option<DateTime<Utc>> {
    let minute = u32::try_from(bucket % HOUR_FACTOR).ok()?;
    let hour = u32::try_from(bucket / HOUR_FACTOR % 100).ok()?;
    let day = u32::try_from(bucket / DAY_FACTOR % 100).ok()?;
    let month = u32::try_from(bucket / MONTH_FACTOR % 100).ok()?;
    let year = i32::try_from(bucket / YEAR_FACTOR).ok()?;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
}
