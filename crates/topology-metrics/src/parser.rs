// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::{debug, warn};

use crate::error::MetricError;
use crate::listener::{ListenerServices, SegmentListener, SegmentMetricListener};
use crate::segment::{Segment, SpanRole};

/// Outcome of driving one segment through a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub submitted: usize,
    pub skipped_references: usize,
    pub skipped_spans: usize,
}

/// Drives listeners over decoded segments.
///
/// References are always delivered before any span so that entry spans see their callers.
#[derive(Clone)]
pub struct SegmentParser {
    services: ListenerServices,
}

impl SegmentParser {
    pub fn new(services: ListenerServices) -> Self {
        Self { services }
    }

    /// Runs a fresh [`SegmentMetricListener`] over `segment`.
    pub fn parse(&self, segment: &Segment) -> Result<ParseSummary, MetricError> {
        Self::parse_with(segment, SegmentMetricListener::new(self.services.clone()))
    }

    /// Delivers every reference and span of `segment` to `listener`, then builds it.
    ///
    /// Unresolved references and malformed spans are logged and skipped. Only a sink failure
    /// during build fails the segment.
    pub fn parse_with<L: SegmentListener>(
        segment: &Segment,
        mut listener: L,
    ) -> Result<ParseSummary, MetricError> {
        let segment_id = segment.info.segment_id.as_str();
        let mut summary = ParseSummary::default();

        for reference in &segment.refs {
            if let Err(e) = listener.on_reference(reference, &segment.info) {
                warn!(
                    segment_id,
                    instance_id = reference.parent_instance_id,
                    "Skipping reference: {e}"
                );
                summary.skipped_references += 1;
            }
        }

        for span in &segment.spans {
            let result = match span.role {
                SpanRole::Entry => listener.on_entry_span(span),
                SpanRole::Exit => listener.on_exit_span(span),
                SpanRole::Local => continue,
            };
            if let Err(e) = result {
                warn!(segment_id, span_id = span.span_id, "Skipping span: {e}");
                summary.skipped_spans += 1;
            }
        }

        summary.submitted = listener.build()?;
        debug!(
            segment_id,
            submitted = summary.submitted,
            skipped_references = summary.skipped_references,
            skipped_spans = summary.skipped_spans,
            "Parsed segment"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Reference, SegmentInfo, Span};
    use tracing_test::traced_test;

    /// Records the order in which events reach the listener.
    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
        fail_build: bool,
    }

    impl SegmentListener for &mut EventLog {
        fn on_entry_span(&mut self, span: &Span) -> Result<(), MetricError> {
            self.events.push(format!("entry:{}", span.span_id));
            Ok(())
        }

        fn on_exit_span(&mut self, span: &Span) -> Result<(), MetricError> {
            self.events.push(format!("exit:{}", span.span_id));
            if span.end_time < span.start_time {
                return Err(MetricError::MalformedSpan {
                    segment_id: span.segment_id.clone(),
                    reason: "negative duration".to_string(),
                });
            }
            Ok(())
        }

        fn on_reference(
            &mut self,
            reference: &Reference,
            _segment: &SegmentInfo,
        ) -> Result<(), MetricError> {
            self.events
                .push(format!("ref:{}", reference.parent_instance_id));
            if reference.parent_instance_id < 0 {
                return Err(MetricError::UnresolvedInstance {
                    instance_id: reference.parent_instance_id,
                });
            }
            Ok(())
        }

        fn build(self) -> Result<usize, MetricError> {
            self.events.push("build".to_string());
            if self.fail_build {
                return Err(MetricError::SinkUnavailable("closed".to_string()));
            }
            Ok(self.events.len() - 1)
        }
    }

    fn span(span_id: i32, role: SpanRole, end_time: i64) -> Span {
        Span {
            span_id,
            application_id: 5,
            instance_id: 50,
            segment_id: "seg-1".to_string(),
            start_time: 1_000,
            end_time,
            is_error: false,
            peer_id: 7,
            role,
        }
    }

    fn segment(spans: Vec<Span>, refs: Vec<Reference>) -> Segment {
        Segment {
            info: SegmentInfo {
                segment_id: "seg-1".to_string(),
                application_id: 5,
                instance_id: 50,
            },
            refs,
            spans,
        }
    }

    #[test]
    fn test_references_are_delivered_before_spans() {
        let segment = segment(
            vec![
                span(1, SpanRole::Exit, 1_010),
                span(0, SpanRole::Entry, 1_020),
                span(2, SpanRole::Local, 1_030),
            ],
            vec![Reference { parent_instance_id: 8 }, Reference { parent_instance_id: 9 }],
        );
        let mut log = EventLog::default();

        let summary = SegmentParser::parse_with(&segment, &mut log).unwrap();

        assert_eq!(log.events, vec!["ref:8", "ref:9", "exit:1", "entry:0", "build"]);
        assert_eq!(summary.submitted, 4);
        assert_eq!(summary.skipped_references, 0);
        assert_eq!(summary.skipped_spans, 0);
    }

    #[test]
    #[traced_test]
    fn test_failures_are_logged_and_skipped() {
        let segment = segment(
            vec![self::span(1, SpanRole::Exit, 900), self::span(0, SpanRole::Entry, 1_020)],
            vec![Reference { parent_instance_id: -3 }],
        );
        let mut log = EventLog::default();

        let summary = SegmentParser::parse_with(&segment, &mut log).unwrap();

        assert_eq!(summary.skipped_references, 1);
        assert_eq!(summary.skipped_spans, 1);
        assert_eq!(log.events.last().map(String::as_str), Some("build"));
        assert!(logs_contain("Skipping reference"));
        assert!(logs_contain("Unable to resolve application for instance -3"));
        assert!(logs_contain("instance_id=-3"));
        assert!(logs_contain("Skipping span"));
    }

    #[test]
    fn test_build_failure_fails_segment() {
        let segment = segment(vec![span(0, SpanRole::Entry, 1_020)], vec![]);
        let mut log = EventLog {
            fail_build: true,
            ..Default::default()
        };

        assert!(matches!(
            SegmentParser::parse_with(&segment, &mut log),
            Err(MetricError::SinkUnavailable(_))
        ));
    }
}
