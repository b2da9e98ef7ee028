// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Monitor event protocol (subprocess stdout)
//!
//! When the runner is launched as a subprocess rather than connected over
//! the socket, it reports coarse progress through stdout: plain diagnostic
//! text intermixed with lines of the form `<marker> {json}`. Only marker
//! lines carry events; everything else is opaque output to be passed through
//! verbatim.
//!
//! This is a deliberately separate vocabulary from
//! [`RunnerEvent`](crate::event::RunnerEvent) — the two invocation modes of
//! the runner speak genuinely different protocols and are decoded by
//! separate adapters.

use serde::{Deserialize, Serialize};

use crate::error::EventsError;

/// Default marker prefixing monitor event lines on stdout
pub const DEFAULT_MARKER: &str = "##runsight";

/// A coarse progress event from the stdout monitor protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum MonitorEvent {
    /// A feature file began executing
    #[serde(rename_all = "camelCase")]
    FeatureStarted {
        /// Path of the feature file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// Line number within the file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<u64>,
    },
    /// A test (scenario) began executing; no count effect
    TestStarted {
        /// Test name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// A test finished successfully
    TestFinished {
        /// Test name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// A test failed
    TestFailed {
        /// Test name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Failure message
        #[serde(default)]
        message: String,
        /// Longer failure details (stack trace, diff)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// The whole suite finished; the run is no longer live
    TestSuiteFinished,
}

/// Result of classifying one stdout line
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorLine {
    /// A marker line that parsed into an event
    Event(MonitorEvent),
    /// Any non-marker line, passed through verbatim
    Output(String),
}

/// Classify a single stdout line against the given marker
///
/// Non-marker lines come back as [`MonitorLine::Output`] untouched. The
/// marker must end at a token boundary: a line whose first token merely
/// starts with the marker (say `##runsight-v2` against `##runsight`) is
/// plain output, not a marker line.
///
/// # Errors
///
/// Returns `EventsError::InvalidMonitorLine` when a marker line does not
/// carry valid event JSON.
pub fn parse_monitor_line(line: &str, marker: &str) -> Result<MonitorLine, EventsError> {
    let Some(rest) = line.trim_start().strip_prefix(marker) else {
        return Ok(MonitorLine::Output(line.to_string()));
    };
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) && !rest.starts_with('{') {
        return Ok(MonitorLine::Output(line.to_string()));
    }
    let json = rest.trim();
    serde_json::from_str::<MonitorEvent>(json)
        .map(MonitorLine::Event)
        .map_err(|err| EventsError::InvalidMonitorLine {
            message: format!("{err}: {json}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_plain_line_passes_through() {
        let line = "12:01:33.510 [main] INFO  runner - scanning features";
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(parsed, MonitorLine::Output(line.to_string()));
    }

    #[test]
    fn test_test_started_line() {
        let line = r#"##runsight {"event":"testStarted","name":"create user"}"#;
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(
            parsed,
            MonitorLine::Event(MonitorEvent::TestStarted {
                name: Some("create user".to_string())
            })
        );
    }

    #[test]
    fn test_test_failed_line_with_message() {
        let line =
            r#"##runsight {"event":"testFailed","name":"login","message":"status 500","details":"at step 4"}"#;
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        match parsed {
            MonitorLine::Event(MonitorEvent::TestFailed {
                name,
                message,
                details,
            }) => {
                assert_eq!(name.as_deref(), Some("login"));
                assert_eq!(message, "status 500");
                assert_eq!(details.as_deref(), Some("at step 4"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_suite_finished_line() {
        let line = r#"##runsight {"event":"testSuiteFinished"}"#;
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(parsed, MonitorLine::Event(MonitorEvent::TestSuiteFinished));
    }

    #[test]
    fn test_marker_with_leading_whitespace() {
        let line = r#"  ##runsight {"event":"testFinished"}"#;
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(
            parsed,
            MonitorLine::Event(MonitorEvent::TestFinished { name: None })
        );
    }

    #[test]
    fn test_marker_line_with_bad_json_is_an_error() {
        let line = "##runsight {oops";
        let err = parse_monitor_line(line, DEFAULT_MARKER).expect_err("must fail");
        assert!(matches!(err, EventsError::InvalidMonitorLine { .. }));
    }

    #[test]
    fn test_longer_token_sharing_the_marker_prefix_is_output() {
        let line = "##runsight-v2 build info";
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(parsed, MonitorLine::Output(line.to_string()));
    }

    #[test]
    fn test_marker_directly_followed_by_json_still_parses() {
        let line = r#"##runsight{"event":"testSuiteFinished"}"#;
        let parsed = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(parsed, MonitorLine::Event(MonitorEvent::TestSuiteFinished));
    }

    #[test]
    fn test_custom_marker() {
        let line = r#"@@ev {"event":"testSuiteFinished"}"#;
        let parsed = parse_monitor_line(line, "@@ev").expect("classify");
        assert_eq!(parsed, MonitorLine::Event(MonitorEvent::TestSuiteFinished));
        // The default marker must treat the same line as plain output
        let fallback = parse_monitor_line(line, DEFAULT_MARKER).expect("classify");
        assert_eq!(fallback, MonitorLine::Output(line.to_string()));
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let events = vec![
            MonitorEvent::FeatureStarted {
                path: Some("users.feature".to_string()),
                line: Some(3),
            },
            MonitorEvent::TestStarted { name: None },
            MonitorEvent::TestFailed {
                name: Some("t".to_string()),
                message: "boom".to_string(),
                details: None,
            },
            MonitorEvent::TestSuiteFinished,
        ];
        for event in events {
            let json = serde_json::to_string(&event).expect("serialize");
            let back: MonitorEvent = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(event, back);
        }
    }
}
