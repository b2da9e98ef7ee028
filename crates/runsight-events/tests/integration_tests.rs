// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for runsight-events
//!
//! These tests run whole transport transcripts through the decoders the way
//! the run session does: arbitrary chunk boundaries in, typed events out.

use runsight_events::framing::{JsonFrameDecoder, LineDecoder, decode_events};
use runsight_events::{DEFAULT_MARKER, EventKind, MonitorEvent, MonitorLine, parse_monitor_line};

/// A realistic socket transcript: one feature with a scenario that makes an
/// HTTP call, written back-to-back with no delimiters.
fn socket_transcript() -> String {
    [
        r#"{"eventType":"SUITE_START","thread":"main"}"#,
        r#"{"eventType":"FEATURE_START","thread":"main","feature":"users","resource":"users.feature"}"#,
        r#"{"eventType":"SCENARIO_START","thread":"main","scenario":"create user"}"#,
        r#"{"eventType":"REQUEST","thread":"main","method":"POST","url":"http://localhost:8080/users","payload":"{\"name\":\"jo\"}"}"#,
        r#"{"eventType":"RESPONSE","thread":"main","status":"201","payload":"{\"id\":7}"}"#,
        r#"{"eventType":"SCENARIO_END","thread":"main","scenario":"create user"}"#,
        r#"{"eventType":"FEATURE_END","thread":"main","feature":"users"}"#,
        r#"{"eventType":"SUITE_END","thread":"main"}"#,
    ]
    .concat()
}

#[test]
fn test_socket_transcript_decodes_in_order() {
    let transcript = socket_transcript();
    let mut decoder = JsonFrameDecoder::new();
    let mut frames = Vec::new();
    // Drip-feed in awkward 11-byte chunks
    for chunk in transcript.as_bytes().chunks(11) {
        frames.extend(decoder.push(chunk));
    }
    let events = decode_events(&frames);
    assert_eq!(events.len(), 8);

    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::SuiteStart,
            EventKind::FeatureStart,
            EventKind::ScenarioStart,
            EventKind::Request,
            EventKind::Response,
            EventKind::ScenarioEnd,
            EventKind::FeatureEnd,
            EventKind::SuiteEnd,
        ]
    );
    assert_eq!(events[3].url.as_deref(), Some("http://localhost:8080/users"));
    assert_eq!(events[4].status.as_deref(), Some("201"));
}

#[test]
fn test_malformed_record_does_not_stall_the_stream() {
    let transcript = format!(
        "{}{}{}",
        r#"{"eventType":"REQUEST","thread":"t1","url":"/a"}"#,
        r#"{"eventType":"BROKEN" MALFORMED}"#,
        r#"{"eventType":"RESPONSE","thread":"t1","status":"200"}"#,
    );
    let mut decoder = JsonFrameDecoder::new();
    let frames = decoder.push(transcript.as_bytes());
    // All three frames extract; the malformed one drops at parse time.
    assert_eq!(frames.len(), 3);
    let events = decode_events(&frames);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), EventKind::Request);
    assert_eq!(events[1].kind(), EventKind::Response);
}

#[test]
fn test_stdout_transcript_separates_events_from_output() {
    let stdout = concat!(
        "Runner 1.4.0 starting\n",
        "##runsight {\"event\":\"testStarted\",\"name\":\"create user\"}\n",
        "12:01:33 INFO  http - POST /users\n",
        "##runsight {\"event\":\"testFinished\",\"name\":\"create user\"}\n",
        "##runsight {\"event\":\"testSuiteFinished\"}\n",
        "done.\n",
    );

    let mut decoder = LineDecoder::new();
    let mut events = Vec::new();
    let mut passthrough = Vec::new();
    for chunk in stdout.as_bytes().chunks(13) {
        for line in decoder.push(chunk) {
            match parse_monitor_line(&line, DEFAULT_MARKER) {
                Ok(MonitorLine::Event(event)) => events.push(event),
                Ok(MonitorLine::Output(text)) => passthrough.push(text),
                Err(err) => panic!("unexpected parse failure: {err}"),
            }
        }
    }

    assert_eq!(
        events,
        vec![
            MonitorEvent::TestStarted {
                name: Some("create user".to_string())
            },
            MonitorEvent::TestFinished {
                name: Some("create user".to_string())
            },
            MonitorEvent::TestSuiteFinished,
        ]
    );
    assert_eq!(passthrough.len(), 3);
    assert_eq!(passthrough[0], "Runner 1.4.0 starting");
}
