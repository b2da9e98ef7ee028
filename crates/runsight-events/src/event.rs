// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Runner lifecycle event model (socket protocol)
//!
//! The test runner emits one JSON object per lifecycle transition over its
//! event socket. Event type names are open-ended: the well-known suite /
//! feature / scenario / request / response events are accompanied by
//! arbitrary `*_START` / `*_END` pairs for nested steps, so the wire field
//! is kept as a string and classified into a closed [`EventKind`] at the
//! consumer seam.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single lifecycle event from the runner's socket protocol
///
/// Every field except `eventType` may be absent on the wire; defaults keep
/// sparse records parseable. Events are strictly ordered within a `thread`
/// but threads interleave arbitrarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerEvent {
    /// Raw event type name, e.g. `FEATURE_START` or `RESPONSE`
    pub event_type: String,
    /// Producer timestamp in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Logical execution thread name assigned by the producer
    #[serde(default = "default_thread")]
    pub thread: String,
    /// Nesting depth; values above 1 come from called sub-features
    #[serde(default)]
    pub call_depth: i64,
    /// Feature path or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Scenario name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Whether the scenario is a scenario outline row
    #[serde(default)]
    pub outline: bool,
    /// Resource path of the feature file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Line number within the feature file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// HTTP method (REQUEST events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request URL (REQUEST events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP status (RESPONSE events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// HTTP headers (REQUEST/RESPONSE events)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Request or response body, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

fn default_thread() -> String {
    "main".to_string()
}

/// Closed classification of an event type name
///
/// The producer vocabulary is open-ended (`*_START`/`*_END` for arbitrary
/// steps), so classification is computed from the name rather than derived
/// by serde tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `SUITE_START`
    SuiteStart,
    /// `SUITE_END`
    SuiteEnd,
    /// `FEATURE_START`
    FeatureStart,
    /// `FEATURE_END`
    FeatureEnd,
    /// `SCENARIO_START`
    ScenarioStart,
    /// `SCENARIO_END`
    ScenarioEnd,
    /// `REQUEST` — opens an HTTP exchange
    Request,
    /// `RESPONSE` — closes the in-flight HTTP exchange
    Response,
    /// Any other `*_START`
    StepStart,
    /// Any other `*_END`
    StepEnd,
    /// Anything else; consumers ignore these
    Other,
}

impl RunnerEvent {
    /// Create a minimal event of the given type on the given thread
    #[must_use]
    pub fn new(event_type: impl Into<String>, thread: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: None,
            thread: thread.into(),
            call_depth: 0,
            feature: None,
            scenario: None,
            outline: false,
            resource: None,
            line: None,
            method: None,
            url: None,
            status: None,
            headers: HashMap::new(),
            payload: None,
        }
    }

    /// Classify the raw event type name
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "SUITE_START" => EventKind::SuiteStart,
            "SUITE_END" => EventKind::SuiteEnd,
            "FEATURE_START" => EventKind::FeatureStart,
            "FEATURE_END" => EventKind::FeatureEnd,
            "SCENARIO_START" => EventKind::ScenarioStart,
            "SCENARIO_END" => EventKind::ScenarioEnd,
            "REQUEST" => EventKind::Request,
            "RESPONSE" => EventKind::Response,
            other if other.ends_with("_START") => EventKind::StepStart,
            other if other.ends_with("_END") => EventKind::StepEnd,
            _ => EventKind::Other,
        }
    }

    /// Whether this event opens a nesting level
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::SuiteStart
                | EventKind::FeatureStart
                | EventKind::ScenarioStart
                | EventKind::StepStart
        )
    }

    /// Whether this event closes a nesting level
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::SuiteEnd
                | EventKind::FeatureEnd
                | EventKind::ScenarioEnd
                | EventKind::StepEnd
        )
    }

    /// A human-readable name for the entry this event opens
    ///
    /// Falls back through scenario, feature, resource and finally the raw
    /// event type name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.scenario
            .as_deref()
            .or(self.feature.as_deref())
            .or(self.resource.as_deref())
            .unwrap_or(&self.event_type)
    }
}
