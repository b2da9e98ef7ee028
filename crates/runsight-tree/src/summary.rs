// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Execution summary tracking
//!
//! Aggregates pass/fail counts and run liveness from the stdout monitor
//! protocol, independently of the tree shape. Counts are strictly monotonic
//! within a run; only an explicit [`SummaryTracker::start`] or
//! [`SummaryTracker::clear`] from the process launcher resets them — the
//! tracker never infers a reset from the stream.

use runsight_events::MonitorEvent;
use serde::{Deserialize, Serialize};

/// Aggregate state of one run, for status-bar style reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether the suite is still executing
    pub running: bool,
    /// Tests finished successfully
    pub passed: usize,
    /// Tests failed
    pub failed: usize,
    /// Failure messages, in arrival order
    pub failures: Vec<String>,
}

impl RunSummary {
    /// Total tests with a terminal outcome so far
    #[must_use]
    pub fn finished(&self) -> usize {
        self.passed + self.failed
    }

    /// Whether no test has failed so far
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Summary listener, handed the state after each mutation
pub type SummaryCallback = Box<dyn Fn(&RunSummary) + Send + Sync>;

/// State machine over [`MonitorEvent`]s
#[derive(Default)]
pub struct SummaryTracker {
    summary: RunSummary,
    listeners: Vec<SummaryCallback>,
}

impl SummaryTracker {
    /// Create an idle tracker with zeroed counts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current aggregate state
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Register a listener, notified on every mutation
    pub fn subscribe(&mut self, listener: SummaryCallback) {
        self.listeners.push(listener);
    }

    /// Reset to `{running: true, 0, 0}` at a run start
    pub fn start(&mut self) {
        self.summary = RunSummary {
            running: true,
            ..RunSummary::default()
        };
        self.notify();
    }

    /// Reset to `{running: false, 0, 0}` when the view is cleared
    pub fn clear(&mut self) {
        self.summary = RunSummary::default();
        self.notify();
    }

    /// Apply one monitor event
    pub fn apply(&mut self, event: &MonitorEvent) {
        match event {
            // No count effect; nothing to report.
            MonitorEvent::FeatureStarted { .. } | MonitorEvent::TestStarted { .. } => {}
            MonitorEvent::TestFinished { .. } => {
                self.summary.passed += 1;
                self.notify();
            }
            MonitorEvent::TestFailed { name, message, .. } => {
                self.summary.failed += 1;
                let failure = match name {
                    Some(name) => format!("{name}: {message}"),
                    None => message.clone(),
                };
                self.summary.failures.push(failure);
                self.notify();
            }
            MonitorEvent::TestSuiteFinished => {
                self.summary.running = false;
                self.notify();
            }
        }
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.summary);
        }
    }
}
