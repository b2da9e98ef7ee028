// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Thread-scoped execution tree builder and network-log correlator
//!
//! [`TreeBuilder`] consumes the flat, time-ordered [`RunnerEvent`] stream
//! and reconstructs nested execution structure per producer thread with an
//! explicit stack per [`ThreadContext`]. Two configurations exist:
//!
//! - **executions** — drops events from called sub-features
//!   (`callDepth > 1`) and ignores REQUEST/RESPONSE; this is the view a
//!   test-run tree wants.
//! - **network_logs** — no depth filter, and REQUEST/RESPONSE pairs are
//!   correlated into [`NodeData::HttpExchange`] entries that share the same
//!   per-thread stack as generic nesting.
//!
//! Protocol violations (an `*_END` with nothing open, a RESPONSE whose
//! stack top is not an exchange) are logged and recovered best-effort; a
//! single malformed event must never corrupt the rest of the run. A missing
//! terminal `*_END` simply leaves the entry pending forever.

use runsight_events::{EventKind, RunnerEvent};
use tracing::warn;

use crate::node::{ExecutionTree, NetworkLog, NodeData, NodeId, STATUS_PENDING};

/// Change listener; fires with no payload, consumers re-query
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// Policy knobs distinguishing the execution view from the network-log view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Drop events with `call_depth > 1` (called sub-features)
    pub top_level_only: bool,
    /// Correlate REQUEST/RESPONSE pairs into exchange nodes
    pub correlate_http: bool,
}

impl BuilderOptions {
    /// Options for the execution-tree view
    #[must_use]
    pub fn executions() -> Self {
        Self {
            top_level_only: true,
            correlate_http: false,
        }
    }

    /// Options for the network-log view
    #[must_use]
    pub fn network_logs() -> Self {
        Self {
            top_level_only: false,
            correlate_http: true,
        }
    }
}

/// Incremental builder from runner events to an [`ExecutionTree`]
pub struct TreeBuilder {
    tree: ExecutionTree,
    options: BuilderOptions,
    listeners: Vec<ChangeCallback>,
    /// RESPONSE events seen since the last SUITE_START
    responses_in_suite: usize,
    /// Most recently completed exchange, candidate for auto-display
    last_exchange: Option<NodeId>,
    auto_display: Option<NodeId>,
}

impl TreeBuilder {
    /// Create a builder with the given options
    #[must_use]
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            tree: ExecutionTree::new(),
            options,
            listeners: Vec::new(),
            responses_in_suite: 0,
            last_exchange: None,
            auto_display: None,
        }
    }

    /// The tree built so far
    #[must_use]
    pub fn tree(&self) -> &ExecutionTree {
        &self.tree
    }

    /// The options this builder was created with
    #[must_use]
    pub fn options(&self) -> BuilderOptions {
        self.options
    }

    /// Register a change listener, fired after every mutating event
    pub fn subscribe(&mut self, listener: ChangeCallback) {
        self.listeners.push(listener);
    }

    /// Apply one decoded event
    pub fn apply(&mut self, event: &RunnerEvent) {
        match event.kind() {
            EventKind::SuiteStart => {
                self.responses_in_suite = 0;
                self.last_exchange = None;
                self.auto_display = None;
            }
            EventKind::SuiteEnd => {
                // Single-response shortcut: a run that produced exactly one
                // HTTP response gets flagged for immediate display.
                if self.responses_in_suite == 1 {
                    self.auto_display = self.last_exchange;
                }
            }
            EventKind::FeatureStart | EventKind::ScenarioStart | EventKind::StepStart => {
                self.on_start(event);
            }
            EventKind::FeatureEnd | EventKind::ScenarioEnd | EventKind::StepEnd => {
                self.on_end(event);
            }
            EventKind::Request => {
                if self.options.correlate_http {
                    self.on_request(event);
                }
            }
            EventKind::Response => {
                if self.options.correlate_http {
                    self.on_response(event);
                }
            }
            EventKind::Other => {}
        }
    }

    /// The exchange flagged by the single-response shortcut, if any
    ///
    /// Consuming it resets the flag so a later suite can trigger again.
    pub fn take_auto_display(&mut self) -> Option<NodeId> {
        self.auto_display.take()
    }

    /// Discard all built state (new run); notifies listeners
    pub fn clear(&mut self) {
        self.tree.clear();
        self.responses_in_suite = 0;
        self.last_exchange = None;
        self.auto_display = None;
        self.notify();
    }

    fn on_start(&mut self, event: &RunnerEvent) {
        if self.options.top_level_only && event.call_depth > 1 {
            return;
        }
        let (root, top) = self.thread_state(&event.thread);
        let parent = top.unwrap_or(root);
        let id = self.tree.add_child(parent, NodeData::Step {
            start: event.clone(),
            end: None,
        });
        if let Some(ctx) = self.tree.thread_mut(&event.thread) {
            let at_root = parent == root;
            ctx.stack.push(id);
            // Flattened top-level feature list, distinct from the nesting
            // structure.
            if at_root && event.kind() == EventKind::FeatureStart && event.call_depth <= 1 {
                ctx.root_features.push(id);
            }
        }
        self.notify();
    }

    fn on_end(&mut self, event: &RunnerEvent) {
        if self.options.top_level_only && event.call_depth > 1 {
            return;
        }
        let Some(popped) = self.pop(&event.thread) else {
            warn!(
                thread = %event.thread,
                event_type = %event.event_type,
                "unbalanced end event with no open entry"
            );
            return;
        };
        match &mut self.tree.node_mut(popped).data {
            NodeData::Step { end, .. } => *end = Some(event.clone()),
            NodeData::HttpExchange { .. } => {
                // An exchange closed by a generic end means the producer
                // never sent the RESPONSE; leave it pending.
                warn!(
                    thread = %event.thread,
                    event_type = %event.event_type,
                    "end event closed an exchange still awaiting its response"
                );
            }
            NodeData::ThreadRoot { .. } => {
                warn!(thread = %event.thread, "thread root on the open-entry stack");
            }
        }
        self.notify();
    }

    fn on_request(&mut self, event: &RunnerEvent) {
        let (root, top) = self.thread_state(&event.thread);
        let parent = top.unwrap_or(root);
        let id = self.tree.add_child(parent, NodeData::HttpExchange {
            request: NetworkLog::new(event.clone()),
            response: None,
            status: STATUS_PENDING.to_string(),
        });
        if let Some(ctx) = self.tree.thread_mut(&event.thread) {
            // The exchange shares the generic nesting stack, so the
            // matching RESPONSE resolves by popping it.
            ctx.stack.push(id);
            ctx.http_logs.push(id);
        }
        self.notify();
    }

    fn on_response(&mut self, event: &RunnerEvent) {
        self.responses_in_suite += 1;
        let Some(popped) = self.pop(&event.thread) else {
            warn!(
                thread = %event.thread,
                "response event with no open entry to pair with"
            );
            return;
        };
        let is_exchange = matches!(
            self.tree.node(popped).data,
            NodeData::HttpExchange { .. }
        );
        if is_exchange {
            if let NodeData::HttpExchange {
                response, status, ..
            } = &mut self.tree.node_mut(popped).data
            {
                *response = Some(NetworkLog::new(event.clone()));
                if let Some(code) = &event.status {
                    *status = code.clone();
                }
            }
            self.last_exchange = Some(popped);
        } else {
            // Producer protocol violation: pair best-effort with whatever
            // was open and keep going.
            warn!(
                thread = %event.thread,
                "response event paired with a non-exchange entry"
            );
            if let NodeData::Step { end, .. } = &mut self.tree.node_mut(popped).data {
                *end = Some(event.clone());
            }
        }
        self.notify();
    }

    /// Root id and current stack top for a thread, creating the context
    /// lazily on first sight
    fn thread_state(&mut self, thread: &str) -> (NodeId, Option<NodeId>) {
        let ctx = self.tree.ensure_thread(thread);
        (ctx.root, ctx.stack.last().copied())
    }

    fn pop(&mut self, thread: &str) -> Option<NodeId> {
        self.tree.thread_mut(thread).and_then(|ctx| ctx.stack.pop())
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener();
        }
    }
}
