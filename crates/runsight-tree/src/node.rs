// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Arena-backed execution tree
//!
//! All nodes of a run live in one owning `Vec`; parent/child links are
//! indices. The child list is the sole ownership edge; the parent pointer is
//! a non-owning back-index used for lookups only, so the parent/child cycle
//! of the rendered tree never becomes a reference cycle here.
//!
//! One [`ThreadContext`] exists per distinct producer thread name. It owns
//! the explicit stack of open entries that reconstructs LIFO nesting from
//! the flat event sequence, plus the flattened `root_features` and
//! `http_logs` lists consumers use for top-level iteration.

use std::collections::HashMap;

use runsight_events::RunnerEvent;

/// Index of a node within an [`ExecutionTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The raw arena index
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One side of an HTTP exchange (request or response)
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLog {
    /// The REQUEST or RESPONSE event this log wraps
    pub event: RunnerEvent,
}

impl NetworkLog {
    /// Wrap a REQUEST or RESPONSE event
    #[must_use]
    pub fn new(event: RunnerEvent) -> Self {
        Self { event }
    }

    /// Body text, if the event carried one
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.event.payload.as_deref()
    }

    /// Whether the event carried any headers
    #[must_use]
    pub fn has_headers(&self) -> bool {
        !self.event.headers.is_empty()
    }
}

/// What a tree node represents
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Synthetic root for one producer thread
    ThreadRoot {
        /// Producer-assigned thread name
        name: String,
    },
    /// A `*_START`/`*_END` pair; `end` stays `None` while running (or
    /// forever, if the producer died before emitting the end)
    Step {
        /// The opening event
        start: RunnerEvent,
        /// The matching closing event, once it arrives
        end: Option<RunnerEvent>,
    },
    /// A correlated REQUEST/RESPONSE pair
    HttpExchange {
        /// The request log, present from creation
        request: NetworkLog,
        /// The response log, once the RESPONSE arrives
        response: Option<NetworkLog>,
        /// `"pending"` until overwritten from the response event
        status: String,
    },
}

/// Status string an exchange carries before its response arrives
pub const STATUS_PENDING: &str = "pending";

/// A single node in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// This node's own id
    pub id: NodeId,
    /// Non-owning back-index; `None` only for thread roots
    pub parent: Option<NodeId>,
    /// Owned children, in creation order
    pub children: Vec<NodeId>,
    /// Node kind and payload
    pub data: NodeData,
}

impl Node {
    /// Whether the entry is still running (no terminal event yet)
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match &self.data {
            NodeData::ThreadRoot { .. } => false,
            NodeData::Step { end, .. } => end.is_none(),
            NodeData::HttpExchange { response, .. } => response.is_none(),
        }
    }
}

/// Per-thread builder state
///
/// Created lazily on the first event naming the thread, never destroyed
/// during a run, and only reset by a whole-tree [`ExecutionTree::clear`]
/// driven from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadContext {
    /// The synthetic root node for this thread
    pub root: NodeId,
    /// Stack of open entries; top is the parent for the next `*_START`
    pub(crate) stack: Vec<NodeId>,
    /// Top-level feature entries, for flattened iteration
    pub root_features: Vec<NodeId>,
    /// Every HTTP exchange on this thread, in arrival order
    pub http_logs: Vec<NodeId>,
}

impl ThreadContext {
    /// Number of currently open entries
    #[must_use]
    pub fn open_depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether every `*_START` seen so far has a matching `*_END`
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }
}

/// The arena of one run's nodes plus all thread contexts
#[derive(Debug, Default)]
pub struct ExecutionTree {
    nodes: Vec<Node>,
    threads: HashMap<String, ThreadContext>,
    /// Thread names in order of first appearance
    thread_order: Vec<String>,
}

impl ExecutionTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Children of a node, in creation order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Total number of nodes, thread roots included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Context for a thread name, if any event has named it yet
    #[must_use]
    pub fn thread(&self, name: &str) -> Option<&ThreadContext> {
        self.threads.get(name)
    }

    pub(crate) fn thread_mut(&mut self, name: &str) -> Option<&mut ThreadContext> {
        self.threads.get_mut(name)
    }

    /// Thread names in order of first appearance
    #[must_use]
    pub fn thread_names(&self) -> &[String] {
        &self.thread_order
    }

    /// Get or lazily create the context for a thread name
    pub(crate) fn ensure_thread(&mut self, name: &str) -> &ThreadContext {
        if !self.threads.contains_key(name) {
            let root = self.alloc(None, NodeData::ThreadRoot {
                name: name.to_string(),
            });
            self.threads.insert(name.to_string(), ThreadContext {
                root,
                stack: Vec::new(),
                root_features: Vec::new(),
                http_logs: Vec::new(),
            });
            self.thread_order.push(name.to_string());
        }
        &self.threads[name]
    }

    /// Allocate a node and, if it has a parent, append it to that parent's
    /// child list immediately so consumers see it before completion
    pub(crate) fn add_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.alloc(Some(parent), data);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn alloc(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            parent,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Discard every node and context (new run)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.threads.clear();
        self.thread_order.clear();
    }
}
