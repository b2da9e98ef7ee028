// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Read-only tree projection
//!
//! Adapts a built [`ExecutionTree`] into the parent→children queries a
//! renderer needs: root enumeration, recursive descent and leaf detection.
//! Arena nodes surface as [`TreeItem::Node`]; the request/response sides of
//! an exchange, their header lists and their decomposed payload properties
//! are derived on demand and never stored back into the arena.
//!
//! The `show_scenarios` switch flips between the full generic nesting and a
//! flattened per-thread HTTP-log view; it is a pure read-side choice over
//! already-built state.

use crate::node::{ExecutionTree, NetworkLog, NodeData, NodeId};
use crate::payload::{PayloadNode, decompose};

/// Which side of an HTTP exchange an item refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSide {
    /// The request log
    Request,
    /// The response log
    Response,
}

/// A renderable position in the projected tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeItem {
    /// An arena node (thread root, step or exchange)
    Node(NodeId),
    /// One side of an exchange
    Log {
        /// The exchange node
        node: NodeId,
        /// Request or response side
        side: LogSide,
    },
    /// The header list of one exchange side
    Headers {
        /// The exchange node
        node: NodeId,
        /// Request or response side
        side: LogSide,
    },
    /// A single header, fully materialized
    Header {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
    /// The payload of one exchange side
    Payload {
        /// The exchange node
        node: NodeId,
        /// Request or response side
        side: LogSide,
    },
    /// A decomposed payload property subtree, fully materialized
    Property(PayloadNode),
}

/// Read adapter over an [`ExecutionTree`]
#[derive(Debug, Clone, Copy)]
pub struct TreeProjection {
    /// Show the full generic nesting (`true`) or only per-thread HTTP logs
    pub show_scenarios: bool,
}

impl Default for TreeProjection {
    fn default() -> Self {
        Self {
            show_scenarios: true,
        }
    }
}

impl TreeProjection {
    /// Projection with the given scenario visibility
    #[must_use]
    pub fn new(show_scenarios: bool) -> Self {
        Self { show_scenarios }
    }

    /// Top-level items: one per thread, or the single thread's entries
    /// flattened when only one thread exists
    #[must_use]
    pub fn roots(&self, tree: &ExecutionTree) -> Vec<TreeItem> {
        let names = tree.thread_names();
        match names {
            [] => Vec::new(),
            [only] => match tree.thread(only) {
                Some(ctx) => self.thread_children(tree, only, ctx.root),
                None => Vec::new(),
            },
            _ => names
                .iter()
                .filter_map(|name| tree.thread(name))
                .map(|ctx| TreeItem::Node(ctx.root))
                .collect(),
        }
    }

    /// Ordered children of an item
    #[must_use]
    pub fn children(&self, tree: &ExecutionTree, item: &TreeItem) -> Vec<TreeItem> {
        match item {
            TreeItem::Node(id) => match &tree.node(*id).data {
                NodeData::ThreadRoot { name } => self.thread_children(tree, name, *id),
                NodeData::Step { .. } => child_nodes(tree, *id),
                NodeData::HttpExchange { response, .. } => {
                    let mut items = vec![TreeItem::Log {
                        node: *id,
                        side: LogSide::Request,
                    }];
                    if response.is_some() {
                        items.push(TreeItem::Log {
                            node: *id,
                            side: LogSide::Response,
                        });
                    }
                    // Entries nested while the call was in flight.
                    items.extend(child_nodes(tree, *id));
                    items
                }
            },
            TreeItem::Log { node, side } => {
                let Some(log) = exchange_log(tree, *node, *side) else {
                    return Vec::new();
                };
                let mut items = Vec::new();
                if log.has_headers() {
                    items.push(TreeItem::Headers {
                        node: *node,
                        side: *side,
                    });
                }
                if log.payload().is_some() {
                    items.push(TreeItem::Payload {
                        node: *node,
                        side: *side,
                    });
                }
                items
            }
            TreeItem::Headers { node, side } => {
                let Some(log) = exchange_log(tree, *node, *side) else {
                    return Vec::new();
                };
                let mut headers: Vec<(&String, &String)> = log.event.headers.iter().collect();
                headers.sort();
                headers
                    .into_iter()
                    .map(|(name, value)| TreeItem::Header {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect()
            }
            TreeItem::Payload { node, side } => {
                let Some(payload) = exchange_log(tree, *node, *side).and_then(NetworkLog::payload)
                else {
                    return Vec::new();
                };
                let root = decompose("payload", payload);
                if root.is_leaf() {
                    // Opaque text body: show it as a single property.
                    vec![TreeItem::Property(root)]
                } else {
                    root.children.into_iter().map(TreeItem::Property).collect()
                }
            }
            TreeItem::Header { .. } => Vec::new(),
            TreeItem::Property(property) => property
                .children
                .iter()
                .cloned()
                .map(TreeItem::Property)
                .collect(),
        }
    }

    /// Whether an item has no children
    #[must_use]
    pub fn is_leaf(&self, tree: &ExecutionTree, item: &TreeItem) -> bool {
        match item {
            TreeItem::Header { .. } => true,
            TreeItem::Property(property) => property.is_leaf(),
            _ => self.children(tree, item).is_empty(),
        }
    }

    /// Display label for an item
    #[must_use]
    pub fn label(&self, tree: &ExecutionTree, item: &TreeItem) -> String {
        match item {
            TreeItem::Node(id) => match &tree.node(*id).data {
                NodeData::ThreadRoot { name } => name.clone(),
                NodeData::Step { start, end } => {
                    if end.is_none() {
                        format!("{} (running)", start.display_name())
                    } else {
                        start.display_name().to_string()
                    }
                }
                NodeData::HttpExchange {
                    request, status, ..
                } => {
                    let method = request.event.method.as_deref().unwrap_or("?");
                    let url = request.event.url.as_deref().unwrap_or("?");
                    format!("{method} {url} ({status})")
                }
            },
            TreeItem::Log { side, .. } => match side {
                LogSide::Request => "Request".to_string(),
                LogSide::Response => "Response".to_string(),
            },
            TreeItem::Headers { .. } => "Headers".to_string(),
            TreeItem::Header { name, value } => format!("{name}: {value}"),
            TreeItem::Payload { .. } => "Payload".to_string(),
            TreeItem::Property(property) => property.display(),
        }
    }

    fn thread_children(&self, tree: &ExecutionTree, name: &str, root: NodeId) -> Vec<TreeItem> {
        if self.show_scenarios {
            child_nodes(tree, root)
        } else {
            tree.thread(name)
                .map(|ctx| ctx.http_logs.iter().copied().map(TreeItem::Node).collect())
                .unwrap_or_default()
        }
    }
}

fn child_nodes(tree: &ExecutionTree, id: NodeId) -> Vec<TreeItem> {
    tree.children(id).iter().copied().map(TreeItem::Node).collect()
}

fn exchange_log(tree: &ExecutionTree, id: NodeId, side: LogSide) -> Option<&NetworkLog> {
    match (&tree.node(id).data, side) {
        (NodeData::HttpExchange { request, .. }, LogSide::Request) => Some(request),
        (NodeData::HttpExchange { response, .. }, LogSide::Response) => response.as_ref(),
        _ => None,
    }
}
