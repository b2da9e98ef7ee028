// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! runsight-tree: execution tree and run summary model
//!
//! This library crate turns the flat runner event stream into queryable
//! state: an arena-backed execution tree per view (test runs, network
//! logs), a pass/fail summary tracker, and a read-only projection for
//! incremental rendering.

#![warn(missing_docs)]

//! ## Building
//!
//! ```rust
//! use runsight_events::RunnerEvent;
//! use runsight_tree::{BuilderOptions, TreeBuilder, TreeProjection};
//!
//! let mut builder = TreeBuilder::new(BuilderOptions::executions());
//! builder.apply(&RunnerEvent::new("FEATURE_START", "main"));
//! builder.apply(&RunnerEvent::new("FEATURE_END", "main"));
//!
//! let projection = TreeProjection::default();
//! assert_eq!(projection.roots(builder.tree()).len(), 1);
//! ```

pub mod builder;
pub mod node;
pub mod payload;
pub mod projection;
pub mod summary;

pub use builder::{BuilderOptions, ChangeCallback, TreeBuilder};
pub use node::{ExecutionTree, NetworkLog, Node, NodeData, NodeId, STATUS_PENDING, ThreadContext};
pub use payload::{PayloadNode, decompose};
pub use projection::{LogSide, TreeItem, TreeProjection};
pub use summary::{RunSummary, SummaryCallback, SummaryTracker};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::{BuilderOptions, TreeBuilder};
    pub use crate::node::{ExecutionTree, NodeData, NodeId};
    pub use crate::projection::{TreeItem, TreeProjection};
    pub use crate::summary::{RunSummary, SummaryTracker};
}
