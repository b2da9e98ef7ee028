// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Plain-text rendering of run results
//!
//! Consumer-side helpers turning the projection and summary into indented
//! text for the CLI. Rendering re-queries the projection, so it sees
//! whatever state the run reached, completed or not.

use std::fmt::Write;

use runsight_tree::{ExecutionTree, RunSummary, TreeItem, TreeProjection};

/// Render the projected tree as indented lines
#[must_use]
pub fn render_tree(tree: &ExecutionTree, projection: &TreeProjection) -> String {
    let mut out = String::new();
    for root in projection.roots(tree) {
        render_item(&mut out, tree, projection, &root, 0);
    }
    out
}

fn render_item(
    out: &mut String,
    tree: &ExecutionTree,
    projection: &TreeProjection,
    item: &TreeItem,
    depth: usize,
) {
    let _ = writeln!(
        out,
        "{:indent$}{}",
        "",
        projection.label(tree, item),
        indent = depth * 2
    );
    for child in projection.children(tree, item) {
        render_item(out, tree, projection, &child, depth + 1);
    }
}

/// Render the aggregate summary as a one-or-more-line report
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let state = if summary.running {
        // Still flagged live: the producer died before suite end.
        "incomplete"
    } else {
        "finished"
    };
    let _ = writeln!(
        out,
        "{}: {} passed, {} failed",
        state, summary.passed, summary.failed
    );
    for failure in &summary.failures {
        let _ = writeln!(out, "  FAILED {failure}");
    }
    out
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// One report line plus one line per recorded failure.
        #[test]
        fn prop_summary_line_count(
            running in any::<bool>(),
            passed in 0usize..100,
            failed in 0usize..20,
            failures in proptest::collection::vec("[a-z :]{1,20}", 0..20),
        ) {
            let summary = RunSummary { running, passed, failed, failures };
            let text = render_summary(&summary);
            prop_assert_eq!(text.lines().count(), 1 + summary.failures.len());
            prop_assert!(text.ends_with('\n'));
        }
    }
}
