// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Speculative payload decomposition
//!
//! Request/response bodies are parsed as JSON into a recursive key/value
//! property tree for display. Parse failure is not an error: the whole body
//! degrades to a single opaque text leaf. The tree is rebuilt in full on
//! every call — payloads are immutable once captured, so there is nothing
//! to update incrementally.

use serde_json::Value;

/// One node of a decomposed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadNode {
    /// Key, array index (`[i]`) or supplied root label
    pub label: String,
    /// Rendered scalar value; `None` for objects and arrays
    pub value: Option<String>,
    /// Nested properties, in document order
    pub children: Vec<PayloadNode>,
}

impl PayloadNode {
    /// Whether this node has no nested properties
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `label` for containers, `label: value` for scalars
    #[must_use]
    pub fn display(&self) -> String {
        match &self.value {
            Some(value) => format!("{}: {}", self.label, value),
            None => self.label.clone(),
        }
    }
}

/// Decompose a payload string into a property tree rooted at `label`
///
/// Valid JSON recurses into objects and arrays; anything else becomes one
/// opaque text leaf carrying the raw payload.
#[must_use]
pub fn decompose(label: &str, payload: &str) -> PayloadNode {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => from_value(label, &value),
        Err(_) => PayloadNode {
            label: label.to_string(),
            value: Some(payload.to_string()),
            children: Vec::new(),
        },
    }
}

fn from_value(label: &str, value: &Value) -> PayloadNode {
    match value {
        Value::Object(map) => PayloadNode {
            label: label.to_string(),
            value: None,
            children: map
                .iter()
                .map(|(key, child)| from_value(key, child))
                .collect(),
        },
        Value::Array(items) => PayloadNode {
            label: label.to_string(),
            value: None,
            children: items
                .iter()
                .enumerate()
                .map(|(i, child)| from_value(&format!("[{i}]"), child))
                .collect(),
        },
        Value::String(text) => leaf(label, text.clone()),
        scalar => leaf(label, scalar.to_string()),
    }
}

fn leaf(label: &str, value: String) -> PayloadNode {
    PayloadNode {
        label: label.to_string(),
        value: Some(value),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_object_decomposes_into_properties() {
        let node = decompose("payload", r#"{"id":7,"name":"jo","active":true}"#);
        assert_eq!(node.label, "payload");
        assert!(node.value.is_none());
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[0].display(), "id: 7");
        assert_eq!(node.children[1].display(), "name: jo");
        assert_eq!(node.children[2].display(), "active: true");
    }

    #[test]
    fn test_array_children_are_indexed() {
        let node = decompose("payload", r#"[{"a":1},{"a":2}]"#);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].label, "[0]");
        assert_eq!(node.children[1].label, "[1]");
        assert_eq!(node.children[1].children[0].display(), "a: 2");
    }

    #[test]
    fn test_nested_depth() {
        let node = decompose("payload", r#"{"outer":{"inner":{"leaf":null}}}"#);
        let leaf = &node.children[0].children[0].children[0];
        assert_eq!(leaf.display(), "leaf: null");
        assert!(leaf.is_leaf());
    }

    #[test]
    fn test_non_json_degrades_to_text_leaf() {
        let node = decompose("payload", "plain <html> body");
        assert!(node.is_leaf());
        assert_eq!(node.value.as_deref(), Some("plain <html> body"));
    }

    #[test]
    fn test_scalar_json_is_a_leaf() {
        let node = decompose("payload", "42");
        assert!(node.is_leaf());
        assert_eq!(node.display(), "payload: 42");
    }
}
