//! 图元素类型
//!
//! 节点、边与路径。节点由不透明的字符串标识符定位，图存储是身份的
//! 唯一拥有者；模式与绑定通过标识符引用节点，路径是匹配器产生的值。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::value::Value;

/// A node in the graph: stable id, one primary label, and a property bag.
///
/// A node may additionally carry a `labels` array inside its property bag;
/// label matching consults both the primary label and that array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub properties: HashMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_properties(
        id: impl Into<String>,
        label: impl Into<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties,
        }
    }

    pub fn get_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// All labels this node answers to: the primary label plus any entries
    /// of a `labels` array in the property bag.
    pub fn all_labels(&self) -> Vec<&str> {
        let mut labels = vec![self.label.as_str()];
        if let Some(Value::List(extra)) = self.properties.get("labels") {
            for entry in extra {
                if let Value::String(s) = entry {
                    if !labels.contains(&s.as_str()) {
                        labels.push(s.as_str());
                    }
                }
            }
        }
        labels
    }

    /// Label check honoring the configured case sensitivity.
    pub fn has_label(&self, label: &str, case_sensitive: bool) -> bool {
        self.all_labels().iter().any(|candidate| {
            if case_sensitive {
                *candidate == label
            } else {
                candidate.eq_ignore_ascii_case(label)
            }
        })
    }
}

/// A directed edge, uniquely identified by the (source, target, label)
/// triple within a graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub properties: HashMap<String, Value>,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_properties(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            properties,
        }
    }

    pub fn get_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    /// 给定一个端点，返回另一端
    pub fn other_endpoint<'a>(&'a self, node_id: &str) -> Option<&'a str> {
        if self.source == node_id {
            Some(self.target.as_str())
        } else if self.target == node_id {
            Some(self.source.as_str())
        } else {
            None
        }
    }

    /// Identity key of this edge within a graph.
    pub fn key(&self) -> (String, String, String) {
        (self.source.clone(), self.target.clone(), self.label.clone())
    }
}

/// An alternating node-edge sequence `n0, e0, n1, ..., nk` with `k >= 0`.
///
/// Paths are values produced by the matcher, not stored entities; they hold
/// copies of the traversed elements. `edges.len() == nodes.len() - 1` always.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Path {
    /// 以单个节点开始的路径（零跳）
    pub fn single(node: Node) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
        }
    }

    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn end(&self) -> &Node {
        self.nodes.last().expect("a path always has a start node")
    }

    /// Number of edge traversals.
    pub fn length(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }

    /// Canonical form used to deduplicate paths reached through different
    /// traversal interleavings: `nodeIds|src-label-tgt,...`.
    pub fn canonical_key(&self) -> String {
        let node_part: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let edge_part: Vec<String> = self
            .edges
            .iter()
            .map(|e| format!("{}-{}-{}", e.source, e.label, e.target))
            .collect();
        format!("{}|{}", node_part.join(","), edge_part.join(","))
    }
}
