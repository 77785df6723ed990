//! 索引系统
//!
//! 标签与关系类型的倒排索引，作为匹配器缓存的底层结构。
//! 索引是建议性的快照：正确性不依赖其新鲜度，匹配器按图的
//! epoch 判断是否需要整体重建。

use std::collections::HashMap;

use crate::graph::{EdgeKey, Graph};

fn normalize(label: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        label.to_string()
    } else {
        label.to_ascii_lowercase()
    }
}

/// Inverted index from node label to node ids.
///
/// A node is listed under its primary label and under every entry of a
/// `labels` array in its property bag.
#[derive(Debug, Default)]
pub struct LabelIndex {
    entries: HashMap<String, Vec<String>>,
    case_sensitive: bool,
}

impl LabelIndex {
    pub fn build(graph: &Graph, case_sensitive: bool) -> Self {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for node in graph.get_all_nodes() {
            for label in node.all_labels() {
                entries
                    .entry(normalize(label, case_sensitive))
                    .or_default()
                    .push(node.id.clone());
            }
        }
        Self {
            entries,
            case_sensitive,
        }
    }

    pub fn get_nodes_by_label(&self, label: &str) -> Option<&[String]> {
        self.entries
            .get(&normalize(label, self.case_sensitive))
            .map(Vec::as_slice)
    }

    pub fn label_count(&self) -> usize {
        self.entries.len()
    }
}

/// Inverted index from relationship type to edge keys.
#[derive(Debug, Default)]
pub struct TypeIndex {
    entries: HashMap<String, Vec<EdgeKey>>,
    case_sensitive: bool,
}

impl TypeIndex {
    pub fn build(graph: &Graph, case_sensitive: bool) -> Self {
        let mut entries: HashMap<String, Vec<EdgeKey>> = HashMap::new();
        for edge in graph.get_all_edges() {
            entries
                .entry(normalize(&edge.label, case_sensitive))
                .or_default()
                .push(edge.key());
        }
        Self {
            entries,
            case_sensitive,
        }
    }

    pub fn get_edges_by_type(&self, edge_type: &str) -> Option<&[EdgeKey]> {
        self.entries
            .get(&normalize(edge_type, self.case_sensitive))
            .map(Vec::as_slice)
    }
}
