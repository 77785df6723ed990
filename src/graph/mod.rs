//! 图存储核心模块
//!
//! 有向标签属性多重图的内存存储。节点以标识符为键，边以
//! (source, target, label) 三元组为键；同一三元组的重复插入替换旧边。
//! 存储是身份的唯一来源，并维护一个随每次变更递增的 epoch，
//! 供匹配器的标签/类型缓存做批量失效。

pub mod id_generator;

use log::debug;
use std::collections::HashMap;

use crate::core::error::{EngineError, EngineResult};
use crate::core::node_edge_path::{Edge, Node};
use crate::core::value::Value;

pub use id_generator::IdGenerator;

/// Edge identity within a graph.
pub type EdgeKey = (String, String, String);

/// Direction of incident-edge lookup relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// In-memory directed labeled property multigraph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    edges: HashMap<EdgeKey, Edge>,
    outgoing: HashMap<String, Vec<EdgeKey>>,
    incoming: HashMap<String, Vec<EdgeKey>>,
    epoch: u64,
    id_generator: IdGenerator,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_generator(id_generator: IdGenerator) -> Self {
        Self {
            id_generator,
            ..Self::default()
        }
    }

    /// Mutation epoch: incremented by every state-changing operation.
    /// Cache consumers compare epochs instead of subscribing to changes.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Allocates a node id that is not yet present in this graph.
    pub fn generate_node_id(&self) -> String {
        loop {
            let id = self.id_generator.next_id();
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        data: HashMap<String, Value>,
    ) -> EngineResult<Node> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(EngineError::DuplicateNode(id));
        }
        let node = Node::with_properties(id.clone(), label, data);
        self.nodes.insert(id, node.clone());
        self.epoch += 1;
        Ok(node)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Removes a node and all incident edges atomically. No-op when absent.
    pub fn remove_node(&mut self, id: &str) {
        if self.nodes.remove(id).is_none() {
            return;
        }
        let incident: Vec<EdgeKey> = self
            .outgoing
            .remove(id)
            .unwrap_or_default()
            .into_iter()
            .chain(self.incoming.remove(id).unwrap_or_default())
            .collect();
        for key in incident {
            if self.edges.remove(&key).is_some() {
                Self::detach_key(&mut self.outgoing, &key.0, &key);
                Self::detach_key(&mut self.incoming, &key.1, &key);
            }
        }
        self.epoch += 1;
    }

    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
        data: HashMap<String, Value>,
    ) -> EngineResult<Edge> {
        let source = source.into();
        let target = target.into();
        let label = label.into();

        if !self.nodes.contains_key(&source) {
            return Err(EngineError::UnknownNode(source));
        }
        if !self.nodes.contains_key(&target) {
            return Err(EngineError::UnknownNode(target));
        }

        let key = (source.clone(), target.clone(), label.clone());
        let edge = Edge::with_properties(source, target, label, data);

        if self.edges.insert(key.clone(), edge.clone()).is_some() {
            // Same triple: the adjacency lists already carry this key.
            debug!("replacing edge {:?}", key);
        } else {
            self.outgoing
                .entry(key.0.clone())
                .or_default()
                .push(key.clone());
            self.incoming.entry(key.1.clone()).or_default().push(key);
        }
        self.epoch += 1;
        Ok(edge)
    }

    pub fn get_edge(&self, source: &str, target: &str, label: &str) -> Option<&Edge> {
        self.edges
            .get(&(source.to_string(), target.to_string(), label.to_string()))
    }

    /// No-op when the triple is absent.
    pub fn remove_edge(&mut self, source: &str, target: &str, label: &str) {
        let key = (source.to_string(), target.to_string(), label.to_string());
        if self.edges.remove(&key).is_some() {
            Self::detach_key(&mut self.outgoing, source, &key);
            Self::detach_key(&mut self.incoming, target, &key);
            self.epoch += 1;
        }
    }

    /// Property assignment goes through the graph so the mutation epoch
    /// advances (a `labels` update can change index membership).
    pub fn set_node_property(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: Value,
    ) -> EngineResult<Option<Value>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        let previous = node.set_property(key, value);
        self.epoch += 1;
        Ok(previous)
    }

    pub fn remove_node_property(&mut self, id: &str, key: &str) -> EngineResult<Option<Value>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        let previous = node.remove_property(key);
        self.epoch += 1;
        Ok(previous)
    }

    pub fn set_edge_property(
        &mut self,
        source: &str,
        target: &str,
        label: &str,
        key: impl Into<String>,
        value: Value,
    ) -> EngineResult<Option<Value>> {
        let edge_key = (source.to_string(), target.to_string(), label.to_string());
        let edge = self.edges.get_mut(&edge_key).ok_or_else(|| {
            EngineError::execution(
                "set edge property",
                format!("edge ({})-[:{}]->({}) does not exist", source, label, target),
            )
        })?;
        let previous = edge.set_property(key, value);
        self.epoch += 1;
        Ok(previous)
    }

    pub fn remove_edge_property(
        &mut self,
        source: &str,
        target: &str,
        label: &str,
        key: &str,
    ) -> EngineResult<Option<Value>> {
        let edge_key = (source.to_string(), target.to_string(), label.to_string());
        let edge = self.edges.get_mut(&edge_key).ok_or_else(|| {
            EngineError::execution(
                "remove edge property",
                format!("edge ({})-[:{}]->({}) does not exist", source, label, target),
            )
        })?;
        let previous = edge.properties.remove(key);
        self.epoch += 1;
        Ok(previous)
    }

    pub fn get_all_nodes(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    pub fn get_all_edges(&self) -> Vec<&Edge> {
        self.edges.values().collect()
    }

    pub fn find_nodes<P>(&self, predicate: P) -> Vec<&Node>
    where
        P: Fn(&Node) -> bool,
    {
        self.nodes.values().filter(|n| predicate(n)).collect()
    }

    pub fn find_edges<P>(&self, predicate: P) -> Vec<&Edge>
    where
        P: Fn(&Edge) -> bool,
    {
        self.edges.values().filter(|e| predicate(e)).collect()
    }

    /// Incident edges of a node, in stable insertion order per direction.
    /// With `Direction::Both` a self-loop appears once.
    pub fn get_edges_for_node(&self, id: &str, direction: Direction) -> Vec<&Edge> {
        let mut result = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            if let Some(keys) = self.outgoing.get(id) {
                result.extend(keys.iter().filter_map(|k| self.edges.get(k)));
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            if let Some(keys) = self.incoming.get(id) {
                for key in keys {
                    // Skip self-loops already collected from the outgoing list.
                    if direction == Direction::Both && key.0 == key.1 {
                        continue;
                    }
                    if let Some(edge) = self.edges.get(key) {
                        result.push(edge);
                    }
                }
            }
        }
        result
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn detach_key(adjacency: &mut HashMap<String, Vec<EdgeKey>>, node: &str, key: &EdgeKey) {
        if let Some(keys) = adjacency.get_mut(node) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                adjacency.remove(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_add_node_rejects_duplicate_id() {
        let mut graph = Graph::new();
        graph.add_node("n1", "Person", HashMap::new()).unwrap();
        let err = graph.add_node("n1", "Task", HashMap::new()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode(id) if id == "n1"));
    }

    #[test]
    fn test_add_edge_requires_both_endpoints() {
        let mut graph = Graph::new();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        let err = graph
            .add_edge("a", "missing", "REL", HashMap::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(id) if id == "missing"));
    }

    #[test]
    fn test_add_edge_replaces_existing_triple() {
        let mut graph = Graph::new();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        graph.add_node("b", "X", HashMap::new()).unwrap();
        graph
            .add_edge("a", "b", "REL", props(&[("w", Value::Int(1))]))
            .unwrap();
        graph
            .add_edge("a", "b", "REL", props(&[("w", Value::Int(2))]))
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.get_edge("a", "b", "REL").unwrap();
        assert_eq!(edge.get_property("w"), Some(&Value::Int(2)));
        // The adjacency list must not carry the key twice.
        assert_eq!(graph.get_edges_for_node("a", Direction::Outgoing).len(), 1);
    }

    #[test]
    fn test_remove_node_removes_incident_edges() {
        let mut graph = Graph::new();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        graph.add_node("b", "X", HashMap::new()).unwrap();
        graph.add_node("c", "X", HashMap::new()).unwrap();
        graph.add_edge("a", "b", "R", HashMap::new()).unwrap();
        graph.add_edge("c", "a", "R", HashMap::new()).unwrap();
        graph.add_edge("b", "c", "R", HashMap::new()).unwrap();

        graph.remove_node("a");

        assert!(graph.get_node("a").is_none());
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.get_edge("b", "c", "R").is_some());
        assert!(graph.get_edges_for_node("b", Direction::Incoming).is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut graph = Graph::new();
        let before = graph.epoch();
        graph.remove_node("ghost");
        graph.remove_edge("a", "b", "R");
        assert_eq!(graph.epoch(), before);
    }

    #[test]
    fn test_direction_filtering() {
        let mut graph = Graph::new();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        graph.add_node("b", "X", HashMap::new()).unwrap();
        graph.add_edge("a", "b", "OUT", HashMap::new()).unwrap();
        graph.add_edge("b", "a", "IN", HashMap::new()).unwrap();

        let outgoing = graph.get_edges_for_node("a", Direction::Outgoing);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].label, "OUT");

        let incoming = graph.get_edges_for_node("a", Direction::Incoming);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].label, "IN");

        assert_eq!(graph.get_edges_for_node("a", Direction::Both).len(), 2);
    }

    #[test]
    fn test_self_loop_listed_once_for_both() {
        let mut graph = Graph::new();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        graph.add_edge("a", "a", "LOOP", HashMap::new()).unwrap();
        assert_eq!(graph.get_edges_for_node("a", Direction::Both).len(), 1);
    }

    #[test]
    fn test_epoch_advances_on_mutation() {
        let mut graph = Graph::new();
        let e0 = graph.epoch();
        graph.add_node("a", "X", HashMap::new()).unwrap();
        let e1 = graph.epoch();
        assert!(e1 > e0);
        graph.set_node_property("a", "k", Value::Int(1)).unwrap();
        assert!(graph.epoch() > e1);
    }

    #[test]
    fn test_generate_node_id_skips_taken_ids() {
        let mut graph = Graph::new();
        graph.add_node("node_0", "X", HashMap::new()).unwrap();
        let id = graph.generate_node_id();
        assert_ne!(id, "node_0");
        assert!(graph.get_node(&id).is_none());
    }

    #[test]
    fn test_find_nodes_by_predicate() {
        let mut graph = Graph::new();
        graph.add_node("a", "Person", HashMap::new()).unwrap();
        graph.add_node("b", "Task", HashMap::new()).unwrap();
        let people = graph.find_nodes(|n| n.label == "Person");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].id, "a");
    }
}
