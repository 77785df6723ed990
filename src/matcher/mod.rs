//! 模式匹配器
//!
//! 枚举满足节点/关系/路径模式的图元素。路径匹配是一个广度优先
//! 搜索，状态为（当前节点、已走路径、段下标、段内跳数、路径上的
//! 已访问集合）；每条候选边独立尝试 complete / extend / advance
//! 三种推进方式。同一节点不会在一条路径上出现两次，结果按规范串
//! 去重，数量与深度受配置上限约束。
//!
//! 标签与类型缓存按图的 epoch 批量失效：正确性不依赖缓存新鲜度。

pub mod combiner;
pub mod pattern;

use log::{debug, trace};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};

use crate::config::MatcherConfig;
use crate::core::binding::BindingContext;
use crate::core::node_edge_path::{Edge, Node, Path};
use crate::core::value::Value;
use crate::graph::{Direction, Graph};
use crate::index::{LabelIndex, TypeIndex};

pub use pattern::{NodePattern, PathPattern, PathSegment, RelationshipPattern};

/// 一次成功的路径匹配：路径本身加上每段实际走过的边
#[derive(Debug, Clone)]
pub struct PathMatch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub segment_edges: Vec<Vec<Edge>>,
}

impl PathMatch {
    pub fn to_path(&self) -> Path {
        Path {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn canonical_key(&self) -> String {
        self.to_path().canonical_key()
    }
}

/// BFS遍历状态
#[derive(Debug, Clone)]
struct TraversalState {
    node_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    segment_edges: Vec<Vec<Edge>>,
    segment_index: usize,
    hops: usize,
    visited: HashSet<String>,
}

/// 模式匹配器
#[derive(Debug)]
pub struct PatternMatcher {
    config: MatcherConfig,
    label_cache: RefCell<Option<(u64, LabelIndex)>>,
    type_cache: RefCell<Option<(u64, TypeIndex)>>,
}

impl PatternMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            label_cache: RefCell::new(None),
            type_cache: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// 丢弃标签与类型缓存；下次查询时按需重建
    pub fn clear_cache(&self) {
        *self.label_cache.borrow_mut() = None;
        *self.type_cache.borrow_mut() = None;
    }

    /// 枚举满足节点模式的所有节点
    pub fn find_matching_nodes(&self, graph: &Graph, pattern: &NodePattern) -> Vec<Node> {
        let case_sensitive = self.config.case_sensitive_labels;
        let coerce = self.config.coerce_property_values;

        // Pre-bound id: at most one candidate.
        if let Some(id) = pattern.bound_id() {
            return graph
                .get_node(id)
                .filter(|node| pattern.matches(node, case_sensitive, coerce))
                .cloned()
                .into_iter()
                .collect();
        }

        if let Some(first_label) = pattern.labels.first() {
            let candidate_ids = self.with_label_index(graph, |index| {
                index
                    .get_nodes_by_label(first_label)
                    .map(|ids| ids.to_vec())
                    .unwrap_or_default()
            });
            return candidate_ids
                .iter()
                .filter_map(|id| graph.get_node(id))
                .filter(|node| pattern.matches(node, case_sensitive, coerce))
                .cloned()
                .collect();
        }

        graph
            .get_all_nodes()
            .into_iter()
            .filter(|node| pattern.matches(node, case_sensitive, coerce))
            .cloned()
            .collect()
    }

    /// 枚举满足关系模式的边。提供 `source` 时按方向约束在其邻接边
    /// 中查找：incoming 在内部翻转为以该节点为目标端。
    pub fn find_matching_relationships(
        &self,
        graph: &Graph,
        pattern: &RelationshipPattern,
        source: Option<&str>,
    ) -> Vec<Edge> {
        let case_sensitive = self.config.case_sensitive_labels;
        let coerce = self.config.coerce_property_values;

        if let Some(source_id) = source {
            return graph
                .get_edges_for_node(source_id, pattern.direction)
                .into_iter()
                .filter(|edge| pattern.matches(edge, case_sensitive, coerce))
                .cloned()
                .collect();
        }

        if let Some(rel_type) = &pattern.rel_type {
            let keys = self.with_type_index(graph, |index| {
                index
                    .get_edges_by_type(rel_type)
                    .map(|keys| keys.to_vec())
                    .unwrap_or_default()
            });
            return keys
                .iter()
                .filter_map(|(src, tgt, label)| graph.get_edge(src, tgt, label))
                .filter(|edge| pattern.matches(edge, case_sensitive, coerce))
                .cloned()
                .collect();
        }

        graph
            .get_all_edges()
            .into_iter()
            .filter(|edge| pattern.matches(edge, case_sensitive, coerce))
            .cloned()
            .collect()
    }

    /// 枚举满足路径模式的所有路径（去重后，按首次产生顺序）
    pub fn find_matching_paths(&self, graph: &Graph, pattern: &PathPattern) -> Vec<Path> {
        self.find_path_matches(graph, pattern)
            .iter()
            .map(PathMatch::to_path)
            .collect()
    }

    /// 返回模式副本：变量已绑定到节点的节点模式获得等于该节点
    /// 标识符的 `id` 约束，使后续求值尊重先前匹配的绑定
    pub fn enrich_pattern_with_bindings(
        &self,
        pattern: &PathPattern,
        bindings: &BindingContext,
    ) -> PathPattern {
        pattern.enriched_with_bindings(bindings)
    }

    /// 路径匹配并为每个结果构造绑定上下文
    pub fn match_pattern(&self, graph: &Graph, pattern: &PathPattern) -> Vec<BindingContext> {
        self.find_path_matches(graph, pattern)
            .iter()
            .map(|m| Self::bindings_for_match(pattern, m))
            .collect()
    }

    /// 路径匹配核心：BFS 加 complete/extend/advance 三分支
    pub fn find_path_matches(&self, graph: &Graph, pattern: &PathPattern) -> Vec<PathMatch> {
        let case_sensitive = self.config.case_sensitive_labels;
        let coerce = self.config.coerce_property_values;

        let start_nodes = self.find_matching_nodes(graph, &pattern.start);

        let mut results: Vec<PathMatch> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // Degenerate pattern: a bare node, no traversal.
        if pattern.segments.is_empty() {
            for node in start_nodes {
                if results.len() >= self.config.max_path_results {
                    break;
                }
                results.push(PathMatch {
                    nodes: vec![node],
                    edges: Vec::new(),
                    segment_edges: Vec::new(),
                });
            }
            return results;
        }

        let mut queue: VecDeque<TraversalState> = start_nodes
            .into_iter()
            .map(|node| TraversalState {
                node_id: node.id.clone(),
                visited: HashSet::from([node.id.clone()]),
                nodes: vec![node],
                edges: Vec::new(),
                segment_edges: vec![Vec::new()],
                segment_index: 0,
                hops: 0,
            })
            .collect();

        'search: while let Some(state) = queue.pop_front() {
            let segment = &pattern.segments[state.segment_index];
            let rel = &segment.relationship;
            let is_final = state.segment_index + 1 == pattern.segments.len();

            for edge in graph.get_edges_for_node(&state.node_id, rel.direction) {
                if !rel.matches(edge, case_sensitive, coerce) {
                    continue;
                }

                let neighbor_id = match rel.direction {
                    Direction::Outgoing => edge.target.as_str(),
                    Direction::Incoming => edge.source.as_str(),
                    Direction::Both => match edge.other_endpoint(&state.node_id) {
                        Some(id) => id,
                        None => continue,
                    },
                };
                let neighbor = match graph.get_node(neighbor_id) {
                    Some(node) => node,
                    None => continue,
                };

                let next_hops = state.hops + 1;
                if state.edges.len() + 1 > self.config.max_path_depth {
                    trace!("path depth limit reached at node {}", state.node_id);
                    continue;
                }
                let cycle = state.visited.contains(neighbor_id);
                if cycle {
                    continue;
                }
                let target_matches = segment.node.matches(neighbor, case_sensitive, coerce);

                // complete: final segment satisfied, emit a result.
                if is_final && next_hops >= rel.min_hops && target_matches {
                    let mut matched = PathMatch {
                        nodes: state.nodes.clone(),
                        edges: state.edges.clone(),
                        segment_edges: state.segment_edges.clone(),
                    };
                    matched.nodes.push(neighbor.clone());
                    matched.edges.push(edge.clone());
                    matched
                        .segment_edges
                        .last_mut()
                        .expect("one bucket per entered segment")
                        .push(edge.clone());

                    if seen.insert(matched.canonical_key()) {
                        trace!("emitting path {}", matched.canonical_key());
                        results.push(matched);
                        if results.len() >= self.config.max_path_results {
                            debug!(
                                "truncating path results at configured limit {}",
                                self.config.max_path_results
                            );
                            break 'search;
                        }
                    }
                }

                // extend: stay in a variable-length segment.
                let below_max = rel.max_hops.map_or(true, |max| next_hops < max);
                if rel.is_variable_length() && below_max {
                    queue.push_back(Self::step(&state, edge, neighbor, false));
                }

                // advance: move on to the next segment.
                if !is_final && next_hops >= rel.min_hops && target_matches {
                    queue.push_back(Self::step(&state, edge, neighbor, true));
                }
            }
        }

        results
    }

    fn step(
        state: &TraversalState,
        edge: &Edge,
        neighbor: &Node,
        advance_segment: bool,
    ) -> TraversalState {
        let mut next = state.clone();
        next.node_id = neighbor.id.clone();
        next.nodes.push(neighbor.clone());
        next.edges.push(edge.clone());
        next.segment_edges
            .last_mut()
            .expect("one bucket per entered segment")
            .push(edge.clone());
        next.visited.insert(neighbor.id.clone());
        if advance_segment {
            next.segment_index += 1;
            next.hops = 0;
            next.segment_edges.push(Vec::new());
        } else {
            next.hops += 1;
        }
        next
    }

    /// 由一次路径匹配构造绑定：起始变量绑定节点，各段的目标变量绑定
    /// 段终点；关系变量在固定单跳段绑定该边，可变长度段绑定边列表。
    fn bindings_for_match(pattern: &PathPattern, matched: &PathMatch) -> BindingContext {
        let mut bindings = BindingContext::new();

        if let Some(variable) = &pattern.start.variable {
            bindings.set(variable.clone(), Value::Node(matched.nodes[0].clone()));
        }

        let mut node_index = 0;
        for (i, segment) in pattern.segments.iter().enumerate() {
            let edges = &matched.segment_edges[i];
            node_index += edges.len();

            if let Some(variable) = &segment.relationship.variable {
                let value = if segment.relationship.is_variable_length() {
                    Value::List(edges.iter().cloned().map(Value::Edge).collect())
                } else {
                    Value::Edge(edges[0].clone())
                };
                bindings.set(variable.clone(), value);
            }
            if let Some(variable) = &segment.node.variable {
                bindings.set(variable.clone(), Value::Node(matched.nodes[node_index].clone()));
            }
        }

        bindings
    }

    fn with_label_index<R>(&self, graph: &Graph, f: impl FnOnce(&LabelIndex) -> R) -> R {
        let mut cache = self.label_cache.borrow_mut();
        let stale = !matches!(cache.as_ref(), Some((epoch, _)) if *epoch == graph.epoch());
        if stale {
            debug!("rebuilding label index at epoch {}", graph.epoch());
            *cache = Some((
                graph.epoch(),
                LabelIndex::build(graph, self.config.case_sensitive_labels),
            ));
        }
        f(&cache.as_ref().expect("cache populated above").1)
    }

    fn with_type_index<R>(&self, graph: &Graph, f: impl FnOnce(&TypeIndex) -> R) -> R {
        let mut cache = self.type_cache.borrow_mut();
        let stale = !matches!(cache.as_ref(), Some((epoch, _)) if *epoch == graph.epoch());
        if stale {
            debug!("rebuilding type index at epoch {}", graph.epoch());
            *cache = Some((
                graph.epoch(),
                TypeIndex::build(graph, self.config.case_sensitive_labels),
            ));
        }
        f(&cache.as_ref().expect("cache populated above").1)
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}
