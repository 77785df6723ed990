//! 匹配器模式类型
//!
//! 解析器产出的模式带表达式形式的属性约束；匹配前先在空绑定下
//! 求值为字面量形式。保留键 `id` 与节点标识符比较而非属性。

use std::collections::HashMap;

use crate::core::binding::BindingContext;
use crate::core::error::EngineResult;
use crate::core::node_edge_path::{Edge, Node};
use crate::core::value::Value;
use crate::expression::ExpressionEvaluator;
use crate::graph::{Direction, Graph};
use crate::query::ast;

/// 属性约束是否满足；`null` 约束要求属性缺失或为 null
fn constraint_holds(actual: Option<&Value>, expected: &Value, coerce: bool) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (Some(Value::Null), Value::Null) => true,
        (Some(actual), expected) => actual.equals(expected, coerce) == Some(true),
        (None, _) => false,
    }
}

/// 字面量化的节点模式
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Value>,
}

impl NodePattern {
    /// 模式携带的 `id` 约束（如有）
    pub fn bound_id(&self) -> Option<&str> {
        match self.properties.get("id") {
            Some(Value::String(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn matches(&self, node: &Node, case_sensitive: bool, coerce: bool) -> bool {
        for label in &self.labels {
            if !node.has_label(label, case_sensitive) {
                return false;
            }
        }
        for (key, expected) in &self.properties {
            if key == "id" {
                let id_value = Value::String(node.id.clone());
                if id_value.equals(expected, coerce) != Some(true) {
                    return false;
                }
                continue;
            }
            if !constraint_holds(node.get_property(key), expected, coerce) {
                return false;
            }
        }
        true
    }
}

/// 字面量化的关系模式
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub min_hops: usize,
    pub max_hops: Option<usize>,
    pub properties: HashMap<String, Value>,
}

impl Default for RelationshipPattern {
    fn default() -> Self {
        Self {
            variable: None,
            rel_type: None,
            direction: Direction::Outgoing,
            min_hops: 1,
            max_hops: Some(1),
            properties: HashMap::new(),
        }
    }
}

impl RelationshipPattern {
    pub fn is_variable_length(&self) -> bool {
        !(self.min_hops == 1 && self.max_hops == Some(1))
    }

    pub fn matches(&self, edge: &Edge, case_sensitive: bool, coerce: bool) -> bool {
        if let Some(rel_type) = &self.rel_type {
            let type_matches = if case_sensitive {
                edge.label == *rel_type
            } else {
                edge.label.eq_ignore_ascii_case(rel_type)
            };
            if !type_matches {
                return false;
            }
        }
        for (key, expected) in &self.properties {
            if !constraint_holds(edge.get_property(key), expected, coerce) {
                return false;
            }
        }
        true
    }
}

/// 字面量化的路径段
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub relationship: RelationshipPattern,
    pub node: NodePattern,
}

/// 字面量化的路径模式
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub start: NodePattern,
    pub segments: Vec<PathSegment>,
}

impl PathPattern {
    pub fn single(start: NodePattern) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    fn node_patterns_mut(&mut self) -> impl Iterator<Item = &mut NodePattern> {
        std::iter::once(&mut self.start).chain(self.segments.iter_mut().map(|s| &mut s.node))
    }

    /// 返回模式副本：凡变量已绑定到节点的节点模式，追加等于该节点
    /// 标识符的 `id` 约束。用于让后续子句尊重先前匹配的绑定。
    pub fn enriched_with_bindings(&self, bindings: &BindingContext) -> PathPattern {
        let mut enriched = self.clone();
        for node_pattern in enriched.node_patterns_mut() {
            if let Some(variable) = &node_pattern.variable {
                if let Some(Value::Node(node)) = bindings.get(variable) {
                    node_pattern
                        .properties
                        .insert("id".to_string(), Value::String(node.id.clone()));
                }
            }
        }
        enriched
    }
}

/// 将 AST 节点模式在空绑定下求值为字面量形式
pub fn resolve_node_pattern(
    pattern: &ast::NodePattern,
    evaluator: &ExpressionEvaluator,
    graph: &Graph,
) -> EngineResult<NodePattern> {
    let empty = BindingContext::new();
    let mut properties = HashMap::new();
    for (key, expression) in &pattern.properties {
        properties.insert(key.clone(), evaluator.evaluate(expression, &empty, graph)?);
    }
    Ok(NodePattern {
        variable: pattern.variable.clone(),
        labels: pattern.labels.clone(),
        properties,
    })
}

/// 将 AST 路径模式求值为字面量形式
pub fn resolve_path_pattern(
    pattern: &ast::PathPattern,
    evaluator: &ExpressionEvaluator,
    graph: &Graph,
) -> EngineResult<PathPattern> {
    let empty = BindingContext::new();
    let start = resolve_node_pattern(&pattern.start, evaluator, graph)?;

    let mut segments = Vec::with_capacity(pattern.segments.len());
    for segment in &pattern.segments {
        let rel = &segment.relationship;
        let mut properties = HashMap::new();
        for (key, expression) in &rel.properties {
            properties.insert(key.clone(), evaluator.evaluate(expression, &empty, graph)?);
        }
        segments.push(PathSegment {
            relationship: RelationshipPattern {
                variable: rel.variable.clone(),
                rel_type: rel.rel_type.clone(),
                direction: rel.direction,
                min_hops: rel.min_hops,
                max_hops: rel.max_hops,
                properties,
            },
            node: resolve_node_pattern(&segment.node, evaluator, graph)?,
        });
    }

    Ok(PathPattern { start, segments })
}
