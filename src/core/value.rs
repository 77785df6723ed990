//! 值类型系统
//!
//! 规则引擎中流动的所有值：属性标量、标量列表，以及绑定上下文中
//! 引用的图实体（节点、边、路径）。

use serde::{Deserialize, Serialize};

use crate::core::node_edge_path::{Edge, Node, Path};

/// A value bound to a rule variable or stored in a property bag.
///
/// Property bags only hold the scalar subset (`Null`, `Bool`, `Int`,
/// `Float`, `String`, `List`); the entity variants exist for binding
/// contexts produced by the matcher and the actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Node(Node),
    Edge(Edge),
    Path(Path),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Value::Node(_) | Value::Edge(_) | Value::Path(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Value::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view used by arithmetic and ordering.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// 值类型名，用于错误消息
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Node(_) => "node",
            Value::Edge(_) => "edge",
            Value::Path(_) => "path",
        }
    }

    /// Structural equality with optional numeric coercion.
    ///
    /// Returns `None` when either side is null (three-valued comparison).
    /// Without coercion, `"42"` and `42` are distinct; with coercion a
    /// string that parses as a number compares numerically.
    pub fn equals(&self, other: &Value, coerce: bool) -> Option<bool> {
        if self.is_null() || other.is_null() {
            return None;
        }

        match (self, other) {
            (Value::Int(l), Value::Float(r)) => Some((*l as f64) == *r),
            (Value::Float(l), Value::Int(r)) => Some(*l == (*r as f64)),
            (Value::List(l), Value::List(r)) => {
                if l.len() != r.len() {
                    return Some(false);
                }
                let mut all = true;
                for (a, b) in l.iter().zip(r.iter()) {
                    match a.equals(b, coerce) {
                        Some(true) => {}
                        Some(false) => return Some(false),
                        None => all = false,
                    }
                }
                if all {
                    Some(true)
                } else {
                    None
                }
            }
            _ if coerce => Some(Self::coerced_eq(self, other)),
            _ => Some(self == other),
        }
    }

    fn coerced_eq(left: &Value, right: &Value) -> bool {
        if left == right {
            return true;
        }
        match (left.coerce_to_number(), right.coerce_to_number()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        }
    }

    fn coerce_to_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            // Objects have no place in a property bag; flatten to null.
            serde_json::Value::Object(_) => Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Node(node) => write!(f, "({}:{})", node.id, node.label),
            Value::Edge(edge) => {
                write!(f, "({})-[:{}]->({})", edge.source, edge.label, edge.target)
            }
            Value::Path(path) => write!(f, "path[{} nodes]", path.nodes.len()),
        }
    }
}
