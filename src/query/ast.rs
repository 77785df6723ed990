//! 规则 AST
//!
//! 解析器产出的语法树：表达式、路径模式与子句。所有节点都是
//! 带判别标签的封闭枚举，按 kind 分派。

use std::collections::HashMap;

use crate::core::value::Value;
use crate::graph::Direction;

/// 二元操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    In,
}

/// 一元操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    IsNull,
    IsNotNull,
}

/// WHERE 与动作参数中的表达式树
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(String),
    /// `x.prop` — 绑定实体上的属性访问
    Property { variable: String, key: String },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    List(Vec<Expression>),
}

impl Expression {
    /// 表达式是否不引用任何变量（可在空绑定下求值）
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Variable(_) | Expression::Property { .. } => false,
            Expression::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::Unary { operand, .. } => operand.is_constant(),
            Expression::List(items) => items.iter().all(Expression::is_constant),
        }
    }
}

/// 节点模式：可选变量、零或多个标签、属性约束
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Expression>,
}

impl NodePattern {
    /// 没有标签也没有属性约束的裸引用，如 CREATE (p)-[...]->(t) 中的 (p)
    pub fn is_bare_reference(&self) -> bool {
        self.labels.is_empty() && self.properties.is_empty()
    }
}

/// 关系模式
///
/// `min_hops`/`max_hops` 已由解析器归一化：固定单跳为 (1, Some(1))，
/// `*` 为 (1, None)，`*n` 为 (n, Some(n))，`*a..b` 为 (a, Some(b))。
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub min_hops: usize,
    pub max_hops: Option<usize>,
    pub properties: HashMap<String, Expression>,
}

impl RelationshipPattern {
    /// 可变长度段：跳数范围不是恰好 (1, 1)
    pub fn is_variable_length(&self) -> bool {
        !(self.min_hops == 1 && self.max_hops == Some(1))
    }
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

/// 路径段：一个关系模式加目标节点模式
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub relationship: RelationshipPattern,
    pub node: NodePattern,
}

/// 路径模式：起始节点加有序段列表（可为空）
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

    /// 模式中出现的全部节点模式，按出现顺序
    pub fn node_patterns(&self) -> impl Iterator<Item = &NodePattern> {
        std::iter::once(&self.start).chain(self.segments.iter().map(|s| &s.node))
    }
}

/// MATCH 子句：逗号分隔的独立模式加可选过滤
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub patterns: Vec<PathPattern>,
    pub where_clause: Option<Expression>,
}

/// CREATE 子句的单项
#[derive(Debug, Clone, PartialEq)]
pub enum CreateItem {
    Node(NodePattern),
    Path(PathPattern),
}

/// SET 子句的单项：`variable.key = expression`
#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub variable: String,
    pub key: String,
    pub value: Expression,
}

/// 规则体中的动作子句，按书写顺序执行
#[derive(Debug, Clone, PartialEq)]
pub enum ActionClause {
    Create(Vec<CreateItem>),
    Set(Vec<SetItem>),
}

/// RETURN 项
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

/// 一条完整规则
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub match_clause: Option<MatchClause>,
    pub actions: Vec<ActionClause>,
    pub return_items: Option<Vec<ReturnItem>>,
}
