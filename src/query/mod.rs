//! 查询前端
//!
//! 规则文本的 AST 定义、词法/语法分析器，以及 Markdown 规则块提取。

pub mod ast;
pub mod markdown;
pub mod parser;

pub use ast::{
    ActionClause, BinaryOperator, CreateItem, Expression, MatchClause, NodePattern, PathPattern,
    PathSegment, RelationshipPattern, ReturnItem, Rule, SetItem, UnaryOperator,
};
pub use markdown::{extract_rule_blocks, RuleBlock};
pub use parser::RuleParser;
