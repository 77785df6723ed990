//! 规则文本解析器
//!
//! 词法分析、标记游标与各子句解析器。对外入口是 [`RuleParser`]。

pub mod clause_parser;
pub mod expression_parser;
pub mod lexer;
pub mod parser_core;
pub mod pattern_parser;

use crate::core::error::EngineResult;
use crate::query::ast::Rule;

pub use lexer::{RuleLexer, Token, TokenType};
pub use parser_core::ParserCore;

/// 规则解析入口
#[derive(Debug, Default)]
pub struct RuleParser;

impl RuleParser {
    /// 解析一条规则文本为 AST
    pub fn parse(rule_text: &str) -> EngineResult<Rule> {
        ParserCore::new(rule_text)?.parse_rule()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_facade() {
        let rule = RuleParser::parse("CREATE (n:Thing)").unwrap();
        assert_eq!(rule.actions.len(), 1);
    }

    #[test]
    fn test_parse_error_surfaces_as_engine_error() {
        let err = RuleParser::parse("MATCH (n:Person@)").unwrap_err();
        assert!(err.to_string().starts_with("Parse error"));
    }
}
