//! 模式解析器
//!
//! 节点模式、关系模式（含方向与跳数范围）与路径模式。

use crate::core::error::EngineResult;
use crate::graph::Direction;
use crate::query::ast::{NodePattern, PathPattern, PathSegment, RelationshipPattern};
use crate::query::parser::lexer::TokenType;
use crate::query::parser::parser_core::ParserCore;

impl ParserCore {
    /// 解析节点模式 `(variable:Label {key: value})`
    pub fn parse_node_pattern(&mut self) -> EngineResult<NodePattern> {
        self.expect_value("(")?;

        let variable = if self.at_type(TokenType::Identifier) {
            Some(self.consume_token().value.clone())
        } else {
            None
        };

        let labels = self.parse_labels()?;
        let properties = self.parse_property_map()?;

        self.expect_value(")")?;

        Ok(NodePattern {
            variable,
            labels,
            properties,
        })
    }

    /// 解析路径模式：起始节点加零或多个 (关系, 节点) 段
    pub fn parse_path_pattern(&mut self) -> EngineResult<PathPattern> {
        let start = self.parse_node_pattern()?;
        let mut segments = Vec::new();

        while self.at_value("-") || self.at_value("<-") {
            let relationship = self.parse_relationship_pattern()?;
            let node = self.parse_node_pattern()?;
            segments.push(PathSegment { relationship, node });
        }

        Ok(PathPattern { start, segments })
    }

    /// 解析关系模式 `-[variable:TYPE*min..max {key: value}]->`
    pub fn parse_relationship_pattern(&mut self) -> EngineResult<RelationshipPattern> {
        let points_left = if self.at_value("<-") {
            self.consume_token();
            true
        } else {
            self.expect_value("-")?;
            false
        };

        self.expect_value("[")?;

        let variable = if self.at_type(TokenType::Identifier) {
            Some(self.consume_token().value.clone())
        } else {
            None
        };

        let rel_type = if self.at_value(":") {
            self.consume_token();
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let (min_hops, max_hops) = self.parse_hop_spec()?;
        let properties = self.parse_property_map()?;

        self.expect_value("]")?;

        let direction = if self.at_value("->") {
            self.consume_token();
            if points_left {
                return Err(self.unexpected("'-' after '<-[...]'"));
            }
            Direction::Outgoing
        } else {
            self.expect_value("-")?;
            if points_left {
                Direction::Incoming
            } else {
                Direction::Both
            }
        };

        Ok(RelationshipPattern {
            variable,
            rel_type,
            direction,
            min_hops,
            max_hops,
            properties,
        })
    }

    /// 解析跳数范围。固定单跳为 (1, Some(1))；`*` 无上界为 (1, None)；
    /// `*n` 为 (n, Some(n))；`*a..` 为 (a, None)；`*a..b` 为 (a, Some(b))。
    fn parse_hop_spec(&mut self) -> EngineResult<(usize, Option<usize>)> {
        if !self.at_value("*") {
            return Ok((1, Some(1)));
        }
        self.consume_token(); // '*'

        let lower = if self.at_type(TokenType::LiteralNumber) {
            Some(self.parse_integer()?)
        } else {
            None
        };

        if self.at_value("..") {
            self.consume_token();
            let upper = if self.at_type(TokenType::LiteralNumber) {
                Some(self.parse_integer()?)
            } else {
                None
            };
            Ok((lower.unwrap_or(1), upper))
        } else {
            match lower {
                Some(n) => Ok((n, Some(n))),
                None => Ok((1, None)),
            }
        }
    }
}
