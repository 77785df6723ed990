//! 解析器核心
//!
//! 标记游标与各子解析器共享的基础方法。

use std::collections::HashMap;

use crate::core::error::{EngineError, EngineResult};
use crate::query::ast::Expression;
use crate::query::parser::lexer::{RuleLexer, Token, TokenType};

/// 规则解析器核心结构
#[derive(Debug)]
pub struct ParserCore {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
}

impl ParserCore {
    pub fn new(input: &str) -> EngineResult<Self> {
        let tokens = RuleLexer::new(input)
            .tokenize()
            .map_err(EngineError::parse)?;
        Ok(Self { tokens, current: 0 })
    }

    pub fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub fn peek_token(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    pub fn consume_token(&mut self) -> &Token {
        let token = &self.tokens[self.current];
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    pub fn is_eof(&self) -> bool {
        self.current_token().token_type == TokenType::Eof
    }

    pub fn at_type(&self, token_type: TokenType) -> bool {
        self.current_token().token_type == token_type
    }

    pub fn at_value(&self, value: &str) -> bool {
        self.current_token().value == value
    }

    pub fn at_keyword(&self, keyword: &str) -> bool {
        self.at_type(TokenType::Keyword)
            && self.current_token().value.eq_ignore_ascii_case(keyword)
    }

    pub fn expect_value(&mut self, value: &str) -> EngineResult<()> {
        if self.at_value(value) {
            self.consume_token();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", value)))
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> EngineResult<()> {
        if self.at_keyword(keyword) {
            self.consume_token();
            Ok(())
        } else {
            Err(self.unexpected(&format!("keyword '{}'", keyword)))
        }
    }

    pub fn parse_identifier(&mut self) -> EngineResult<String> {
        // Keywords double as identifiers in label/property position.
        if self.at_type(TokenType::Identifier) || self.at_type(TokenType::Keyword) {
            Ok(self.consume_token().value.clone())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    pub fn parse_integer(&mut self) -> EngineResult<usize> {
        if self.at_type(TokenType::LiteralNumber) {
            let token = self.consume_token();
            token.value.parse::<usize>().map_err(|e| {
                EngineError::parse(format!(
                    "invalid integer '{}' at position {}: {}",
                    token.value, token.position, e
                ))
            })
        } else {
            Err(self.unexpected("integer literal"))
        }
    }

    /// 解析属性映射 `{key: expr, ...}`；没有 `{` 时返回空映射
    pub fn parse_property_map(&mut self) -> EngineResult<HashMap<String, Expression>> {
        let mut properties = HashMap::new();
        if !self.at_value("{") {
            return Ok(properties);
        }
        self.consume_token(); // '{'

        while !self.at_value("}") && !self.is_eof() {
            let key = self.parse_identifier()?;
            self.expect_value(":")?;
            let value = self.parse_expression()?;
            properties.insert(key, value);

            if self.at_value(",") {
                self.consume_token();
            } else {
                break;
            }
        }

        self.expect_value("}")?;
        Ok(properties)
    }

    /// 解析标签/类型列表 `:A:B`
    pub fn parse_labels(&mut self) -> EngineResult<Vec<String>> {
        let mut labels = Vec::new();
        while self.at_value(":") {
            self.consume_token();
            labels.push(self.parse_identifier()?);
        }
        Ok(labels)
    }

    pub(crate) fn unexpected(&self, expected: &str) -> EngineError {
        let token = self.current_token();
        let found = if token.token_type == TokenType::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.value)
        };
        EngineError::parse(format!(
            "expected {}, found {} at position {}",
            expected, found, token.position
        ))
    }
}
