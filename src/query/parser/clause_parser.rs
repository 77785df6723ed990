//! 子句解析器
//!
//! 将标记流组装为完整规则：MATCH ... WHERE ... (CREATE|SET)+ RETURN?

use crate::core::error::{EngineError, EngineResult};
use crate::query::ast::{
    ActionClause, CreateItem, MatchClause, ReturnItem, Rule, SetItem,
};
use crate::query::parser::parser_core::ParserCore;

impl ParserCore {
    /// 解析一条完整规则
    pub fn parse_rule(&mut self) -> EngineResult<Rule> {
        let match_clause = if self.at_keyword("MATCH") {
            Some(self.parse_match_clause()?)
        } else {
            None
        };

        let mut actions = Vec::new();
        loop {
            if self.at_keyword("CREATE") {
                actions.push(ActionClause::Create(self.parse_create_clause()?));
            } else if self.at_keyword("SET") {
                actions.push(ActionClause::Set(self.parse_set_clause()?));
            } else {
                break;
            }
        }

        if actions.is_empty() {
            return Err(EngineError::parse(
                "rule body must contain at least one CREATE or SET clause",
            ));
        }

        let return_items = if self.at_keyword("RETURN") {
            Some(self.parse_return_clause()?)
        } else {
            None
        };

        if !self.is_eof() {
            return Err(self.unexpected("end of rule"));
        }

        Ok(Rule {
            match_clause,
            actions,
            return_items,
        })
    }

    fn parse_match_clause(&mut self) -> EngineResult<MatchClause> {
        self.expect_keyword("MATCH")?;

        let mut patterns = vec![self.parse_path_pattern()?];
        while self.at_value(",") {
            self.consume_token();
            patterns.push(self.parse_path_pattern()?);
        }

        let where_clause = if self.at_keyword("WHERE") {
            self.consume_token();
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(MatchClause {
            patterns,
            where_clause,
        })
    }

    fn parse_create_clause(&mut self) -> EngineResult<Vec<CreateItem>> {
        self.expect_keyword("CREATE")?;

        let mut items = vec![self.parse_create_item()?];
        while self.at_value(",") {
            self.consume_token();
            items.push(self.parse_create_item()?);
        }
        Ok(items)
    }

    fn parse_create_item(&mut self) -> EngineResult<CreateItem> {
        let pattern = self.parse_path_pattern()?;
        if pattern.segments.is_empty() {
            Ok(CreateItem::Node(pattern.start))
        } else {
            Ok(CreateItem::Path(pattern))
        }
    }

    fn parse_set_clause(&mut self) -> EngineResult<Vec<SetItem>> {
        self.expect_keyword("SET")?;

        let mut items = vec![self.parse_set_item()?];
        while self.at_value(",") {
            self.consume_token();
            items.push(self.parse_set_item()?);
        }
        Ok(items)
    }

    fn parse_set_item(&mut self) -> EngineResult<SetItem> {
        let variable = self.parse_identifier()?;
        self.expect_value(".")?;
        let key = self.parse_identifier()?;
        self.expect_value("=")?;
        let value = self.parse_expression()?;
        Ok(SetItem {
            variable,
            key,
            value,
        })
    }

    fn parse_return_clause(&mut self) -> EngineResult<Vec<ReturnItem>> {
        self.expect_keyword("RETURN")?;

        let mut items = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let alias = if self.at_keyword("AS") {
                self.consume_token();
                Some(self.parse_identifier()?)
            } else {
                None
            };
            items.push(ReturnItem { expression, alias });

            if self.at_value(",") {
                self.consume_token();
            } else {
                break;
            }
        }
        Ok(items)
    }
}
