//! 表达式解析器
//!
//! 优先级递降：OR < AND < NOT < 比较/IN/IS NULL < 加减 < 乘除模 < 一元 < 基本

use crate::core::error::{EngineError, EngineResult};
use crate::core::value::Value;
use crate::query::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::query::parser::lexer::TokenType;
use crate::query::parser::parser_core::ParserCore;

impl ParserCore {
    /// 解析完整表达式
    pub fn parse_expression(&mut self) -> EngineResult<Expression> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> EngineResult<Expression> {
        let mut left = self.parse_and_expression()?;

        while self.at_keyword("OR") {
            self.consume_token();
            let right = self.parse_and_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> EngineResult<Expression> {
        let mut left = self.parse_not_expression()?;

        while self.at_keyword("AND") {
            self.consume_token();
            let right = self.parse_not_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not_expression(&mut self) -> EngineResult<Expression> {
        if self.at_keyword("NOT") {
            self.consume_token();
            let operand = self.parse_not_expression()?;
            Ok(Expression::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            })
        } else {
            self.parse_comparison_expression()
        }
    }

    fn parse_comparison_expression(&mut self) -> EngineResult<Expression> {
        let mut left = self.parse_additive_expression()?;

        loop {
            if let Some(op) = self.comparison_operator() {
                self.consume_token();
                let right = self.parse_additive_expression()?;
                left = Expression::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                };
            } else if self.at_keyword("IN") {
                self.consume_token();
                let right = self.parse_additive_expression()?;
                left = Expression::Binary {
                    left: Box::new(left),
                    op: BinaryOperator::In,
                    right: Box::new(right),
                };
            } else if self.at_keyword("IS") {
                self.consume_token();
                let op = if self.at_keyword("NOT") {
                    self.consume_token();
                    UnaryOperator::IsNotNull
                } else {
                    UnaryOperator::IsNull
                };
                self.expect_keyword("NULL")?;
                left = Expression::Unary {
                    op,
                    operand: Box::new(left),
                };
            } else {
                break;
            }
        }

        Ok(left)
    }

    fn comparison_operator(&self) -> Option<BinaryOperator> {
        if !self.at_type(TokenType::Operator) {
            return None;
        }
        match self.current_token().value.as_str() {
            "=" | "==" => Some(BinaryOperator::Equal),
            "!=" | "<>" => Some(BinaryOperator::NotEqual),
            "<" => Some(BinaryOperator::LessThan),
            "<=" => Some(BinaryOperator::LessThanOrEqual),
            ">" => Some(BinaryOperator::GreaterThan),
            ">=" => Some(BinaryOperator::GreaterThanOrEqual),
            _ => None,
        }
    }

    fn parse_additive_expression(&mut self) -> EngineResult<Expression> {
        let mut left = self.parse_multiplicative_expression()?;

        while self.at_value("+") || self.at_value("-") {
            let op = if self.at_value("+") {
                BinaryOperator::Add
            } else {
                BinaryOperator::Subtract
            };
            self.consume_token();
            let right = self.parse_multiplicative_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> EngineResult<Expression> {
        let mut left = self.parse_unary_expression()?;

        while self.at_value("*") || self.at_value("/") || self.at_value("%") {
            let op = if self.at_value("*") {
                BinaryOperator::Multiply
            } else if self.at_value("/") {
                BinaryOperator::Divide
            } else {
                BinaryOperator::Modulo
            };
            self.consume_token();
            let right = self.parse_unary_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> EngineResult<Expression> {
        if self.at_value("-") {
            self.consume_token();
            let operand = self.parse_unary_expression()?;
            Ok(Expression::Unary {
                op: UnaryOperator::Minus,
                operand: Box::new(operand),
            })
        } else if self.at_value("+") {
            self.consume_token();
            self.parse_unary_expression()
        } else {
            self.parse_primary_expression()
        }
    }

    fn parse_primary_expression(&mut self) -> EngineResult<Expression> {
        if self.at_value("(") {
            self.consume_token();
            let expression = self.parse_expression()?;
            self.expect_value(")")?;
            return Ok(expression);
        }

        if self.at_value("[") {
            self.consume_token();
            let mut items = Vec::new();
            while !self.at_value("]") && !self.is_eof() {
                items.push(self.parse_expression()?);
                if self.at_value(",") {
                    self.consume_token();
                } else {
                    break;
                }
            }
            self.expect_value("]")?;
            return Ok(Expression::List(items));
        }

        if self.at_type(TokenType::LiteralString) {
            let value = self.consume_token().value.clone();
            return Ok(Expression::Literal(Value::String(value)));
        }

        if self.at_type(TokenType::LiteralNumber) {
            let raw = self.consume_token().value.clone();
            let literal = if raw.contains('.') {
                Value::Float(raw.parse::<f64>().map_err(|e| {
                    EngineError::parse(format!("invalid number '{}': {}", raw, e))
                })?)
            } else {
                Value::Int(raw.parse::<i64>().map_err(|e| {
                    EngineError::parse(format!("invalid number '{}': {}", raw, e))
                })?)
            };
            return Ok(Expression::Literal(literal));
        }

        if self.at_keyword("TRUE") {
            self.consume_token();
            return Ok(Expression::Literal(Value::Bool(true)));
        }
        if self.at_keyword("FALSE") {
            self.consume_token();
            return Ok(Expression::Literal(Value::Bool(false)));
        }
        if self.at_keyword("NULL") {
            self.consume_token();
            return Ok(Expression::Literal(Value::Null));
        }

        if self.at_type(TokenType::Identifier) {
            let name = self.consume_token().value.clone();
            if self.at_value(".") {
                self.consume_token();
                let key = self.parse_identifier()?;
                return Ok(Expression::Property {
                    variable: name,
                    key,
                });
            }
            return Ok(Expression::Variable(name));
        }

        Err(self.unexpected("expression"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Expression {
        ParserCore::new(input)
            .unwrap()
            .parse_expression()
            .expect("expression should parse")
    }

    #[test]
    fn test_property_access() {
        let expr = parse("p.name");
        assert_eq!(
            expr,
            Expression::Property {
                variable: "p".to_string(),
                key: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_comparison_with_string() {
        let expr = parse(r#"p.name = "Alice""#);
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Equal);
                assert_eq!(
                    *right,
                    Expression::Literal(Value::String("Alice".to_string()))
                );
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_over_or() {
        // a OR b AND c  =>  a OR (b AND c)
        let expr = parse("a OR b AND c");
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Or);
                assert!(matches!(
                    *right,
                    Expression::Binary {
                        op: BinaryOperator::And,
                        ..
                    }
                ));
            }
            other => panic!("expected OR at root, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_multiplication_over_addition() {
        // 1 + 2 * 3  =>  1 + (2 * 3)
        let expr = parse("1 + 2 * 3");
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Add);
                assert!(matches!(
                    *right,
                    Expression::Binary {
                        op: BinaryOperator::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("expected Add at root, got {:?}", other),
        }
    }

    #[test]
    fn test_is_null_postfix() {
        let expr = parse("p.status IS NULL");
        assert!(matches!(
            expr,
            Expression::Unary {
                op: UnaryOperator::IsNull,
                ..
            }
        ));

        let expr = parse("p.status IS NOT NULL");
        assert!(matches!(
            expr,
            Expression::Unary {
                op: UnaryOperator::IsNotNull,
                ..
            }
        ));
    }

    #[test]
    fn test_in_list() {
        let expr = parse(r#"p.name IN ["Alice", "Bob"]"#);
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOperator::In);
                assert!(matches!(*right, Expression::List(ref items) if items.len() == 2));
            }
            other => panic!("expected IN expression, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse("-5");
        assert!(matches!(
            expr,
            Expression::Unary {
                op: UnaryOperator::Minus,
                ..
            }
        ));
    }

    #[test]
    fn test_parenthesized_grouping() {
        // (1 + 2) * 3  =>  Multiply at root
        let expr = parse("(1 + 2) * 3");
        assert!(matches!(
            expr,
            Expression::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }
}
