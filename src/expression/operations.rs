//! 算术、比较与逻辑运算
//!
//! 三值逻辑约定：与 null 比较得 null；AND/OR 按 SQL 真值表传播
//! unknown；IS NULL 永远返回确定的布尔值。

use crate::core::error::{EngineError, EngineResult};
use crate::core::value::Value;
use crate::query::ast::{BinaryOperator, UnaryOperator};

/// 二元运算求值器
pub struct BinaryOperationEvaluator;

impl BinaryOperationEvaluator {
    pub fn evaluate(
        left: &Value,
        op: BinaryOperator,
        right: &Value,
        coerce: bool,
    ) -> EngineResult<Value> {
        match op {
            BinaryOperator::Add => Self::eval_add(left, right),
            BinaryOperator::Subtract => Self::eval_arithmetic(left, right, "-"),
            BinaryOperator::Multiply => Self::eval_arithmetic(left, right, "*"),
            BinaryOperator::Divide => Self::eval_divide(left, right),
            BinaryOperator::Modulo => Self::eval_modulo(left, right),

            BinaryOperator::Equal => Ok(Self::from_ternary(left.equals(right, coerce))),
            BinaryOperator::NotEqual => {
                Ok(Self::from_ternary(left.equals(right, coerce).map(|b| !b)))
            }
            BinaryOperator::LessThan => Self::eval_ordering(left, right, coerce, |o| o.is_lt()),
            BinaryOperator::LessThanOrEqual => {
                Self::eval_ordering(left, right, coerce, |o| o.is_le())
            }
            BinaryOperator::GreaterThan => Self::eval_ordering(left, right, coerce, |o| o.is_gt()),
            BinaryOperator::GreaterThanOrEqual => {
                Self::eval_ordering(left, right, coerce, |o| o.is_ge())
            }

            BinaryOperator::And => Self::eval_and(left, right),
            BinaryOperator::Or => Self::eval_or(left, right),
            BinaryOperator::In => Self::eval_in(left, right, coerce),
        }
    }

    fn from_ternary(value: Option<bool>) -> Value {
        match value {
            Some(b) => Value::Bool(b),
            None => Value::Null,
        }
    }

    fn eval_add(left: &Value, right: &Value) -> EngineResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => l
                .checked_add(*r)
                .map(Value::Int)
                .ok_or_else(|| EngineError::numeric("integer overflow in addition")),
            (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => Ok(Value::Float(l + r)),
                _ => Err(EngineError::type_error(format!(
                    "cannot add {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        }
    }

    fn eval_arithmetic(left: &Value, right: &Value, op: &str) -> EngineResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        if let (Value::Int(l), Value::Int(r)) = (left, right) {
            let result = match op {
                "-" => l.checked_sub(*r),
                "*" => l.checked_mul(*r),
                _ => unreachable!("arithmetic dispatch"),
            };
            return result
                .map(Value::Int)
                .ok_or_else(|| EngineError::numeric(format!("integer overflow in '{}'", op)));
        }
        match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(if op == "-" { l - r } else { l * r })),
            _ => Err(EngineError::type_error(format!(
                "'{}' requires numeric operands, got {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    fn eval_divide(left: &Value, right: &Value) -> EngineResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => {
                if *r == 0 {
                    Err(EngineError::numeric("division by zero"))
                } else {
                    l.checked_div(*r)
                        .map(Value::Int)
                        .ok_or_else(|| EngineError::numeric("integer overflow in division"))
                }
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(_), Some(r)) if r == 0.0 => Err(EngineError::numeric("division by zero")),
                (Some(l), Some(r)) => Ok(Value::Float(l / r)),
                _ => Err(EngineError::type_error(format!(
                    "'/' requires numeric operands, got {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        }
    }

    fn eval_modulo(left: &Value, right: &Value) -> EngineResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => {
                if *r == 0 {
                    Err(EngineError::numeric("modulo by zero"))
                } else {
                    l.checked_rem(*r)
                        .map(Value::Int)
                        .ok_or_else(|| EngineError::numeric("integer overflow in modulo"))
                }
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(_), Some(r)) if r == 0.0 => Err(EngineError::numeric("modulo by zero")),
                (Some(l), Some(r)) => Ok(Value::Float(l % r)),
                _ => Err(EngineError::type_error(format!(
                    "'%' requires numeric operands, got {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        }
    }

    fn eval_ordering<F>(left: &Value, right: &Value, coerce: bool, check: F) -> EngineResult<Value>
    where
        F: Fn(std::cmp::Ordering) -> bool,
    {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        let ordering = Self::compare(left, right, coerce)?;
        Ok(Value::Bool(check(ordering)))
    }

    fn compare(left: &Value, right: &Value, coerce: bool) -> EngineResult<std::cmp::Ordering> {
        match (left, right) {
            (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
            (Value::Bool(_), _) | (_, Value::Bool(_)) => Err(EngineError::type_error(
                "ordering comparison is not defined for booleans",
            )),
            _ => {
                let l = Self::numeric_operand(left, coerce)?;
                let r = Self::numeric_operand(right, coerce)?;
                l.partial_cmp(&r)
                    .ok_or_else(|| EngineError::numeric("comparison with NaN"))
            }
        }
    }

    fn numeric_operand(value: &Value, coerce: bool) -> EngineResult<f64> {
        if let Some(n) = value.as_f64() {
            return Ok(n);
        }
        if coerce {
            if let Value::String(s) = value {
                if let Ok(n) = s.trim().parse::<f64>() {
                    return Ok(n);
                }
            }
        }
        Err(EngineError::type_error(format!(
            "cannot order {} against a number",
            value.type_name()
        )))
    }

    fn truth(value: &Value) -> EngineResult<Option<bool>> {
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Null => Ok(None),
            other => Err(EngineError::type_error(format!(
                "logical operator requires boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_and(left: &Value, right: &Value) -> EngineResult<Value> {
        let result = match (Self::truth(left)?, Self::truth(right)?) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        };
        Ok(Self::from_ternary(result))
    }

    fn eval_or(left: &Value, right: &Value) -> EngineResult<Value> {
        let result = match (Self::truth(left)?, Self::truth(right)?) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        };
        Ok(Self::from_ternary(result))
    }

    fn eval_in(left: &Value, right: &Value, coerce: bool) -> EngineResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        let items = match right {
            Value::List(items) => items,
            other => {
                return Err(EngineError::type_error(format!(
                    "IN requires a list on the right, got {}",
                    other.type_name()
                )))
            }
        };

        let mut saw_unknown = false;
        for item in items {
            match left.equals(item, coerce) {
                Some(true) => return Ok(Value::Bool(true)),
                Some(false) => {}
                None => saw_unknown = true,
            }
        }
        if saw_unknown {
            Ok(Value::Null)
        } else {
            Ok(Value::Bool(false))
        }
    }
}

/// 一元运算求值器
pub struct UnaryOperationEvaluator;

impl UnaryOperationEvaluator {
    pub fn evaluate(op: UnaryOperator, operand: &Value) -> EngineResult<Value> {
        match op {
            UnaryOperator::Not => match operand {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                Value::Null => Ok(Value::Null),
                other => Err(EngineError::type_error(format!(
                    "NOT requires boolean, got {}",
                    other.type_name()
                ))),
            },
            UnaryOperator::Minus => match operand {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EngineError::numeric("integer overflow in negation")),
                Value::Float(f) => Ok(Value::Float(-f)),
                Value::Null => Ok(Value::Null),
                other => Err(EngineError::type_error(format!(
                    "unary minus requires a number, got {}",
                    other.type_name()
                ))),
            },
            UnaryOperator::IsNull => Ok(Value::Bool(operand.is_null())),
            UnaryOperator::IsNotNull => Ok(Value::Bool(!operand.is_null())),
        }
    }
}
