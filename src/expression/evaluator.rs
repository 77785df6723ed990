//! 表达式求值器
//!
//! 在 (绑定上下文, 图) 之下将表达式树归约为值。实体属性优先通过
//! 图按标识符解析，这样同一动作序列中较早的 SET 对后续读取可见。

use log::trace;

use crate::core::binding::BindingContext;
use crate::core::error::{EngineError, EngineResult};
use crate::core::value::Value;
use crate::expression::operations::{BinaryOperationEvaluator, UnaryOperationEvaluator};
use crate::graph::Graph;
use crate::query::ast::{BinaryOperator, Expression};

/// 表达式求值器
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator {
    /// 比较时允许数值强制转换
    coerce: bool,
}

impl ExpressionEvaluator {
    pub fn new(coerce: bool) -> Self {
        Self { coerce }
    }

    /// 求值表达式
    pub fn evaluate(
        &self,
        expression: &Expression,
        bindings: &BindingContext,
        graph: &Graph,
    ) -> EngineResult<Value> {
        match expression {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Variable(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| EngineError::unbound(name)),

            Expression::Property { variable, key } => {
                self.evaluate_property(variable, key, bindings, graph)
            }

            Expression::Binary { left, op, right } => {
                let left_value = self.evaluate(left, bindings, graph)?;

                // AND/OR 短路：左侧已决定结果时不再求值右侧
                match (op, &left_value) {
                    (BinaryOperator::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
                    (BinaryOperator::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
                    _ => {}
                }

                let right_value = self.evaluate(right, bindings, graph)?;
                BinaryOperationEvaluator::evaluate(&left_value, *op, &right_value, self.coerce)
            }

            Expression::Unary { op, operand } => {
                let value = self.evaluate(operand, bindings, graph)?;
                UnaryOperationEvaluator::evaluate(*op, &value)
            }

            Expression::List(items) => {
                let values: EngineResult<Vec<Value>> = items
                    .iter()
                    .map(|item| self.evaluate(item, bindings, graph))
                    .collect();
                values.map(Value::List)
            }
        }
    }

    /// WHERE 过滤：仅当表达式求值为 true 时通过；null 与 false 均拒绝
    pub fn evaluate_predicate(
        &self,
        expression: &Expression,
        bindings: &BindingContext,
        graph: &Graph,
    ) -> EngineResult<bool> {
        let value = self.evaluate(expression, bindings, graph)?;
        trace!("predicate evaluated to {}", value);
        Ok(matches!(value, Value::Bool(true)))
    }

    fn evaluate_property(
        &self,
        variable: &str,
        key: &str,
        bindings: &BindingContext,
        graph: &Graph,
    ) -> EngineResult<Value> {
        let bound = bindings
            .get(variable)
            .ok_or_else(|| EngineError::unbound(variable))?;

        match bound {
            Value::Node(node) => {
                if key == "id" {
                    return Ok(Value::String(node.id.clone()));
                }
                let current = graph
                    .get_node(&node.id)
                    .map(|fresh| fresh.get_property(key))
                    .unwrap_or_else(|| node.get_property(key));
                Ok(current.cloned().unwrap_or(Value::Null))
            }
            Value::Edge(edge) => {
                let current = graph
                    .get_edge(&edge.source, &edge.target, &edge.label)
                    .map(|fresh| fresh.get_property(key))
                    .unwrap_or_else(|| edge.get_property(key));
                Ok(current.cloned().unwrap_or(Value::Null))
            }
            other => Err(EngineError::type_error(format!(
                "property access on '{}' requires a node or edge, got {}",
                variable,
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::ParserCore;
    use std::collections::HashMap;

    fn eval(expr_text: &str, bindings: &BindingContext, graph: &Graph) -> EngineResult<Value> {
        let expr = ParserCore::new(expr_text)
            .unwrap()
            .parse_expression()
            .unwrap();
        ExpressionEvaluator::new(false).evaluate(&expr, bindings, graph)
    }

    fn person_graph() -> (Graph, BindingContext) {
        let mut graph = Graph::new();
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::from("Alice"));
        props.insert("age".to_string(), Value::Int(30));
        let node = graph.add_node("p1", "Person", props).unwrap();

        let mut bindings = BindingContext::new();
        bindings.set("p", Value::Node(node));
        (graph, bindings)
    }

    #[test]
    fn test_property_access() {
        let (graph, bindings) = person_graph();
        assert_eq!(
            eval("p.name", &bindings, &graph).unwrap(),
            Value::from("Alice")
        );
        assert_eq!(eval("p.missing", &bindings, &graph).unwrap(), Value::Null);
        assert_eq!(eval("p.id", &bindings, &graph).unwrap(), Value::from("p1"));
    }

    #[test]
    fn test_property_access_on_unbound_variable() {
        let graph = Graph::new();
        let bindings = BindingContext::new();
        let err = eval("q.name", &bindings, &graph).unwrap_err();
        assert!(matches!(err, EngineError::UnboundVariable(name) if name == "q"));
    }

    #[test]
    fn test_property_access_on_scalar_is_type_error() {
        let graph = Graph::new();
        let mut bindings = BindingContext::new();
        bindings.set("x", Value::Int(5));
        let err = eval("x.name", &bindings, &graph).unwrap_err();
        assert!(matches!(err, EngineError::Type(_)));
    }

    #[test]
    fn test_property_reads_see_graph_updates() {
        let (mut graph, bindings) = person_graph();
        graph
            .set_node_property("p1", "name", Value::from("Alicia"))
            .unwrap();
        // The binding still holds the pre-update copy; resolution goes
        // through the graph.
        assert_eq!(
            eval("p.name", &bindings, &graph).unwrap(),
            Value::from("Alicia")
        );
    }

    #[test]
    fn test_where_expression() {
        let (graph, bindings) = person_graph();
        let evaluator = ExpressionEvaluator::new(false);
        let expr = ParserCore::new(r#"p.name = "Alice" AND p.age >= 18"#)
            .unwrap()
            .parse_expression()
            .unwrap();
        assert!(evaluator
            .evaluate_predicate(&expr, &bindings, &graph)
            .unwrap());
    }

    #[test]
    fn test_null_rejects_in_predicate() {
        let (graph, bindings) = person_graph();
        let evaluator = ExpressionEvaluator::new(false);
        // p.missing = 1 evaluates to null; null rejects.
        let expr = ParserCore::new("p.missing = 1")
            .unwrap()
            .parse_expression()
            .unwrap();
        assert!(!evaluator
            .evaluate_predicate(&expr, &bindings, &graph)
            .unwrap());
    }

    #[test]
    fn test_short_circuit_avoids_right_error() {
        let (graph, bindings) = person_graph();
        // Right side would be a type error, but false AND _ short-circuits.
        assert_eq!(
            eval("1 = 2 AND p.age < TRUE", &bindings, &graph).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_arithmetic_in_context() {
        let (graph, bindings) = person_graph();
        assert_eq!(
            eval("p.age * 2 + 1", &bindings, &graph).unwrap(),
            Value::Int(61)
        );
    }

    #[test]
    fn test_in_with_property() {
        let (graph, bindings) = person_graph();
        assert_eq!(
            eval(r#"p.name IN ["Bob", "Alice"]"#, &bindings, &graph).unwrap(),
            Value::Bool(true)
        );
    }
}
