//! 图变更动作
//!
//! CreateNode / CreateRelationship / SetProperty，统一的
//! validate / execute / describe 表面。成功创建实体的动作必须更新
//! 传入的绑定上下文，使同一序列中的后续动作可以引用新实体。
//! 每个成功的动作产出一条撤销记录，供执行器在回滚时逆序应用。

use log::trace;
use std::collections::HashMap;

use crate::core::binding::BindingContext;
use crate::core::error::{EngineError, EngineResult};
use crate::core::node_edge_path::Node;
use crate::core::value::Value;
use crate::expression::ExpressionEvaluator;
use crate::graph::Graph;
use crate::query::ast::Expression;

/// 撤销记录指向的属性宿主
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyTarget {
    Node {
        id: String,
    },
    Edge {
        source: String,
        target: String,
        label: String,
    },
}

/// 逆转一个已执行动作所需的信息
#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    RemoveNode {
        id: String,
    },
    RemoveEdge {
        source: String,
        target: String,
        label: String,
    },
    RestoreProperty {
        target: PropertyTarget,
        key: String,
        previous: Option<Value>,
    },
}

impl UndoRecord {
    /// 应用撤销记录。撤销本身可能失败（如节点已被后续操作移除）。
    pub fn apply(&self, graph: &mut Graph) -> EngineResult<()> {
        match self {
            UndoRecord::RemoveNode { id } => {
                graph.remove_node(id);
                Ok(())
            }
            UndoRecord::RemoveEdge {
                source,
                target,
                label,
            } => {
                graph.remove_edge(source, target, label);
                Ok(())
            }
            UndoRecord::RestoreProperty {
                target,
                key,
                previous,
            } => match target {
                PropertyTarget::Node { id } => {
                    match previous {
                        Some(value) => graph.set_node_property(id, key.clone(), value.clone())?,
                        None => graph.remove_node_property(id, key)?,
                    };
                    Ok(())
                }
                PropertyTarget::Edge {
                    source,
                    target,
                    label,
                } => {
                    match previous {
                        Some(value) => {
                            graph.set_edge_property(source, target, label, key.clone(), value.clone())?
                        }
                        None => graph.remove_edge_property(source, target, label, key)?,
                    };
                    Ok(())
                }
            },
        }
    }
}

/// 单个图变更动作
pub trait Action {
    /// 执行前校验；不产生副作用
    fn validate(&self, graph: &Graph, bindings: &BindingContext) -> EngineResult<()>;

    /// 执行变更；成功时返回撤销记录，并把新建实体写回绑定上下文
    fn execute(&self, graph: &mut Graph, bindings: &mut BindingContext)
        -> EngineResult<UndoRecord>;

    /// 人类可读描述，用于结果与错误消息
    fn describe(&self) -> String;
}

fn evaluate_properties(
    evaluator: &ExpressionEvaluator,
    properties: &HashMap<String, Expression>,
    bindings: &BindingContext,
    graph: &Graph,
) -> EngineResult<HashMap<String, Value>> {
    let mut evaluated = HashMap::new();
    for (key, expression) in properties {
        let value = evaluator.evaluate(expression, bindings, graph)?;
        if value.is_entity() {
            return Err(EngineError::type_error(format!(
                "cannot store a {} in a property bag",
                value.type_name()
            )));
        }
        evaluated.insert(key.clone(), value);
    }
    Ok(evaluated)
}

fn resolve_node_binding<'a>(
    bindings: &'a BindingContext,
    variable: &str,
) -> EngineResult<&'a Node> {
    match bindings.get(variable) {
        None => Err(EngineError::unbound(variable)),
        Some(Value::Node(node)) => Ok(node),
        Some(other) => Err(EngineError::type_error(format!(
            "variable '{}' is bound to a {}, expected a node",
            variable,
            other.type_name()
        ))),
    }
}

/// 创建节点：分配新标识符，首个标签为主标签，完整标签数组存入属性包
#[derive(Debug, Clone)]
pub struct CreateNodeAction {
    pub variable: String,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Expression>,
    evaluator: ExpressionEvaluator,
}

impl CreateNodeAction {
    pub fn new(
        variable: impl Into<String>,
        labels: Vec<String>,
        properties: HashMap<String, Expression>,
        evaluator: ExpressionEvaluator,
    ) -> Self {
        Self {
            variable: variable.into(),
            labels,
            properties,
            evaluator,
        }
    }

    fn check_labels(&self) -> EngineResult<()> {
        if self.labels.is_empty() || self.labels.iter().any(String::is_empty) {
            return Err(EngineError::validation(format!(
                "{}: labels must be non-empty strings",
                self.describe()
            )));
        }
        Ok(())
    }
}

impl Action for CreateNodeAction {
    fn validate(&self, _graph: &Graph, bindings: &BindingContext) -> EngineResult<()> {
        self.check_labels()?;
        if bindings.has(&self.variable) {
            return Err(EngineError::validation(format!(
                "variable '{}' is already bound",
                self.variable
            )));
        }
        Ok(())
    }

    fn execute(
        &self,
        graph: &mut Graph,
        bindings: &mut BindingContext,
    ) -> EngineResult<UndoRecord> {
        self.check_labels()?;
        if bindings.has(&self.variable) {
            return Err(EngineError::execution(
                self.describe(),
                format!("variable '{}' is already bound", self.variable),
            ));
        }

        let mut properties = evaluate_properties(&self.evaluator, &self.properties, bindings, graph)?;
        properties.insert(
            "labels".to_string(),
            Value::List(self.labels.iter().cloned().map(Value::String).collect()),
        );

        let id = graph.generate_node_id();
        let node = graph.add_node(id.clone(), self.labels[0].clone(), properties)?;
        trace!("created node {} as '{}'", id, self.variable);
        bindings.set(self.variable.clone(), Value::Node(node));

        Ok(UndoRecord::RemoveNode { id })
    }

    fn describe(&self) -> String {
        format!("CREATE ({}:{})", self.variable, self.labels.join(":"))
    }
}

/// 创建关系：两端变量必须已绑定为节点；同三元组的既有边被替换
#[derive(Debug, Clone)]
pub struct CreateRelationshipAction {
    pub variable: Option<String>,
    pub from_variable: String,
    pub to_variable: String,
    pub rel_type: String,
    pub properties: HashMap<String, Expression>,
    evaluator: ExpressionEvaluator,
}

impl CreateRelationshipAction {
    pub fn new(
        variable: Option<String>,
        from_variable: impl Into<String>,
        to_variable: impl Into<String>,
        rel_type: impl Into<String>,
        properties: HashMap<String, Expression>,
        evaluator: ExpressionEvaluator,
    ) -> Self {
        Self {
            variable,
            from_variable: from_variable.into(),
            to_variable: to_variable.into(),
            rel_type: rel_type.into(),
            properties,
            evaluator,
        }
    }
}

impl Action for CreateRelationshipAction {
    fn validate(&self, _graph: &Graph, bindings: &BindingContext) -> EngineResult<()> {
        if self.rel_type.is_empty() {
            return Err(EngineError::validation(format!(
                "{}: relationship type must be a non-empty string",
                self.describe()
            )));
        }
        for variable in [&self.from_variable, &self.to_variable] {
            resolve_node_binding(bindings, variable)
                .map_err(|e| EngineError::validation(e.to_string()))?;
        }
        Ok(())
    }

    fn execute(
        &self,
        graph: &mut Graph,
        bindings: &mut BindingContext,
    ) -> EngineResult<UndoRecord> {
        if self.rel_type.is_empty() {
            return Err(EngineError::execution(
                self.describe(),
                "relationship type must be a non-empty string",
            ));
        }

        let source = resolve_node_binding(bindings, &self.from_variable)?.id.clone();
        let target = resolve_node_binding(bindings, &self.to_variable)?.id.clone();
        let properties = evaluate_properties(&self.evaluator, &self.properties, bindings, graph)?;

        let edge = graph.add_edge(source.clone(), target.clone(), self.rel_type.clone(), properties)?;
        trace!(
            "created edge ({})-[:{}]->({})",
            source,
            self.rel_type,
            target
        );
        if let Some(variable) = &self.variable {
            bindings.set(variable.clone(), Value::Edge(edge));
        }

        Ok(UndoRecord::RemoveEdge {
            source,
            target,
            label: self.rel_type.clone(),
        })
    }

    fn describe(&self) -> String {
        format!(
            "CREATE ({})-[:{}]->({})",
            self.from_variable, self.rel_type, self.to_variable
        )
    }
}

/// 设置属性：目标须绑定为节点或边；捕获旧值用于撤销
#[derive(Debug, Clone)]
pub struct SetPropertyAction {
    pub variable: String,
    pub key: String,
    pub value: Expression,
    evaluator: ExpressionEvaluator,
}

impl SetPropertyAction {
    pub fn new(
        variable: impl Into<String>,
        key: impl Into<String>,
        value: Expression,
        evaluator: ExpressionEvaluator,
    ) -> Self {
        Self {
            variable: variable.into(),
            key: key.into(),
            value,
            evaluator,
        }
    }
}

impl Action for SetPropertyAction {
    fn validate(&self, _graph: &Graph, bindings: &BindingContext) -> EngineResult<()> {
        if self.key.is_empty() {
            return Err(EngineError::validation(format!(
                "{}: property key must be non-empty",
                self.describe()
            )));
        }
        match bindings.get(&self.variable) {
            None => Err(EngineError::validation(
                EngineError::unbound(&self.variable).to_string(),
            )),
            Some(Value::Node(_)) | Some(Value::Edge(_)) => Ok(()),
            Some(other) => Err(EngineError::validation(format!(
                "variable '{}' is bound to a {}, expected a node or edge",
                self.variable,
                other.type_name()
            ))),
        }
    }

    fn execute(
        &self,
        graph: &mut Graph,
        bindings: &mut BindingContext,
    ) -> EngineResult<UndoRecord> {
        if self.key.is_empty() {
            return Err(EngineError::execution(
                self.describe(),
                "property key must be non-empty",
            ));
        }

        let value = self.evaluator.evaluate(&self.value, bindings, graph)?;
        if value.is_entity() {
            return Err(EngineError::type_error(format!(
                "cannot store a {} in a property bag",
                value.type_name()
            )));
        }

        match bindings.get(&self.variable).cloned() {
            None => Err(EngineError::unbound(&self.variable)),
            Some(Value::Node(node)) => {
                let previous = graph.set_node_property(&node.id, self.key.clone(), value)?;
                // Refresh the bound copy so the context mirrors the graph.
                if let Some(fresh) = graph.get_node(&node.id) {
                    bindings.set(self.variable.clone(), Value::Node(fresh.clone()));
                }
                Ok(UndoRecord::RestoreProperty {
                    target: PropertyTarget::Node { id: node.id },
                    key: self.key.clone(),
                    previous,
                })
            }
            Some(Value::Edge(edge)) => {
                let previous = graph.set_edge_property(
                    &edge.source,
                    &edge.target,
                    &edge.label,
                    self.key.clone(),
                    value,
                )?;
                if let Some(fresh) = graph.get_edge(&edge.source, &edge.target, &edge.label) {
                    bindings.set(self.variable.clone(), Value::Edge(fresh.clone()));
                }
                Ok(UndoRecord::RestoreProperty {
                    target: PropertyTarget::Edge {
                        source: edge.source,
                        target: edge.target,
                        label: edge.label,
                    },
                    key: self.key.clone(),
                    previous,
                })
            }
            Some(other) => Err(EngineError::type_error(format!(
                "variable '{}' is bound to a {}, expected a node or edge",
                self.variable,
                other.type_name()
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("SET {}.{}", self.variable, self.key)
    }
}
