//! 动作执行器
//!
//! 在选定的失败策略下驱动动作列表：可选的执行前整体校验、
//! 失败后继续、失败后回滚。回滚与继续同时开启时回滚优先：
//! 遇到首个失败即停止并逆序应用撤销日志。

use log::{debug, warn};

use crate::config::ExecutionConfig;
use crate::core::binding::BindingContext;
use crate::engine::actions::{Action, UndoRecord};
use crate::graph::Graph;

/// 执行策略
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    pub validate_before_execute: bool,
    pub continue_on_failure: bool,
    pub rollback_on_failure: bool,
}

impl From<&ExecutionConfig> for ExecutionOptions {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            validate_before_execute: config.validate_before_execute,
            continue_on_failure: config.continue_on_failure,
            rollback_on_failure: config.rollback_on_failure,
        }
    }
}

/// 单个动作的执行结果
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub action: String,
}

/// 一次 execute_actions 调用的整体结果
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub action_results: Vec<ActionOutcome>,
    /// 回滚步骤自身的失败；它们不再触发进一步回滚
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rollback_errors: Vec<String>,
}

/// 动作执行器
#[derive(Debug, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    /// 按给定策略执行动作列表
    pub fn execute_actions(
        graph: &mut Graph,
        actions: &[Box<dyn Action>],
        bindings: &mut BindingContext,
        options: &ExecutionOptions,
    ) -> ExecutionReport {
        if options.validate_before_execute {
            for action in actions {
                if let Err(error) = action.validate(graph, bindings) {
                    debug!("validation failed for {}: {}", action.describe(), error);
                    return ExecutionReport {
                        success: false,
                        error: Some(format!("Validation failed: {}", error)),
                        action_results: Vec::new(),
                        rollback_errors: Vec::new(),
                    };
                }
            }
        }

        let mut report = ExecutionReport {
            success: true,
            ..Default::default()
        };
        // The undo log is only retained when rollback is requested.
        let mut undo_log: Vec<UndoRecord> = Vec::new();

        for action in actions {
            match action.execute(graph, bindings) {
                Ok(undo) => {
                    if options.rollback_on_failure {
                        undo_log.push(undo);
                    }
                    report.action_results.push(ActionOutcome {
                        success: true,
                        error: None,
                        action: action.describe(),
                    });
                }
                Err(error) => {
                    debug!("action {} failed: {}", action.describe(), error);
                    report.success = false;
                    let message = error.to_string();
                    if report.error.is_none() {
                        report.error = Some(message.clone());
                    }
                    report.action_results.push(ActionOutcome {
                        success: false,
                        error: Some(message),
                        action: action.describe(),
                    });

                    // Rollback wins over continue.
                    if options.rollback_on_failure {
                        report.rollback_errors = Self::rollback(graph, &mut undo_log);
                        break;
                    }
                    if !options.continue_on_failure {
                        break;
                    }
                }
            }
        }

        report
    }

    /// 逆序应用撤销日志。内部失败被记录但不再触发回滚。
    fn rollback(graph: &mut Graph, undo_log: &mut Vec<UndoRecord>) -> Vec<String> {
        let mut failures = Vec::new();
        while let Some(undo) = undo_log.pop() {
            if let Err(error) = undo.apply(graph) {
                warn!("rollback step failed: {}", error);
                failures.push(error.to_string());
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::actions::{CreateNodeAction, CreateRelationshipAction};
    use crate::expression::ExpressionEvaluator;
    use std::collections::HashMap;

    fn create_node(variable: &str, label: &str) -> Box<dyn Action> {
        Box::new(CreateNodeAction::new(
            variable,
            vec![label.to_string()],
            HashMap::new(),
            ExpressionEvaluator::new(false),
        ))
    }

    fn create_relationship(from: &str, to: &str) -> Box<dyn Action> {
        Box::new(CreateRelationshipAction::new(
            None,
            from,
            to,
            "LINKS",
            HashMap::new(),
            ExpressionEvaluator::new(false),
        ))
    }

    #[test]
    fn test_all_actions_succeed() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![create_node("p", "Person"), create_node("t", "Task")];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions::default(),
        );

        assert!(report.success);
        assert_eq!(report.action_results.len(), 2);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_stop_on_first_failure_by_default() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![
            create_node("p", "Person"),
            create_relationship("p", "ghost"),
            create_node("t", "Task"),
        ];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions::default(),
        );

        assert!(!report.success);
        // The third action never ran.
        assert_eq!(report.action_results.len(), 2);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_continue_on_failure_runs_remaining_actions() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![
            create_node("p", "Person"),
            create_node("p", "Task"),
            create_node("t", "Task"),
        ];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions {
                continue_on_failure: true,
                ..Default::default()
            },
        );

        assert!(!report.success);
        assert_eq!(report.action_results.len(), 3);
        assert!(report.action_results[0].success);
        assert!(!report.action_results[1].success);
        assert!(report.action_results[2].success);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_rollback_restores_pre_call_state() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![
            create_node("p", "Person"),
            create_node("t", "Task"),
            create_relationship("p", "x"),
        ];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions {
                rollback_on_failure: true,
                ..Default::default()
            },
        );

        assert!(!report.success);
        assert!(report
            .error
            .as_deref()
            .unwrap()
            .contains("not found in bindings"));
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(report.rollback_errors.is_empty());
    }

    #[test]
    fn test_rollback_wins_over_continue() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![
            create_node("p", "Person"),
            create_relationship("p", "x"),
            create_node("t", "Task"),
        ];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions {
                continue_on_failure: true,
                rollback_on_failure: true,
                ..Default::default()
            },
        );

        assert!(!report.success);
        // Execution stopped at the failure: the trailing action never ran.
        assert_eq!(report.action_results.len(), 2);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_validate_before_execute_blocks_all_side_effects() {
        let mut graph = Graph::new();
        let mut bindings = BindingContext::new();
        let actions = vec![
            create_node("p", "Person"),
            // Invalid up front: x is not bound and validation sees it.
            create_relationship("p", "x"),
        ];

        let report = ActionExecutor::execute_actions(
            &mut graph,
            &actions,
            &mut bindings,
            &ExecutionOptions {
                validate_before_execute: true,
                ..Default::default()
            },
        );

        assert!(!report.success);
        assert!(report
            .error
            .as_deref()
            .unwrap()
            .starts_with("Validation failed:"));
        assert!(report.action_results.is_empty());
        assert_eq!(graph.node_count(), 0);
    }
}
