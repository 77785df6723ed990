//! 规则引擎
//!
//! 粘合层：规则文本 → AST → 逐模式匹配 → 绑定组合 → WHERE 过滤 →
//! 按绑定构造并执行动作 → 规则结果。多条规则按优先级降序执行，
//! 同优先级按出现顺序。

pub mod actions;
pub mod executor;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::core::binding::BindingContext;
use crate::core::error::{EngineError, EngineResult};
use crate::expression::ExpressionEvaluator;
use crate::graph::{Direction, Graph};
use crate::matcher::combiner::combine_binding_sets;
use crate::matcher::{pattern, PatternMatcher};
use crate::query::ast::{ActionClause, CreateItem, NodePattern, PathPattern, Rule};
use crate::query::markdown::{extract_rule_blocks, RuleBlock};
use crate::query::parser::RuleParser;

pub use actions::{Action, CreateNodeAction, CreateRelationshipAction, SetPropertyAction, UndoRecord};
pub use executor::{ActionExecutor, ActionOutcome, ExecutionOptions, ExecutionReport};

/// 规则元数据
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RuleInfo {
    pub name: String,
    pub description: String,
    pub priority: i64,
}

/// 一条规则全部动作执行结果的汇总
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsSummary {
    pub action_results: Vec<ActionOutcome>,
}

/// 一条规则的执行结果
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub rule: RuleInfo,
    pub success: bool,
    /// 实际启动了动作序列的绑定元组数量
    pub match_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleResult {
    fn failure(rule: RuleInfo, error: EngineError) -> Self {
        Self {
            rule,
            success: false,
            match_count: 0,
            actions: None,
            error: Some(error.to_string()),
        }
    }
}

/// 规则引擎
#[derive(Debug)]
pub struct RuleEngine {
    config: EngineConfig,
    matcher: PatternMatcher,
    evaluator: ExpressionEvaluator,
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let matcher = PatternMatcher::new(config.matcher.clone());
        let evaluator = ExpressionEvaluator::new(config.matcher.coerce_property_values);
        Self {
            config,
            matcher,
            evaluator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// 执行单条规则文本
    pub fn execute_query(&self, graph: &mut Graph, rule_text: &str) -> RuleResult {
        self.run(graph, RuleInfo::default(), rule_text)
    }

    /// 执行 Markdown 文档中的全部 `graphrule` 块，优先级高者先行，
    /// 同优先级按文本出现顺序
    pub fn execute_queries_from_markdown(
        &self,
        graph: &mut Graph,
        markdown: &str,
    ) -> Vec<RuleResult> {
        let mut blocks = extract_rule_blocks(markdown);
        blocks.sort_by(|a, b| b.priority.cmp(&a.priority)); // stable: ties keep order
        debug!("executing {} rule blocks", blocks.len());
        blocks
            .iter()
            .map(|block| self.execute_rule_block(graph, block))
            .collect()
    }

    /// 执行一个已提取的规则块
    pub fn execute_rule_block(&self, graph: &mut Graph, block: &RuleBlock) -> RuleResult {
        let info = RuleInfo {
            name: block.name.clone(),
            description: block.description.clone(),
            priority: block.priority,
        };
        self.run(graph, info, &block.body)
    }

    fn run(&self, graph: &mut Graph, info: RuleInfo, rule_text: &str) -> RuleResult {
        let rule = match RuleParser::parse(rule_text) {
            Ok(rule) => rule,
            Err(error) => {
                warn!("rule '{}' failed to parse: {}", info.name, error);
                return RuleResult::failure(info, error);
            }
        };

        let tuples = match self.collect_binding_tuples(graph, &rule) {
            Ok(tuples) => tuples,
            Err(error) => return RuleResult::failure(info, error),
        };

        if tuples.is_empty() {
            // Zero matches is a successful outcome, not an error.
            return RuleResult {
                rule: info,
                success: true,
                match_count: 0,
                actions: None,
                error: None,
            };
        }

        let options = ExecutionOptions::from(&self.config.execution);
        let mut all_results = Vec::new();
        let mut success = true;
        let mut first_error = None;
        let mut match_count = 0;

        for tuple in &tuples {
            // Each tuple gets its own context so side effects stay isolated.
            let mut bindings = tuple.clone();
            let built = self.build_actions(&rule);

            match_count += 1;
            let report = ActionExecutor::execute_actions(graph, &built, &mut bindings, &options);
            if !report.success {
                success = false;
                if first_error.is_none() {
                    first_error = report.error.clone();
                }
            }
            all_results.extend(report.action_results);
        }

        debug!(
            "rule '{}' matched {} tuples, success={}",
            info.name, match_count, success
        );

        RuleResult {
            rule: info,
            success,
            match_count,
            actions: Some(ActionsSummary {
                action_results: all_results,
            }),
            error: first_error,
        }
    }

    /// 生成本条规则要执行的绑定元组
    fn collect_binding_tuples(
        &self,
        graph: &Graph,
        rule: &Rule,
    ) -> EngineResult<Vec<BindingContext>> {
        let match_clause = match &rule.match_clause {
            // CREATE-only rule: one empty binding context.
            None => return Ok(vec![BindingContext::new()]),
            Some(clause) => clause,
        };

        let mut sets = Vec::with_capacity(match_clause.patterns.len());
        for ast_pattern in &match_clause.patterns {
            let resolved = pattern::resolve_path_pattern(ast_pattern, &self.evaluator, graph)?;
            sets.push(self.matcher.match_pattern(graph, &resolved));
        }

        let mut tuples = combine_binding_sets(&sets);

        if let Some(filter) = &match_clause.where_clause {
            let mut kept = Vec::with_capacity(tuples.len());
            for tuple in tuples.drain(..) {
                match self.evaluator.evaluate_predicate(filter, &tuple, graph) {
                    Ok(true) => kept.push(tuple),
                    Ok(false) => {}
                    Err(error) if error.rejects_binding_only() => {
                        debug!("WHERE rejected a tuple: {}", error);
                    }
                    Err(error) => return Err(error),
                }
            }
            tuples = kept;
        }

        Ok(tuples)
    }

    /// 将动作模板实例化为具体动作序列
    fn build_actions(&self, rule: &Rule) -> Vec<Box<dyn Action>> {
        let mut built: Vec<Box<dyn Action>> = Vec::new();
        let mut anonymous = 0usize;

        for clause in &rule.actions {
            match clause {
                ActionClause::Create(items) => {
                    for item in items {
                        match item {
                            CreateItem::Node(node) => {
                                let variable =
                                    Self::node_variable(node, &mut anonymous);
                                built.push(Box::new(CreateNodeAction::new(
                                    variable,
                                    node.labels.clone(),
                                    node.properties.clone(),
                                    self.evaluator,
                                )));
                            }
                            CreateItem::Path(path) => {
                                self.build_path_actions(path, &mut anonymous, &mut built);
                            }
                        }
                    }
                }
                ActionClause::Set(items) => {
                    for item in items {
                        built.push(Box::new(SetPropertyAction::new(
                            item.variable.clone(),
                            item.key.clone(),
                            item.value.clone(),
                            self.evaluator,
                        )));
                    }
                }
            }
        }

        built
    }

    /// CREATE 路径项：裸节点引用（无标签、无属性、带变量）复用绑定中的
    /// 节点，其余节点模式生成 CreateNode；随后按段生成
    /// CreateRelationship，方向向左时交换两端。
    fn build_path_actions(
        &self,
        path: &PathPattern,
        anonymous: &mut usize,
        built: &mut Vec<Box<dyn Action>>,
    ) {
        let mut node_variables = Vec::with_capacity(path.segments.len() + 1);

        for node in path.node_patterns() {
            let is_reference = node.is_bare_reference() && node.variable.is_some();
            let variable = Self::node_variable(node, anonymous);
            if !is_reference {
                built.push(Box::new(CreateNodeAction::new(
                    variable.clone(),
                    node.labels.clone(),
                    node.properties.clone(),
                    self.evaluator,
                )));
            }
            node_variables.push(variable);
        }

        for (i, segment) in path.segments.iter().enumerate() {
            let rel = &segment.relationship;
            let (from, to) = match rel.direction {
                Direction::Incoming => (node_variables[i + 1].clone(), node_variables[i].clone()),
                // Undirected CREATE edges are written as outgoing.
                Direction::Outgoing | Direction::Both => {
                    (node_variables[i].clone(), node_variables[i + 1].clone())
                }
            };
            built.push(Box::new(CreateRelationshipAction::new(
                rel.variable.clone(),
                from,
                to,
                rel.rel_type.clone().unwrap_or_default(),
                rel.properties.clone(),
                self.evaluator,
            )));
        }
    }

    fn node_variable(node: &NodePattern, anonymous: &mut usize) -> String {
        match &node.variable {
            Some(variable) => variable.clone(),
            None => {
                let variable = format!("__anon_{}", anonymous);
                *anonymous += 1;
                variable
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// 便捷入口：以默认配置执行一条规则
pub fn execute_query(graph: &mut Graph, rule_text: &str) -> RuleResult {
    RuleEngine::default().execute_query(graph, rule_text)
}

/// 便捷入口：以默认配置执行 Markdown 中的全部规则
pub fn execute_queries_from_markdown(graph: &mut Graph, markdown: &str) -> Vec<RuleResult> {
    RuleEngine::default().execute_queries_from_markdown(graph, markdown)
}
