//! 引擎配置
//!
//! 匹配器与执行策略的可调参数，带默认值，支持从 TOML 文件加载。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, EngineResult};

/// 匹配器配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    /// 标签与关系类型是否区分大小写
    pub case_sensitive_labels: bool,
    /// 属性约束比较时是否允许数值强制转换（"42" 与 42 相等）
    pub coerce_property_values: bool,
    /// 单条路径允许的最大边数
    pub max_path_depth: usize,
    /// 单次路径匹配返回的结果上限（超出即截断）
    pub max_path_results: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            case_sensitive_labels: false,
            coerce_property_values: false,
            max_path_depth: 10,
            max_path_results: 1000,
        }
    }
}

/// 动作执行策略配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ExecutionConfig {
    /// 执行前先校验全部动作；任一失败则不产生副作用
    pub validate_before_execute: bool,
    /// 某个动作失败后继续执行后续动作
    pub continue_on_failure: bool,
    /// 失败时按撤销日志回滚已执行的动作
    pub rollback_on_failure: bool,
}

/// 节点ID分配配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IdConfig {
    pub prefix: String,
    pub start: i64,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: "node".to_string(),
            start: 0,
        }
    }
}

/// 引擎总配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub execution: ExecutionConfig,
    pub ids: IdConfig,
}

impl EngineConfig {
    /// 从 TOML 文件加载配置；缺失的字段取默认值
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::parse(format!(
                "cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| EngineError::parse(format!("invalid config file: {}", e)))
    }
}
