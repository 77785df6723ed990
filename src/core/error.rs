//! 统一错误处理系统 for graphrules
//!
//! 错误按发生的阶段分类：解析、绑定解析、图身份、表达式求值、
//! 动作校验与执行。所有错误作为值返回，不使用 panic 传播。

use thiserror::Error;

/// 统一的引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Variable '{0}' not found in bindings")]
    UnboundVariable(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Execution failed: {action}: {cause}")]
    ExecutionFailed { action: String, cause: String },
}

impl EngineError {
    /// 绑定上下文缺失变量
    pub fn unbound(name: impl Into<String>) -> Self {
        EngineError::UnboundVariable(name.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        EngineError::Type(message.into())
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        EngineError::Numeric(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::ValidationFailed(message.into())
    }

    pub fn execution(action: impl Into<String>, cause: impl Into<String>) -> Self {
        EngineError::ExecutionFailed {
            action: action.into(),
            cause: cause.into(),
        }
    }

    /// 该错误是否应在 WHERE 过滤时仅丢弃当前绑定（而非终止整条规则）
    pub fn rejects_binding_only(&self) -> bool {
        matches!(
            self,
            EngineError::UnboundVariable(_) | EngineError::Type(_) | EngineError::Numeric(_)
        )
    }
}

/// 统一的结果类型
pub type EngineResult<T> = Result<T, EngineError>;
