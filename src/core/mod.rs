//! 核心类型模块
//!
//! 图元素、值类型、绑定上下文和统一错误处理

pub mod binding;
pub mod error;
pub mod node_edge_path;
pub mod value;

pub use binding::BindingContext;
pub use error::{EngineError, EngineResult};
pub use node_edge_path::{Edge, Node, Path};
pub use value::Value;
