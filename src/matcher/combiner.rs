//! 绑定组合器
//!
//! 将每个逗号分隔模式各自的绑定集合做笛卡尔积，合并为统一的
//! 绑定上下文。任一集合为空时整体为空（零匹配，而非缺绑定的
//! 单元组）。不去重：重复模式产生的相同元组全部保留。

use log::trace;

use crate::core::binding::BindingContext;

/// 笛卡尔组合。输出顺序是各来源集合迭代顺序的字典序。
///
/// 同名变量在不同模式中解析到不同值的组合被静默丢弃；解析到相同
/// 值的组合正常合并。零个集合的积是单个空上下文（积的幺元）。
pub fn combine_binding_sets(sets: &[Vec<BindingContext>]) -> Vec<BindingContext> {
    if sets.iter().any(Vec::is_empty) {
        return Vec::new();
    }

    let mut combined = vec![BindingContext::new()];
    for set in sets {
        let mut next = Vec::with_capacity(combined.len() * set.len());
        for base in &combined {
            for bindings in set {
                let mut merged = base.clone();
                if merged.merge_compatible(bindings) {
                    next.push(merged);
                } else {
                    trace!("dropping tuple: conflicting rebinding across patterns");
                }
            }
        }
        combined = next;
    }
    combined
}
