//! ID生成器模块 - 为新建节点分配标识符

use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic node-id allocator. Produces `<prefix>_<n>` identifiers.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: AtomicI64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>, init: i64) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicI64::new(init),
        }
    }

    /// 生成下一个标识符
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}_{}", self.prefix, n)
    }

    /// 重置计数器到指定值
    pub fn reset(&self, value: i64) {
        self.counter.store(value, Ordering::SeqCst);
    }

    pub fn current_value(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Clone for IdGenerator {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            counter: AtomicI64::new(self.current_value()),
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("node", 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let generator = IdGenerator::default();
        assert_eq!(generator.next_id(), "node_0");
        assert_eq!(generator.next_id(), "node_1");
        assert_eq!(generator.next_id(), "node_2");
    }

    #[test]
    fn test_reset() {
        let generator = IdGenerator::new("task", 5);
        assert_eq!(generator.next_id(), "task_5");
        generator.reset(100);
        assert_eq!(generator.next_id(), "task_100");
    }
}
