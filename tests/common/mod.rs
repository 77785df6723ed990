//! 集成测试共享工具模块

use std::collections::HashMap;

use graphrules::core::Value;
use graphrules::graph::Graph;

/// 构造属性包
pub fn props(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// 两人两任务的基础测试图
pub fn people_and_tasks() -> anyhow::Result<Graph> {
    let mut graph = Graph::new();
    graph.add_node("person1", "Person", props(&[("name", Value::from("Alice"))]))?;
    graph.add_node("person2", "Person", props(&[("name", Value::from("Bob"))]))?;
    graph.add_node("task1", "Task", props(&[("title", Value::from("write"))]))?;
    graph.add_node("task2", "Task", props(&[("title", Value::from("review"))]))?;
    Ok(graph)
}

/// 线性链 n0 -> n1 -> ... -> n{count-1}，节点标签 Node，边类型 NEXT
pub fn chain(count: usize) -> anyhow::Result<Graph> {
    let mut graph = Graph::new();
    for i in 0..count {
        graph.add_node(format!("n{}", i), "Node", HashMap::new())?;
    }
    for i in 0..count.saturating_sub(1) {
        graph.add_edge(
            format!("n{}", i),
            format!("n{}", i + 1),
            "NEXT",
            HashMap::new(),
        )?;
    }
    Ok(graph)
}

/// 图状态快照，用于回滚前后深度比较
#[derive(Debug, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<(String, String, Vec<(String, Value)>)>,
    edges: Vec<(String, String, String, Vec<(String, Value)>)>,
}

pub fn snapshot(graph: &Graph) -> GraphSnapshot {
    let mut nodes: Vec<_> = graph
        .get_all_nodes()
        .into_iter()
        .map(|n| {
            let mut properties: Vec<_> = n
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            properties.sort_by(|a, b| a.0.cmp(&b.0));
            (n.id.clone(), n.label.clone(), properties)
        })
        .collect();
    nodes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut edges: Vec<_> = graph
        .get_all_edges()
        .into_iter()
        .map(|e| {
            let mut properties: Vec<_> = e
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            properties.sort_by(|a, b| a.0.cmp(&b.0));
            (
                e.source.clone(),
                e.target.clone(),
                e.label.clone(),
                properties,
            )
        })
        .collect();
    edges.sort_by(|a, b| (&a.0, &a.1, &a.2).cmp(&(&b.0, &b.1, &b.2)));

    GraphSnapshot { nodes, edges }
}
