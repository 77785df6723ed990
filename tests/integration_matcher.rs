//! 匹配器与组合器集成测试
//!
//! 变长路径、去重、绑定富化、缓存失效与上限约束。

mod common;

use common::{chain, props};

use graphrules::config::MatcherConfig;
use graphrules::core::{BindingContext, Value};
use graphrules::graph::{Direction, Graph};
use graphrules::matcher::combiner::combine_binding_sets;
use graphrules::matcher::{
    NodePattern, PathPattern, PathSegment, PatternMatcher, RelationshipPattern,
};
use std::collections::HashMap;

fn node_pattern(variable: &str, label: &str) -> NodePattern {
    NodePattern {
        variable: Some(variable.to_string()),
        labels: vec![label.to_string()],
        properties: HashMap::new(),
    }
}

fn rel(rel_type: &str) -> RelationshipPattern {
    RelationshipPattern {
        rel_type: Some(rel_type.to_string()),
        ..Default::default()
    }
}

#[test]
fn returned_nodes_all_satisfy_the_pattern() {
    let mut graph = Graph::new();
    graph
        .add_node("a", "Person", props(&[("age", Value::Int(30))]))
        .unwrap();
    graph
        .add_node("b", "Person", props(&[("age", Value::Int(20))]))
        .unwrap();
    graph.add_node("c", "Task", HashMap::new()).unwrap();

    let matcher = PatternMatcher::default();
    let mut pattern = node_pattern("p", "Person");
    pattern
        .properties
        .insert("age".to_string(), Value::Int(30));

    let found = matcher.find_matching_nodes(&graph, &pattern);
    assert_eq!(found.len(), 1);
    for node in &found {
        assert!(pattern.matches(node, false, false));
        assert!(graph.get_node(&node.id).is_some());
    }
}

#[test]
fn variable_length_paths_respect_bounds_and_dedup() {
    // Diamond: s -> a -> e, s -> b -> e; plus direct s -> e
    let mut graph = Graph::new();
    for id in ["s", "a", "b", "e"] {
        graph.add_node(id, "N", HashMap::new()).unwrap();
    }
    graph.add_edge("s", "a", "R", HashMap::new()).unwrap();
    graph.add_edge("s", "b", "R", HashMap::new()).unwrap();
    graph.add_edge("a", "e", "R", HashMap::new()).unwrap();
    graph.add_edge("b", "e", "R", HashMap::new()).unwrap();
    graph.add_edge("s", "e", "R", HashMap::new()).unwrap();

    let matcher = PatternMatcher::default();
    let pattern = PathPattern {
        start: NodePattern {
            variable: Some("s".to_string()),
            labels: Vec::new(),
            properties: {
                let mut p = HashMap::new();
                p.insert("id".to_string(), Value::from("s"));
                p
            },
        },
        segments: vec![PathSegment {
            relationship: RelationshipPattern {
                min_hops: 1,
                max_hops: Some(2),
                ..rel("R")
            },
            node: NodePattern {
                variable: Some("end".to_string()),
                labels: Vec::new(),
                properties: {
                    let mut p = HashMap::new();
                    p.insert("id".to_string(), Value::from("e"));
                    p
                },
            },
        }],
    };

    let paths = matcher.find_matching_paths(&graph, &pattern);
    // s->e, s->a->e, s->b->e; every path distinct, none repeated by the
    // extend/advance interleaving.
    assert_eq!(paths.len(), 3);
    let mut keys: Vec<String> = paths.iter().map(|p| p.canonical_key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3);

    for path in &paths {
        assert!(path.length() <= 2);
        assert_eq!(path.end().id, "e");
    }
}

#[test]
fn overall_depth_cap_applies_across_segments() {
    let graph = chain(9).unwrap();
    let matcher = PatternMatcher::new(MatcherConfig {
        max_path_depth: 3,
        ..Default::default()
    });

    let pattern = PathPattern {
        start: node_pattern("a", "Node"),
        segments: vec![
            PathSegment {
                relationship: RelationshipPattern {
                    min_hops: 1,
                    max_hops: None,
                    ..rel("NEXT")
                },
                node: NodePattern::default(),
            },
            PathSegment {
                relationship: RelationshipPattern {
                    min_hops: 1,
                    max_hops: None,
                    ..rel("NEXT")
                },
                node: node_pattern("b", "Node"),
            },
        ],
    };

    let paths = matcher.find_matching_paths(&graph, &pattern);
    assert!(!paths.is_empty());
    assert!(paths.iter().all(|p| p.length() <= 3));
}

#[test]
fn enriched_pattern_restricts_to_bound_node() {
    let graph = chain(3).unwrap();
    let matcher = PatternMatcher::default();

    let pattern = PathPattern {
        start: node_pattern("a", "Node"),
        segments: vec![PathSegment {
            relationship: rel("NEXT"),
            node: node_pattern("b", "Node"),
        }],
    };

    // Unconstrained: two single-hop paths (n0->n1, n1->n2).
    assert_eq!(matcher.find_matching_paths(&graph, &pattern).len(), 2);

    // Bind a to n1 and enrich: only n1->n2 remains.
    let mut bindings = BindingContext::new();
    bindings.set(
        "a",
        Value::Node(graph.get_node("n1").unwrap().clone()),
    );
    let enriched = pattern.enriched_with_bindings(&bindings);
    let paths = matcher.find_matching_paths(&graph, &enriched);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].start().id, "n1");
}

#[test]
fn clear_cache_then_requery_is_idempotent() {
    let mut graph = Graph::new();
    for i in 0..5 {
        graph
            .add_node(format!("p{}", i), "Person", HashMap::new())
            .unwrap();
    }

    let matcher = PatternMatcher::default();
    let pattern = node_pattern("p", "Person");

    let mut first: Vec<String> = matcher
        .find_matching_nodes(&graph, &pattern)
        .into_iter()
        .map(|n| n.id)
        .collect();
    matcher.clear_cache();
    let mut second: Vec<String> = matcher
        .find_matching_nodes(&graph, &pattern)
        .into_iter()
        .map(|n| n.id)
        .collect();

    first.sort();
    second.sort();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn mutation_between_queries_invalidates_caches() {
    let mut graph = Graph::new();
    graph.add_node("a", "Person", HashMap::new()).unwrap();

    let matcher = PatternMatcher::default();
    let pattern = node_pattern("p", "Person");
    assert_eq!(matcher.find_matching_nodes(&graph, &pattern).len(), 1);

    graph.remove_node("a");
    assert!(matcher.find_matching_nodes(&graph, &pattern).is_empty());

    graph.add_node("b", "Person", HashMap::new()).unwrap();
    graph.add_node("c", "Person", HashMap::new()).unwrap();
    assert_eq!(matcher.find_matching_nodes(&graph, &pattern).len(), 2);
}

#[test]
fn relationship_lookup_honors_direction_from_source() {
    let mut graph = Graph::new();
    graph.add_node("hub", "N", HashMap::new()).unwrap();
    graph.add_node("x", "N", HashMap::new()).unwrap();
    graph.add_node("y", "N", HashMap::new()).unwrap();
    graph.add_edge("hub", "x", "R", HashMap::new()).unwrap();
    graph.add_edge("y", "hub", "R", HashMap::new()).unwrap();

    let matcher = PatternMatcher::default();

    let outgoing = matcher.find_matching_relationships(
        &graph,
        &RelationshipPattern {
            direction: Direction::Outgoing,
            ..rel("R")
        },
        Some("hub"),
    );
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].target, "x");

    let incoming = matcher.find_matching_relationships(
        &graph,
        &RelationshipPattern {
            direction: Direction::Incoming,
            ..rel("R")
        },
        Some("hub"),
    );
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].source, "y");

    let both = matcher.find_matching_relationships(
        &graph,
        &RelationshipPattern {
            direction: Direction::Both,
            ..rel("R")
        },
        Some("hub"),
    );
    assert_eq!(both.len(), 2);
}

#[test]
fn combiner_product_counts_match() {
    let make_set = |name: &str, count: usize| -> Vec<BindingContext> {
        (0..count)
            .map(|i| {
                let mut b = BindingContext::new();
                b.set(name, Value::Int(i as i64));
                b
            })
            .collect()
    };

    let sets = vec![make_set("a", 3), make_set("b", 2), make_set("c", 4)];
    assert_eq!(combine_binding_sets(&sets).len(), 24);

    let with_empty = vec![make_set("a", 3), Vec::new(), make_set("c", 4)];
    assert!(combine_binding_sets(&with_empty).is_empty());
}
