use crate::graph::ProcessGraph;
use std::collections::BTreeSet;

/// Topological order of node ids
///
/// Kahn's algorithm over `to`-adjacency; ready nodes leave in insertion order. When only
/// cycles remain, the earliest unvisited node is forced out, so every node appears
/// exactly once and the sort always terminates.
pub fn topological_order(graph: &ProcessGraph) -> Vec<String> {
    let count = graph.len();
    let mut in_degree = vec![0usize; count];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); count];

    for edge in graph.edges() {
        let (Some(from), Some(to)) = (graph.position(&edge.from), graph.position(&edge.to)) else {
            continue;
        };
        adjacency[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while order.len() < count {
        let next = match ready.pop_first() {
            Some(position) => position,
            None => {
                let Some(forced) = visited.iter().position(|v| !v) else {
                    break;
                };
                log::debug!("Breaking cycle at node position {}", forced);
                forced
            }
        };
        if visited[next] {
            continue;
        }
        visited[next] = true;

        if let Some(node) = graph.node_at(next) {
            order.push(node.id.clone());
        }

        for &target in &adjacency[next] {
            if visited[target] {
                continue;
            }
            in_degree[target] = in_degree[target].saturating_sub(1);
            if in_degree[target] == 0 {
                ready.insert(target);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActionKind, EdgeKind, NodeSpec};

    fn graph_with(ids: &[&str], edges: &[(&str, &str)]) -> ProcessGraph {
        let mut graph = ProcessGraph::default();
        for id in ids {
            graph
                .create_node(NodeSpec::action(ActionKind::Click, *id).with_id(*id))
                .unwrap();
        }
        for (from, to) in edges {
            graph.add_edge(from, to, EdgeKind::Normal, None).unwrap();
        }
        graph
    }

    fn assert_respects_edges(graph: &ProcessGraph, order: &[String]) {
        for edge in graph.edges() {
            let from = order.iter().position(|id| *id == edge.from).unwrap();
            let to = order.iter().position(|id| *id == edge.to).unwrap();
            assert!(from < to, "{} must precede {}", edge.from, edge.to);
        }
    }

    #[test]
    fn test_linear_chain() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert_eq!(topological_order(&graph), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_order_differs_from_insertion() {
        let graph = graph_with(&["c", "a", "b"], &[("a", "b"), ("b", "c")]);
        let order = topological_order(&graph);
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_respects_edges(&graph, &order);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let graph = graph_with(&["root", "x", "y", "z"], &[("root", "z"), ("root", "x"), ("root", "y")]);
        assert_eq!(topological_order(&graph), vec!["root", "x", "y", "z"]);
    }

    #[test]
    fn test_diamond_is_deterministic() {
        let edges = [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")];
        let graph = graph_with(&["a", "b", "c", "d"], &edges);
        let first = topological_order(&graph);
        assert_respects_edges(&graph, &first);
        for _ in 0..5 {
            assert_eq!(topological_order(&graph), first);
        }
    }

    #[test]
    fn test_cycle_is_broken_not_rejected() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "b")]);
        assert_eq!(topological_order(&graph), vec!["a", "b", "c"]);

        let ring = graph_with(&["x", "y"], &[("x", "y"), ("y", "x")]);
        assert_eq!(topological_order(&ring), vec!["x", "y"]);
    }

    #[test]
    fn test_self_loop_terminates() {
        let graph = graph_with(&["solo"], &[("solo", "solo")]);
        assert_eq!(topological_order(&graph), vec!["solo"]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(topological_order(&ProcessGraph::default()).is_empty());
    }
}
