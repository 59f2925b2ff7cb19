//! Execution planning - turning requested targets into one linear order.
//!
//! 1. Take the transitive closure of `depends_on` from the requested targets.
//! 2. Add an edge for every `depends_on`, and for every `after` whose other
//!    end is in the closure. `after` never pulls a target in.
//! 3. Order topologically; among ready targets, declaration order wins.
//!
//! A cycle is reported with one of its edges, picked deterministically.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::graph::errors::GraphError;
use crate::graph::target::Target;

/// Why one target is ordered before another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    DependsOn,
    After,
}

/// The resolved, linear order of targets for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Targets as requested (or the default target).
    pub requested: Vec<String>,
    /// Every target to run, each exactly once, in execution order.
    pub order: Vec<String>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.order.iter().any(|t| t == target)
    }

    pub fn position(&self, target: &str) -> Option<usize> {
        self.order.iter().position(|t| t == target)
    }
}

fn unknown<C>(targets: &[Target<C>], name: &str, referenced_by: Option<&str>) -> GraphError {
    GraphError::UnknownTarget {
        name: name.to_string(),
        referenced_by: referenced_by.map(String::from),
        available: targets
            .iter()
            .filter(|t| !t.is_unlisted())
            .map(|t| t.name().to_string())
            .collect(),
    }
}

/// Check that every edge of every declared target names a declared target.
fn check_references<C>(
    targets: &[Target<C>],
    index: &HashMap<String, usize>,
) -> Result<(), GraphError> {
    for target in targets {
        for name in target.get_depends_on().iter().chain(target.get_after()) {
            if !index.contains_key(name) {
                return Err(unknown(targets, name, Some(target.name())));
            }
        }
    }
    Ok(())
}

/// Resolve requested target names into an execution plan.
pub(crate) fn resolve<C>(
    targets: &[Target<C>],
    index: &HashMap<String, usize>,
    requested: &[String],
) -> Result<ExecutionPlan, GraphError> {
    check_references(targets, index)?;

    // Closure over depends_on. BTreeSet keeps declaration order.
    let mut selected: BTreeSet<usize> = BTreeSet::new();
    let mut stack: Vec<usize> = Vec::new();
    for name in requested {
        let &idx = index.get(name).ok_or_else(|| unknown(targets, name, None))?;
        stack.push(idx);
    }
    while let Some(idx) = stack.pop() {
        if selected.insert(idx) {
            for dep in targets[idx].get_depends_on() {
                stack.push(index[dep]);
            }
        }
    }

    // Nodes are added in declaration order, so node index order is declaration order.
    let mut graph: DiGraph<usize, EdgeKind> = DiGraph::new();
    let mut nodes: HashMap<usize, NodeIndex> = HashMap::new();
    for &idx in &selected {
        nodes.insert(idx, graph.add_node(idx));
    }

    for &idx in &selected {
        let target = &targets[idx];
        for dep in target.get_depends_on() {
            graph.update_edge(nodes[&index[dep]], nodes[&idx], EdgeKind::DependsOn);
        }
        for before in target.get_after() {
            if let Some(&before_node) = nodes.get(&index[before]) {
                if graph.find_edge(before_node, nodes[&idx]).is_none() {
                    graph.add_edge(before_node, nodes[&idx], EdgeKind::After);
                }
            }
        }
    }

    let order = topological_order(&graph).map_err(|(from, to)| GraphError::Cycle {
        from: targets[graph[from]].name().to_string(),
        to: targets[graph[to]].name().to_string(),
    })?;

    Ok(ExecutionPlan {
        requested: requested.to_vec(),
        order: order
            .into_iter()
            .map(|n| targets[graph[n]].name().to_string())
            .collect(),
    })
}

/// Kahn's algorithm with lowest-index-first tie breaking.
///
/// On a cycle, returns the lowest (source, target) edge inside a cyclic
/// strongly connected component.
fn topological_order(
    graph: &DiGraph<usize, EdgeKind>,
) -> Result<Vec<NodeIndex>, (NodeIndex, NodeIndex)> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BTreeSet<NodeIndex> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for next in graph.neighbors_directed(node, Direction::Outgoing) {
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() == graph.node_count() {
        return Ok(order);
    }

    let mut component = vec![0usize; graph.node_count()];
    let mut cyclic = vec![false; graph.node_count()];
    for (i, scc) in tarjan_scc(graph).iter().enumerate() {
        for n in scc {
            component[n.index()] = i;
            cyclic[n.index()] = scc.len() > 1;
        }
    }

    let mut edges: Vec<(NodeIndex, NodeIndex)> = graph
        .edge_references()
        .map(|e| (e.source(), e.target()))
        .filter(|(s, t)| s == t || (cyclic[s.index()] && component[s.index()] == component[t.index()]))
        .collect();
    edges.sort();

    // Kahn stalled, so at least one cyclic edge exists.
    Err(edges[0])
}
