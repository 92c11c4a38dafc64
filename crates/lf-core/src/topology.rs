//! Topological queries over the bus/branch graph.
//!
//! Electrical islands (connected components) decide where the slack-bus
//! invariant applies: every island needs exactly one angle reference.
//! The graph is rebuilt on demand from the flat bus/branch lists; networks
//! here are small enough that this costs nothing measurable.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::VecDeque;

/// Groups of bus positions (indices into the bus list) that are electrically
/// connected. Every bus appears in exactly one group; groups are ordered by
/// their lowest member, members ascending.
pub fn islands(bus_count: usize, links: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut graph = UnGraph::<usize, ()>::with_capacity(bus_count, links.len());
    let nodes: Vec<NodeIndex> = (0..bus_count).map(|i| graph.add_node(i)).collect();
    for &(a, b) in links {
        graph.add_edge(nodes[a], nodes[b], ());
    }

    let mut seen = vec![false; bus_count];
    let mut groups = Vec::new();
    for start in 0..bus_count {
        if seen[start] {
            continue;
        }
        let mut members = Vec::new();
        let mut queue = VecDeque::from([nodes[start]]);
        while let Some(node) = queue.pop_front() {
            let bus = graph[node];
            if seen[bus] {
                continue;
            }
            seen[bus] = true;
            members.push(bus);
            for neighbor in graph.neighbors(node) {
                if !seen[graph[neighbor]] {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort_unstable();
        groups.push(members);
    }
    groups
}
