//! Dependency graph with incrementally maintained reachability

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Fixed-size set of node indices
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSet {
    words: Vec<u64>,
}

impl NodeSet {
    /// Empty set able to hold indices below `capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
        }
    }

    /// Add `index`; it must be below the capacity
    pub fn insert(&mut self, index: usize) {
        self.words[index / 64] |= 1u64 << (index % 64);
    }

    /// Whether `index` is a member; false past the capacity
    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|w| w & (1u64 << (index % 64)) != 0)
    }

    /// Add every member of `other`
    pub fn union_with(&mut self, other: &Self) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no index is a member
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            (0..64)
                .filter(move |bit| w & (1u64 << bit) != 0)
                .map(move |bit| i * 64 + bit)
        })
    }
}

/// Directed acyclic graph over the loci
///
/// An edge `source -> target` means `target`'s decision tree splits on
/// `source`. Besides direct parents and children every node carries its full
/// ancestor and descendant sets, updated on each insertion, so feasibility
/// checks never walk the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    parents: Vec<BTreeSet<usize>>,
    children: Vec<BTreeSet<usize>>,
    ancestors: Vec<NodeSet>,
    descendants: Vec<NodeSet>,
}

impl DependencyGraph {
    /// Graph with `nodes` nodes and no edges
    pub fn new(nodes: usize) -> Self {
        Self {
            parents: vec![BTreeSet::new(); nodes],
            children: vec![BTreeSet::new(); nodes],
            ancestors: vec![NodeSet::with_capacity(nodes); nodes],
            descendants: vec![NodeSet::with_capacity(nodes); nodes],
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Direct parents of `node`, ascending
    pub fn parents(&self, node: usize) -> &BTreeSet<usize> {
        &self.parents[node]
    }

    /// Direct children of `node`, ascending
    pub fn children(&self, node: usize) -> &BTreeSet<usize> {
        &self.children[node]
    }

    /// Every node with a path into `node`
    pub fn ancestors(&self, node: usize) -> &NodeSet {
        &self.ancestors[node]
    }

    /// Every node reachable from `node`
    pub fn descendants(&self, node: usize) -> &NodeSet {
        &self.descendants[node]
    }

    /// Number of direct parents of `node`
    pub fn in_degree(&self, node: usize) -> usize {
        self.parents[node].len()
    }

    /// Largest parent count over all nodes, 0 for an empty graph
    pub fn max_in_degree(&self) -> usize {
        self.parents.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.parents.iter().map(BTreeSet::len).sum()
    }

    /// Whether `source -> target` keeps the graph acyclic and adds a new parent
    ///
    /// Rejects self-loops, edges from a descendant of `target` and edges from
    /// a node that already reaches `target`.
    pub fn may_add_edge(&self, source: usize, target: usize) -> bool {
        source != target
            && !self.ancestors[target].contains(source)
            && !self.descendants[target].contains(source)
    }

    /// Insert `source -> target` and propagate reachability
    pub fn add_edge(&mut self, source: usize, target: usize) -> Result<(), ModelError> {
        if !self.may_add_edge(source, target) {
            return Err(ModelError::invariant(format!(
                "edge {source} -> {target} would close a cycle or duplicate a dependency"
            )));
        }
        self.parents[target].insert(source);
        self.children[source].insert(target);

        let mut upstream = self.ancestors[source].clone();
        upstream.insert(source);
        let mut downstream = self.descendants[target].clone();
        downstream.insert(target);

        for node in upstream.iter() {
            self.descendants[node].union_with(&downstream);
        }
        for node in downstream.iter() {
            self.ancestors[node].union_with(&upstream);
        }
        Ok(())
    }

    /// Parents-first ordering, smallest ready index first
    ///
    /// Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut remaining: Vec<usize> = self.parents.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<usize> = (0..self.len()).filter(|&n| remaining[n] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &child in &self.children[node] {
                remaining[child] -= 1;
                if remaining[child] == 0 {
                    ready.insert(child);
                }
            }
        }
        (order.len() == self.len()).then_some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // Breadth-first walk over child edges
    fn walk_descendants(g: &DependencyGraph, node: usize) -> NodeSet {
        let mut seen = NodeSet::with_capacity(g.len());
        let mut queue: VecDeque<usize> = g.children(node).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            if !seen.contains(next) {
                seen.insert(next);
                queue.extend(g.children(next).iter().copied());
            }
        }
        seen
    }

    #[test]
    fn test_node_set() {
        let mut set = NodeSet::with_capacity(130);
        assert!(set.is_empty());
        set.insert(0);
        set.insert(64);
        set.insert(129);
        assert!(set.contains(64));
        assert!(!set.contains(63));
        assert!(!set.contains(500));
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
    }

    #[test]
    fn test_add_edge_tracks_closure() {
        let mut g = DependencyGraph::new(4);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();

        assert!(g.ancestors(2).contains(0));
        assert!(g.descendants(0).contains(2));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.in_degree(2), 1);

        // Closing the cycle, duplicating the edge, and shortcutting are refused
        assert!(!g.may_add_edge(2, 0));
        assert!(!g.may_add_edge(1, 2));
        assert!(!g.may_add_edge(0, 2));
        assert!(!g.may_add_edge(3, 3));
        assert!(g.add_edge(2, 0).is_err());

        assert!(g.may_add_edge(3, 2));
    }

    #[test]
    fn test_closure_matches_walk() {
        let mut g = DependencyGraph::new(6);
        for (s, t) in [(0, 2), (1, 2), (2, 3), (4, 5), (5, 3)] {
            g.add_edge(s, t).unwrap();
        }
        for node in 0..6 {
            assert_eq!(g.descendants(node), &walk_descendants(&g, node));
            for descendant in g.descendants(node).iter() {
                assert!(g.ancestors(descendant).contains(node));
            }
        }
        assert_eq!(g.descendants(0).iter().collect::<Vec<_>>(), vec![2, 3]);
        assert!(g.descendants(3).is_empty());
    }

    #[test]
    fn test_topological_order() {
        let mut g = DependencyGraph::new(4);
        g.add_edge(3, 0).unwrap();
        g.add_edge(2, 1).unwrap();
        g.add_edge(0, 1).unwrap();

        let order = g.topological_order().unwrap();
        assert_eq!(order, vec![2, 3, 0, 1]);
    }
}
