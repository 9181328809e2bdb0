//! Index-addressed sparse adjacency store for the link graph.
//!
//! Page ids are dense but unevenly distributed: many ids in `[0, max_id]`
//! belong to deleted pages or other namespaces and never appear. A
//! contiguous `Vec` of optional neighbor sets gives O(1) slot access with
//! per-slot cost paid only for pages that actually have outgoing links,
//! which at tens of millions of slots beats both a general hash map and
//! one allocation per node.

use crate::models::PageId;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Directed graph over `[0, max_id]`. Each slot is either absent (no page,
/// or a dead end with no recorded outgoing links) or a deduplicated set of
/// neighbor ids. Built once, read-only afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkGraph {
    slots: Vec<Option<FxHashSet<PageId>>>,
    present: usize,
    edges: u64,
}

impl LinkGraph {
    /// Create a graph with all slots absent. Allocation is proportional to
    /// `max_id`, never to the eventual edge count.
    pub fn new(max_id: PageId) -> Self {
        Self {
            slots: vec![None; max_id as usize + 1],
            present: 0,
            edges: 0,
        }
    }

    /// Largest valid page id.
    pub fn max_id(&self) -> PageId {
        (self.slots.len() - 1) as PageId
    }

    /// Whether `id` lies in `[0, max_id]`.
    pub fn is_valid(&self, id: PageId) -> bool {
        (id as usize) < self.slots.len()
    }

    /// Insert the edge `from -> to`. Returns whether the edge was newly
    /// inserted; duplicates collapse. Both endpoints must be valid ids --
    /// the builder resolves them against the catalog before calling.
    pub fn add_edge(&mut self, from: PageId, to: PageId) -> bool {
        debug_assert!(self.is_valid(from) && self.is_valid(to));
        let slot = &mut self.slots[from as usize];
        let set = match slot {
            Some(set) => set,
            None => {
                self.present += 1;
                slot.insert(FxHashSet::default())
            }
        };
        let inserted = set.insert(to);
        if inserted {
            self.edges += 1;
        }
        inserted
    }

    /// Outgoing neighbors of `id`, or `None` for absent slots (unknown
    /// pages and dead ends look alike to traversals).
    pub fn neighbors(&self, id: PageId) -> Option<&FxHashSet<PageId>> {
        self.slots.get(id as usize)?.as_ref()
    }

    /// Number of slots holding at least one outgoing edge.
    pub fn present_count(&self) -> usize {
        self.present
    }

    /// Total unique edges inserted.
    pub fn edge_count(&self) -> u64 {
        self.edges
    }

    /// Draw a uniformly random present slot by rejection sampling over the
    /// full id range. Returns `None` only when the graph is entirely
    /// absent, in which case sampling could never terminate.
    pub fn sample_random_present<R: Rng>(&self, rng: &mut R) -> Option<PageId> {
        if self.present == 0 {
            return None;
        }
        loop {
            let id = rng.gen_range(0..self.slots.len());
            if self.slots[id].is_some() {
                return Some(id as PageId);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn new_graph_is_all_absent() {
        let graph = LinkGraph::new(10);
        assert_eq!(graph.max_id(), 10);
        assert_eq!(graph.present_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        for id in 0..=10 {
            assert!(graph.neighbors(id).is_none());
        }
    }

    #[test]
    fn add_edge_makes_neighbor_visible() {
        let mut graph = LinkGraph::new(5);
        assert!(graph.add_edge(1, 3));
        let neighbors = graph.neighbors(1).unwrap();
        assert!(neighbors.contains(&3));
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = LinkGraph::new(5);
        assert!(graph.add_edge(1, 3));
        assert!(!graph.add_edge(1, 3));
        assert_eq!(graph.neighbors(1).unwrap().len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loop_allowed() {
        let mut graph = LinkGraph::new(2);
        assert!(graph.add_edge(1, 1));
        assert!(graph.neighbors(1).unwrap().contains(&1));
    }

    #[test]
    fn present_count_tracks_slots_not_edges() {
        let mut graph = LinkGraph::new(10);
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(7, 3);
        assert_eq!(graph.present_count(), 2);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn is_valid_respects_bounds() {
        let graph = LinkGraph::new(4);
        assert!(graph.is_valid(0));
        assert!(graph.is_valid(4));
        assert!(!graph.is_valid(5));
    }

    #[test]
    fn neighbors_out_of_range_is_none() {
        let graph = LinkGraph::new(4);
        assert!(graph.neighbors(100).is_none());
    }

    #[test]
    fn sample_fails_on_empty_graph() {
        let graph = LinkGraph::new(1000);
        let mut rng = SmallRng::seed_from_u64(42);
        assert_eq!(graph.sample_random_present(&mut rng), None);
    }

    #[test]
    fn sample_returns_a_present_slot() {
        let mut graph = LinkGraph::new(1000);
        graph.add_edge(517, 3);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(graph.sample_random_present(&mut rng), Some(517));
        }
    }

    #[test]
    fn sample_covers_multiple_present_slots() {
        let mut graph = LinkGraph::new(50);
        graph.add_edge(3, 0);
        graph.add_edge(40, 0);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(graph.sample_random_present(&mut rng).unwrap());
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&3) && seen.contains(&40));
    }
}
