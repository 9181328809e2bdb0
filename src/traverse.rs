//! Breadth-first traversals over the link graph.
//!
//! Three queries share the same frontier expansion: shortest path (early
//! exit on the target), furthest page (full sweep of the reachable
//! component), and pseudo-diameter estimation (repeated furthest sweeps).
//! All of them treat an absent slot as a dead end, never as an error, and
//! none of them mutate the graph.

use crate::catalog::PageCatalog;
use crate::config::PROGRESS_INTERVAL;
use crate::graph::LinkGraph;
use crate::models::{PageId, QueryError};
use indicatif::ProgressBar;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::info;

/// Outcome of a shortest-path search. `path` is `None` when the target was
/// never reached; `visited` then covers the full component reachable from
/// the start.
pub struct PathSearch {
    pub visited: usize,
    pub path: Option<Vec<PageId>>,
}

/// Outcome of a furthest-node sweep.
pub struct Furthest {
    pub node: PageId,
    pub distance: u32,
    pub visited: usize,
}

/// Best eccentricity pair found by the double-sweep heuristic. The
/// distance is a lower bound on the true diameter.
#[derive(Debug, Clone, Copy)]
pub struct DiameterEstimate {
    pub start: PageId,
    pub end: PageId,
    pub distance: u32,
}

/// Unweighted BFS from `start`, stopping as soon as `end` is discovered.
pub fn bfs_path(graph: &LinkGraph, start: PageId, end: PageId) -> PathSearch {
    if start == end {
        return PathSearch {
            visited: 1,
            path: Some(vec![start]),
        };
    }

    let mut visited = FxHashSet::default();
    let mut parent: FxHashMap<PageId, PageId> = FxHashMap::default();
    let mut frontier = VecDeque::new();

    visited.insert(start);
    frontier.push_back(start);
    let mut found = false;

    'expand: while let Some(curr) = frontier.pop_front() {
        if let Some(neighbors) = graph.neighbors(curr) {
            for &next in neighbors {
                if visited.insert(next) {
                    parent.insert(next, curr);
                    if next == end {
                        found = true;
                        break 'expand;
                    }
                    frontier.push_back(next);
                }
            }
        }
    }

    let path = found.then(|| {
        let mut path = vec![end];
        let mut curr = end;
        while let Some(&from) = parent.get(&curr) {
            path.push(from);
            curr = from;
        }
        path.reverse();
        path
    });

    PathSearch {
        visited: visited.len(),
        path,
    }
}

/// Full BFS from `start`: no early exit, the entire reachable component is
/// explored. Among nodes tied at the maximum depth the one dequeued last
/// wins; BFS dequeues in nondecreasing depth order, so the `>=` update
/// keeps exactly that node.
pub fn bfs_furthest(graph: &LinkGraph, start: PageId) -> Furthest {
    let mut visited = FxHashSet::default();
    let mut frontier = VecDeque::new();
    let mut max_node = start;
    let mut max_dist = 0;
    let mut dequeued: u64 = 0;
    let pb = ProgressBar::new(graph.present_count() as u64);

    visited.insert(start);
    frontier.push_back((start, 0));

    while let Some((curr, dist)) = frontier.pop_front() {
        dequeued += 1;
        if dequeued % PROGRESS_INTERVAL == 0 {
            pb.set_position(dequeued);
        }
        if dist >= max_dist {
            max_dist = dist;
            max_node = curr;
        }
        if let Some(neighbors) = graph.neighbors(curr) {
            for &next in neighbors {
                if visited.insert(next) {
                    frontier.push_back((next, dist + 1));
                }
            }
        }
    }

    pb.finish_and_clear();

    Furthest {
        node: max_node,
        distance: max_dist,
        visited: visited.len(),
    }
}

/// Double-sweep pseudo-diameter estimation: repeatedly chase the furthest
/// node from the previous sweep's endpoint, keeping the best pair seen.
/// Stops after `stall_limit` consecutive sweeps without improvement.
/// Returns `None` when the graph has no present slot to seed from.
pub fn double_sweep<R: Rng>(
    graph: &LinkGraph,
    rng: &mut R,
    stall_limit: u32,
) -> Option<DiameterEstimate> {
    let mut curr = graph.sample_random_present(rng)?;
    let mut best = DiameterEstimate {
        start: curr,
        end: curr,
        distance: 0,
    };
    let mut stalls = 0;

    while stalls < stall_limit {
        let sweep = bfs_furthest(graph, curr);
        if sweep.distance > best.distance {
            best = DiameterEstimate {
                start: curr,
                end: sweep.node,
                distance: sweep.distance,
            };
            stalls = 0;
        } else {
            stalls += 1;
        }
        info!(
            from = curr,
            to = sweep.node,
            distance = sweep.distance,
            best = best.distance,
            stalls,
            "Diameter sweep"
        );
        curr = sweep.node;
    }

    Some(best)
}

/// Title-level query facade: resolves titles at entry, maps ids back to
/// titles at exit. The only layer that touches the catalog.
pub struct TraversalEngine<'a> {
    graph: &'a LinkGraph,
    catalog: &'a PageCatalog,
}

/// Shortest path between two titles. `titles` is `None` when no path
/// exists, which is an expected outcome rather than an error.
pub struct PathQuery {
    pub visited: usize,
    pub titles: Option<Vec<String>>,
}

pub struct FurthestQuery {
    pub title: String,
    pub distance: u32,
    pub visited: usize,
}

pub struct DiameterQuery {
    pub start: String,
    pub end: String,
    pub distance: u32,
}

impl<'a> TraversalEngine<'a> {
    pub fn new(graph: &'a LinkGraph, catalog: &'a PageCatalog) -> Self {
        Self { graph, catalog }
    }

    fn lookup(&self, title: &str) -> Result<PageId, QueryError> {
        self.catalog
            .id(title)
            .ok_or_else(|| QueryError::UnknownTitle(title.to_string()))
    }

    fn title_of(&self, id: PageId) -> String {
        // the graph only ever holds canonical ids, all of which the
        // catalog names
        self.catalog
            .title(id)
            .expect("graph contains an id missing from the catalog")
            .to_string()
    }

    pub fn shortest_path(&self, start: &str, end: &str) -> Result<PathQuery, QueryError> {
        let start = self.lookup(start)?;
        let end = self.lookup(end)?;
        let search = bfs_path(self.graph, start, end);
        info!(visited = search.visited, "Path search finished");
        Ok(PathQuery {
            visited: search.visited,
            titles: search
                .path
                .map(|ids| ids.into_iter().map(|id| self.title_of(id)).collect()),
        })
    }

    pub fn furthest(&self, start: &str) -> Result<FurthestQuery, QueryError> {
        let start = self.lookup(start)?;
        let sweep = bfs_furthest(self.graph, start);
        Ok(FurthestQuery {
            title: self.title_of(sweep.node),
            distance: sweep.distance,
            visited: sweep.visited,
        })
    }

    pub fn estimate_diameter(&self, stall_limit: u32) -> Result<DiameterQuery, QueryError> {
        let mut rng = rand::thread_rng();
        let estimate =
            double_sweep(self.graph, &mut rng, stall_limit).ok_or(QueryError::EmptyGraph)?;
        Ok(DiameterQuery {
            start: self.title_of(estimate.start),
            end: self.title_of(estimate.end),
            distance: estimate.distance,
        })
    }

    /// All outgoing links of a page, as titles. Order unspecified.
    pub fn links(&self, page: &str) -> Result<Vec<String>, QueryError> {
        let id = self.lookup(page)?;
        Ok(self
            .graph
            .neighbors(id)
            .map(|set| set.iter().map(|&id| self.title_of(id)).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// A -> B -> C -> D chain on ids 0..=3.
    fn chain() -> LinkGraph {
        let mut graph = LinkGraph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph
    }

    fn chain_catalog() -> PageCatalog {
        PageCatalog::from_pairs(
            ["A", "B", "C", "D"]
                .iter()
                .enumerate()
                .map(|(id, t)| (id as PageId, t.to_string())),
        )
    }

    #[test]
    fn shortest_path_along_chain() {
        let graph = chain();
        let search = bfs_path(&graph, 0, 3);
        assert_eq!(search.path, Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn shortest_path_to_self_is_single_node() {
        let graph = chain();
        let search = bfs_path(&graph, 2, 2);
        assert_eq!(search.path, Some(vec![2]));
        assert_eq!(search.visited, 1);
    }

    #[test]
    fn shortest_path_respects_direction() {
        let graph = chain();
        // edges only go forward; D cannot reach A
        assert!(bfs_path(&graph, 3, 0).path.is_none());
    }

    #[test]
    fn unreachable_target_visits_whole_component() {
        let mut graph = LinkGraph::new(5);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(4, 5);
        let search = bfs_path(&graph, 0, 5);
        assert!(search.path.is_none());
        // component of 0 is {0, 1, 2}
        assert_eq!(search.visited, 3);
    }

    #[test]
    fn shortest_path_prefers_fewer_hops() {
        let mut graph = LinkGraph::new(3);
        // long way 0 -> 1 -> 2 -> 3, shortcut 0 -> 3
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(0, 3);
        let path = bfs_path(&graph, 0, 3).path.unwrap();
        assert_eq!(path, vec![0, 3]);
    }

    #[test]
    fn furthest_on_chain() {
        let graph = chain();
        let sweep = bfs_furthest(&graph, 0);
        assert_eq!(sweep.node, 3);
        assert_eq!(sweep.distance, 3);
        assert_eq!(sweep.visited, 4);
    }

    #[test]
    fn furthest_from_dead_end_is_itself() {
        let graph = chain();
        let sweep = bfs_furthest(&graph, 3);
        assert_eq!(sweep.node, 3);
        assert_eq!(sweep.distance, 0);
    }

    #[test]
    fn furthest_ignores_unreachable_nodes() {
        let mut graph = LinkGraph::new(10);
        graph.add_edge(0, 1);
        graph.add_edge(8, 9);
        let sweep = bfs_furthest(&graph, 0);
        assert_eq!(sweep.node, 1);
        assert_eq!(sweep.distance, 1);
        assert_eq!(sweep.visited, 2);
    }

    #[test]
    fn double_sweep_on_empty_graph_is_none() {
        let graph = LinkGraph::new(100);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(double_sweep(&graph, &mut rng, 5).is_none());
    }

    #[test]
    fn double_sweep_never_exceeds_true_diameter() {
        let graph = chain();
        let mut rng = SmallRng::seed_from_u64(1);
        let estimate = double_sweep(&graph, &mut rng, 5).unwrap();
        assert!(estimate.distance <= 3);
    }

    #[test]
    fn double_sweep_finds_chain_diameter_from_any_seed() {
        // on a bidirectional chain every sweep ends at an extremity, so
        // the second sweep always spans the full chain
        let mut graph = LinkGraph::new(4);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            graph.add_edge(a, b);
            graph.add_edge(b, a);
        }
        for seed in 0..10 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let estimate = double_sweep(&graph, &mut rng, 5).unwrap();
            assert_eq!(estimate.distance, 4);
        }
    }

    #[test]
    fn engine_maps_titles_both_ways() {
        let graph = chain();
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        let query = engine.shortest_path("A", "D").unwrap();
        assert_eq!(
            query.titles,
            Some(vec!["A".into(), "B".into(), "C".into(), "D".into()])
        );
    }

    #[test]
    fn engine_reports_unknown_titles() {
        let graph = chain();
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        match engine.shortest_path("A", "Nope") {
            Err(QueryError::UnknownTitle(t)) => assert_eq!(t, "Nope"),
            other => panic!("expected UnknownTitle, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            engine.furthest("Missing"),
            Err(QueryError::UnknownTitle(_))
        ));
    }

    #[test]
    fn engine_reports_no_path_as_success() {
        let graph = chain();
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        let query = engine.shortest_path("D", "A").unwrap();
        assert!(query.titles.is_none());
    }

    #[test]
    fn engine_furthest_returns_title_and_distance() {
        let graph = chain();
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        let query = engine.furthest("A").unwrap();
        assert_eq!(query.title, "D");
        assert_eq!(query.distance, 3);
    }

    #[test]
    fn engine_diameter_on_empty_graph_is_an_error() {
        let graph = LinkGraph::new(10);
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        assert!(matches!(
            engine.estimate_diameter(5),
            Err(QueryError::EmptyGraph)
        ));
    }

    #[test]
    fn engine_links_lists_neighbors() {
        let mut graph = LinkGraph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(0, 3);
        let catalog = chain_catalog();
        let engine = TraversalEngine::new(&graph, &catalog);
        let mut links = engine.links("A").unwrap();
        links.sort();
        assert_eq!(links, vec!["B".to_string(), "D".to_string()]);
        // dead end: empty list, not an error
        assert!(engine.links("B").unwrap().is_empty());
    }
}
