//! A* search over the airway graph.
//!
//! Contract consumed by the route synthesizer: the search respects the
//! graph's current removed/penalized state, and when time-bucketed costs
//! are requested it selects each edge's cost bucket by the cumulative
//! elapsed time along the path so far (offset by the request's departure
//! hour) rather than a single scalar. The returned sequence starts at the
//! source and ends at the sink; `None` means the sink is unreachable.

use crate::graph::{AirwayGraph, EXCLUDED_COST, SECONDS_PER_HOUR};
use crate::models::NodeId;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Options for one search invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Select per-epoch cost buckets by elapsed time instead of the scalar
    /// edge cost.
    pub time_bucketed: bool,
    /// Forecast hour at which the flight departs; shifts the elapsed time
    /// used for bucket selection and removal windows.
    pub start_hour: u32,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    id: NodeId,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.g_score == other.g_score && self.f_score == other.f_score
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Find the lowest-cost path from `source` to `sink`.
///
/// A single-node sequence is returned when `source == sink`; callers that
/// require a traversable segment are expected to repair it (the route
/// synthesizer duplicates the node).
pub fn find_path(
    graph: &AirwayGraph,
    source: NodeId,
    sink: NodeId,
    opts: SearchOptions,
) -> Option<Vec<NodeId>> {
    if source >= graph.node_count() || sink >= graph.node_count() {
        return None;
    }
    if source == sink {
        return Some(vec![source]);
    }

    let start_offset_secs = opts.start_hour as f64 * SECONDS_PER_HOUR;
    let hour_of = |elapsed: f64| -> u32 {
        ((start_offset_secs + elapsed) / SECONDS_PER_HOUR).floor().max(0.0) as u32
    };
    let node_blocked = |id: NodeId, elapsed: f64| -> bool {
        if opts.time_bucketed {
            graph.is_removed_at(id, hour_of(elapsed))
        } else {
            graph.is_removed(id)
        }
    };

    if node_blocked(source, 0.0) {
        return None;
    }

    let mut open: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();

    g_score.insert(source, 0.0);
    open.push(Reverse(OpenNode {
        id: source,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(graph.heuristic(source)),
    }));

    let mut found = false;
    while let Some(Reverse(current)) = open.pop() {
        if closed.contains(&current.id) {
            continue;
        }
        let best_g = g_score.get(&current.id).copied().unwrap_or(f64::INFINITY);
        if current.g_score.0 > best_g + 1e-9 {
            continue;
        }

        if current.id == sink {
            found = true;
            break;
        }
        closed.insert(current.id);

        for &next in graph.neighbors(current.id) {
            if closed.contains(&next) {
                continue;
            }

            let step_cost = if opts.time_bucketed {
                graph.edge_cost_at(current.id, next, start_offset_secs + best_g)
            } else {
                graph.edge_cost(current.id, next)
            };
            if step_cost >= EXCLUDED_COST || !step_cost.is_finite() {
                continue;
            }

            let tentative_g = best_g + step_cost;
            if node_blocked(next, tentative_g) {
                continue;
            }

            if tentative_g < g_score.get(&next).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(next, current.id);
                g_score.insert(next, tentative_g);
                open.push(Reverse(OpenNode {
                    id: next,
                    g_score: FloatOrd(tentative_g),
                    f_score: FloatOrd(tentative_g + graph.heuristic(next)),
                }));
            }
        }
    }

    if !found {
        return None;
    }

    let mut path = vec![sink];
    let mut current = sink;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    Some(path)
}
