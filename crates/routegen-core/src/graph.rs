//! The airway search graph: undirected connectivity with per-edge scalar
//! and per-epoch costs, hazard removal state, and heuristic storage.

use crate::models::NodeId;
use std::collections::HashMap;

/// Cost at or above which an edge is considered excluded from search.
/// Hard hazard removals assign this; the per-flight cost recomputation
/// never revives an edge at or above it.
pub const EXCLUDED_COST: f64 = 1e100;

pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Active window of a node removal, in forecast hours `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Hard removals exclude the node outright inside the window; soft
    /// removals only scale edge costs and leave the node searchable.
    pub hard: bool,
}

impl RemovalWindow {
    pub fn covers(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Cost state of one directed edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeCost {
    /// Scalar cost in seconds.
    pub cost: f64,
    /// Per-forecast-epoch costs. Length <= 1 means scalar-only.
    pub buckets: Vec<f64>,
    /// Set once a hazard multiplier has been applied, so repeated
    /// reduction passes do not compound the penalty.
    pub multiplied: bool,
}

/// Undirected search graph over fix and airport node ids.
///
/// Edges are stored as both ordered pairs so neighbor expansion is a plain
/// lookup; cost mutations through [`AirwayGraph::remove_node`] and the
/// setters keep the two directions in step.
#[derive(Debug, Clone, Default)]
pub struct AirwayGraph {
    neighbors: Vec<Vec<NodeId>>,
    edges: HashMap<(NodeId, NodeId), EdgeCost>,
    heuristics: Vec<f64>,
    removals: Vec<Option<RemovalWindow>>,
}

impl AirwayGraph {
    pub fn new(node_count: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); node_count],
            edges: HashMap::new(),
            heuristics: vec![0.0; node_count],
            removals: vec![None; node_count],
        }
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }

    /// Add an undirected edge with the given base cost. `num_buckets > 1`
    /// allocates a per-epoch cost vector initialized to the base cost.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, cost: f64, num_buckets: usize) {
        if a == b || a >= self.node_count() || b >= self.node_count() {
            return;
        }
        if self.edges.contains_key(&(a, b)) {
            return;
        }
        let buckets = if num_buckets > 1 {
            vec![cost; num_buckets]
        } else {
            Vec::new()
        };
        let edge = EdgeCost {
            cost,
            buckets,
            multiplied: false,
        };
        self.edges.insert((a, b), edge.clone());
        self.edges.insert((b, a), edge);
        self.neighbors[a].push(b);
        self.neighbors[b].push(a);
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.contains_key(&(a, b))
    }

    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&EdgeCost> {
        self.edges.get(&(a, b))
    }

    /// Scalar cost of the edge, or [`EXCLUDED_COST`] if absent.
    pub fn edge_cost(&self, a: NodeId, b: NodeId) -> f64 {
        self.edges.get(&(a, b)).map(|e| e.cost).unwrap_or(EXCLUDED_COST)
    }

    /// Cost of the edge at the given elapsed time along the path. Selects
    /// the bucket `floor(elapsed / 3600) mod buckets`, wrapping so long
    /// flights cycle through the available forecasts; falls back to the
    /// scalar cost when no bucket vector is present.
    pub fn edge_cost_at(&self, a: NodeId, b: NodeId, elapsed_secs: f64) -> f64 {
        match self.edges.get(&(a, b)) {
            Some(edge) if edge.buckets.len() > 1 => {
                let idx = (elapsed_secs / SECONDS_PER_HOUR).floor().max(0.0) as usize
                    % edge.buckets.len();
                edge.buckets[idx]
            }
            Some(edge) => edge.cost,
            None => EXCLUDED_COST,
        }
    }

    /// All ordered edge pairs `(a, b)` with `a < b`, one per undirected edge.
    pub fn edge_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.edges.keys().filter(|(a, b)| a < b).copied().collect()
    }

    /// Set the scalar cost of both directions of an edge.
    pub fn set_edge_cost(&mut self, a: NodeId, b: NodeId, cost: f64) {
        for key in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(&key) {
                edge.cost = cost;
            }
        }
    }

    /// Replace the bucket vector of both directions of an edge.
    pub fn set_edge_buckets(&mut self, a: NodeId, b: NodeId, buckets: Vec<f64>) {
        for key in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(&key) {
                edge.buckets = buckets.clone();
            }
        }
    }

    /// Assign `cost` to a single bucket of both directions of an edge.
    pub fn set_bucket_cost(&mut self, a: NodeId, b: NodeId, bucket: usize, cost: f64) {
        for key in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(&key) {
                if bucket < edge.buckets.len() {
                    edge.buckets[bucket] = cost;
                }
            }
        }
    }

    pub fn is_multiplied(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.get(&(a, b)).map(|e| e.multiplied).unwrap_or(false)
    }

    pub fn set_multiplied(&mut self, a: NodeId, b: NodeId, value: bool) {
        for key in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(&key) {
                edge.multiplied = value;
            }
        }
    }

    /// Penalize one edge: hard penalties assign `max(current, cost)`,
    /// multipliers scale the current cost. Bucket costs are touched only
    /// inside the `[start_hour, end_hour)` window. Multiplier penalties are
    /// guarded by the per-edge flag so a second reduction pass with the
    /// same hazard set leaves the graph unchanged.
    pub fn penalize_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        cost: f64,
        is_multiplier: bool,
        start_hour: u32,
        end_hour: u32,
    ) {
        if is_multiplier && self.is_multiplied(a, b) {
            return;
        }
        for key in [(a, b), (b, a)] {
            let Some(edge) = self.edges.get_mut(&key) else {
                continue;
            };
            let assigned = if is_multiplier { cost * edge.cost } else { cost };
            edge.cost = edge.cost.max(assigned);

            let len = edge.buckets.len();
            if len > 1 {
                let start = (start_hour as usize).min(len);
                let end = (end_hour as usize).min(len);
                if start < end {
                    for bucket in edge.buckets[start..end].iter_mut() {
                        if is_multiplier {
                            *bucket *= cost;
                        } else {
                            *bucket = cost;
                        }
                    }
                }
            }
            if is_multiplier {
                edge.multiplied = true;
            }
        }
    }

    /// Remove a node from the search space for the given hour window.
    ///
    /// The node is not deleted; every incident edge is penalized with the
    /// hard-or-multiplier rule of [`AirwayGraph::penalize_edge`]. A cost at
    /// or above [`EXCLUDED_COST`] with `is_multiplier == false` additionally
    /// marks the node hard-removed, which bucketed searches honor only
    /// inside the window and scalar searches honor unconditionally.
    pub fn remove_node(
        &mut self,
        id: NodeId,
        cost: f64,
        is_multiplier: bool,
        start_hour: u32,
        end_hour: u32,
    ) {
        if id >= self.node_count() {
            return;
        }
        if self.removals[id].is_some() {
            return;
        }

        let neighbors = self.neighbors[id].clone();
        for other in neighbors {
            self.penalize_edge(id, other, cost, is_multiplier, start_hour, end_hour);
        }

        if !is_multiplier && cost >= EXCLUDED_COST {
            self.removals[id] = Some(RemovalWindow {
                start_hour,
                end_hour,
                hard: true,
            });
        }
    }

    /// Whether the node carries a hard removal, regardless of hour.
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.removals.get(id).map(|r| r.is_some()).unwrap_or(false)
    }

    /// Whether the node is hard-removed at the given forecast hour.
    pub fn is_removed_at(&self, id: NodeId, hour: u32) -> bool {
        match self.removals.get(id) {
            Some(Some(window)) => window.hard && window.covers(hour),
            _ => false,
        }
    }

    pub fn removal(&self, id: NodeId) -> Option<RemovalWindow> {
        self.removals.get(id).copied().flatten()
    }

    pub fn heuristic(&self, id: NodeId) -> f64 {
        self.heuristics.get(id).copied().unwrap_or(0.0)
    }

    pub fn set_heuristic(&mut self, id: NodeId, cost: f64) {
        if let Some(slot) = self.heuristics.get_mut(id) {
            *slot = cost;
        }
    }

    /// Largest scalar edge cost below the exclusion threshold.
    pub fn max_finite_edge_cost(&self) -> f64 {
        self.edges
            .values()
            .map(|e| e.cost)
            .filter(|c| *c < EXCLUDED_COST)
            .fold(0.0, f64::max)
    }
}
