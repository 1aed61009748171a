//! The navigation network registry: fixes, airports, airways and published
//! procedures, addressed by a single integer id space.
//!
//! Fix ids occupy `[0, F)` and airport ids occupy `[F, F+A)`; the partition
//! is fixed once the network is built and consumers must never assume
//! airport ids start at zero. The registry is populated by an out-of-scope
//! loading stage and passed by reference to every core function; there is
//! no process-wide state.

use crate::error::PlanError;
use crate::graph::AirwayGraph;
use crate::models::{
    Airport, Airway, ApproachProcedure, Fix, NodeId, SidProcedure, StarProcedure,
};
use crate::spatial::distance_gc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved prefix used to disambiguate 3-letter commercial airport codes
/// from navaid idents sharing the same letters.
const AIRPORT_PREFIX: char = 'K';

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkData {
    fixes: Vec<Fix>,
    airports: Vec<Airport>,
    fix_ids: HashMap<String, NodeId>,
    airport_indices: HashMap<String, usize>,
    airways: Vec<Airway>,
    sids: Vec<SidProcedure>,
    stars: Vec<StarProcedure>,
    approaches: Vec<ApproachProcedure>,
}

impl NetworkData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixes; also the id of the first airport.
    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }

    pub fn node_count(&self) -> usize {
        self.fixes.len() + self.airports.len()
    }

    pub fn airways(&self) -> &[Airway] {
        &self.airways
    }

    pub fn sids(&self) -> &[SidProcedure] {
        &self.sids
    }

    pub fn stars(&self) -> &[StarProcedure] {
        &self.stars
    }

    pub fn approaches(&self) -> &[ApproachProcedure] {
        &self.approaches
    }

    /// Add a fix and return its id. Duplicate names keep the first entry.
    pub fn add_fix(&mut self, fix: Fix) -> NodeId {
        if let Some(&id) = self.fix_ids.get(fix.name()) {
            return id;
        }
        let id = self.fixes.len();
        self.fix_ids.insert(fix.name().to_string(), id);
        self.fixes.push(fix);
        id
    }

    /// Add an airport and return its public node id (`fix_count + index`).
    ///
    /// Airports must be added after all fixes so the id partition stays
    /// immutable.
    pub fn add_airport(&mut self, airport: Airport) -> NodeId {
        if let Some(&index) = self.airport_indices.get(&airport.code) {
            return self.fixes.len() + index;
        }
        let index = self.airports.len();
        self.airport_indices.insert(airport.code.clone(), index);
        self.airports.push(airport);
        self.fixes.len() + index
    }

    pub fn add_airway(&mut self, airway: Airway) {
        self.airways.push(airway);
    }

    pub fn add_sid(&mut self, sid: SidProcedure) {
        self.sids.push(sid);
    }

    pub fn add_star(&mut self, star: StarProcedure) {
        self.stars.push(star);
    }

    pub fn add_approach(&mut self, approach: ApproachProcedure) {
        self.approaches.push(approach);
    }

    pub fn fix(&self, id: NodeId) -> Option<&Fix> {
        self.fixes.get(id)
    }

    pub fn airport_by_id(&self, id: NodeId) -> Option<&Airport> {
        id.checked_sub(self.fixes.len())
            .and_then(|index| self.airports.get(index))
    }

    pub fn is_airport(&self, id: NodeId) -> bool {
        id >= self.fixes.len() && id < self.node_count()
    }

    /// Position of any node id.
    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        if id < self.fixes.len() {
            self.fixes.get(id).map(|f| (f.lat(), f.lon()))
        } else {
            self.airport_by_id(id).map(|a| (a.lat, a.lon))
        }
    }

    /// Name of any node id.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        if id < self.fixes.len() {
            self.fixes.get(id).map(Fix::name)
        } else {
            self.airport_by_id(id).map(|a| a.code.as_str())
        }
    }

    fn lookup_exact(&self, name: &str) -> Option<NodeId> {
        if let Some(&id) = self.fix_ids.get(name) {
            return Some(id);
        }
        self.airport_indices
            .get(name)
            .map(|&index| self.fixes.len() + index)
    }

    /// Resolve a fix or airport name to a node id.
    ///
    /// Tries an exact match first. Four-letter names starting with the
    /// reserved prefix are retried with the prefix stripped; three-letter
    /// names are retried against airports with the prefix added. This
    /// disambiguates navaid idents from commercial airport codes.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        if let Some(id) = self.lookup_exact(name) {
            return Some(id);
        }
        if name.len() == 4 && name.starts_with(AIRPORT_PREFIX) {
            return self.lookup_exact(&name[1..]);
        }
        if name.len() == 3 {
            let prefixed = format!("{AIRPORT_PREFIX}{name}");
            return self
                .airport_indices
                .get(&prefixed)
                .map(|&index| self.fixes.len() + index);
        }
        None
    }

    /// Resolve for a specific flight, mapping failures to the per-flight
    /// error kind.
    pub fn resolve_for(&self, name: &str, callsign: &str) -> Result<NodeId, PlanError> {
        self.resolve(name).ok_or_else(|| PlanError::UnresolvedFix {
            name: name.to_string(),
            callsign: callsign.to_string(),
        })
    }

    /// Fatal structural check: a network with no airway connectivity cannot
    /// plan anything and aborts the run before any flight is processed.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.airways.iter().all(|a| a.fix_names.len() < 2) {
            return Err(PlanError::NoConnectivity);
        }
        Ok(())
    }

    /// Id of the fix nearest to the given point, excluding airports.
    fn nearest_fix(&self, lat: f64, lon: f64) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (id, fix) in self.fixes.iter().enumerate() {
            let d = distance_gc(lat, lon, fix.lat(), fix.lon(), 0.0);
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Build the search graph from airway connectivity.
    ///
    /// Consecutive fixes of each airway become undirected edges costed by
    /// great-circle distance at the default altitude (recomputed per flight
    /// by the synthesizer). Each airport is tied into the enroute structure
    /// through its departure-procedure exit fixes and arrival-procedure
    /// entry fixes; an airport with no usable procedure falls back to the
    /// nearest fix.
    pub fn build_graph(&self, num_buckets: usize) -> AirwayGraph {
        const GRAPH_COST_ALT_FT: f64 = 30_000.0;
        let mut graph = AirwayGraph::new(self.node_count());

        let mut link = |graph: &mut AirwayGraph, a: NodeId, b: NodeId| {
            if a == b {
                return;
            }
            let (lat1, lon1) = match self.position(a) {
                Some(p) => p,
                None => return,
            };
            let (lat2, lon2) = match self.position(b) {
                Some(p) => p,
                None => return,
            };
            let cost = distance_gc(lat1, lon1, lat2, lon2, GRAPH_COST_ALT_FT);
            graph.add_edge(a, b, cost, num_buckets);
        };

        for airway in &self.airways {
            for pair in airway.fix_names.windows(2) {
                let (Some(&a), Some(&b)) =
                    (self.fix_ids.get(&pair[0]), self.fix_ids.get(&pair[1]))
                else {
                    continue;
                };
                link(&mut graph, a, b);
            }
        }

        for (index, airport) in self.airports.iter().enumerate() {
            let airport_id = self.fixes.len() + index;
            let mut connected = false;

            for sid in self.sids.iter().filter(|s| s.airport == airport.code) {
                for exit in &sid.exit_fixes {
                    if let Some(&fix_id) = self.fix_ids.get(exit) {
                        link(&mut graph, airport_id, fix_id);
                        connected = true;
                    }
                }
            }
            for star in self.stars.iter().filter(|s| s.airport == airport.code) {
                for entry in &star.entry_fixes {
                    if let Some(&fix_id) = self.fix_ids.get(entry) {
                        link(&mut graph, airport_id, fix_id);
                        connected = true;
                    }
                }
            }

            if !connected {
                if let Some(fix_id) = self.nearest_fix(airport.lat, airport.lon) {
                    link(&mut graph, airport_id, fix_id);
                }
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(name: &str, lat: f64, lon: f64) -> Fix {
        Fix::Waypoint {
            name: name.to_string(),
            lat,
            lon,
        }
    }

    fn airport(code: &str, lat: f64, lon: f64) -> Airport {
        Airport {
            code: code.to_string(),
            name: code.to_string(),
            lat,
            lon,
            elevation_ft: 0.0,
        }
    }

    fn small_network() -> NetworkData {
        let mut net = NetworkData::new();
        net.add_fix(waypoint("ALPHA", 38.0, -100.0));
        net.add_fix(waypoint("BRAVO", 38.5, -99.0));
        net.add_fix(waypoint("SFO", 37.4, -122.5)); // navaid sharing an airport's letters
        net.add_airport(airport("KSFO", 37.6188, -122.3754));
        net.add_airport(airport("KDEN", 39.8561, -104.6737));
        net.add_airway(Airway {
            name: "J80".to_string(),
            fix_names: vec!["ALPHA".to_string(), "BRAVO".to_string()],
        });
        net
    }

    #[test]
    fn airport_ids_follow_fix_partition() {
        let net = small_network();
        assert_eq!(net.fix_count(), 3);
        assert_eq!(net.resolve("KSFO"), Some(3));
        assert_eq!(net.resolve("KDEN"), Some(4));
        assert!(net.is_airport(3));
        assert!(!net.is_airport(2));
        assert_eq!(net.name_of(4), Some("KDEN"));
    }

    #[test]
    fn resolve_prefers_exact_match() {
        let net = small_network();
        // "SFO" matches the navaid exactly, not the airport
        assert_eq!(net.resolve("SFO"), Some(2));
        // "KSFO" matches the airport exactly even though stripping the
        // prefix would also hit the navaid
        assert_eq!(net.resolve("KSFO"), Some(3));
    }

    #[test]
    fn resolve_retries_with_prefix_rules() {
        let mut net = small_network();
        net.add_fix(waypoint("XTRA", 40.0, -95.0));
        // 4-letter name with prefix, no exact match: strips to "DEN"? no
        // such fix, so unresolved.
        assert_eq!(net.resolve("KXYZ"), None);
        // 3-letter airport code resolves through the prefixed airport
        assert_eq!(net.resolve("DEN"), net.resolve("KDEN"));
        assert_eq!(net.resolve("NOPE"), None);
    }

    #[test]
    fn resolve_for_reports_flight() {
        let net = small_network();
        let err = net.resolve_for("ZZZZZ", "UAL1").unwrap_err();
        assert_eq!(
            err,
            PlanError::UnresolvedFix {
                name: "ZZZZZ".to_string(),
                callsign: "UAL1".to_string()
            }
        );
    }

    #[test]
    fn validate_requires_connectivity() {
        let net = NetworkData::new();
        assert_eq!(net.validate(), Err(PlanError::NoConnectivity));
        assert!(small_network().validate().is_ok());
    }

    #[test]
    fn build_graph_links_airways_and_airports() {
        let mut net = small_network();
        net.add_sid(SidProcedure {
            name: "OFFSH9".to_string(),
            airport: "KSFO".to_string(),
            exit_fixes: vec!["ALPHA".to_string()],
        });
        let graph = net.build_graph(0);
        let alpha = net.resolve("ALPHA").unwrap();
        let bravo = net.resolve("BRAVO").unwrap();
        let ksfo = net.resolve("KSFO").unwrap();
        let kden = net.resolve("KDEN").unwrap();
        assert!(graph.has_edge(alpha, bravo));
        assert!(graph.has_edge(ksfo, alpha));
        // KDEN has no procedures; it falls back to its nearest fix
        assert!(!graph.neighbors(kden).is_empty());
    }
}
