//! Trajectory option set generation: repeated searches with edge
//! penalization for diversity, and ground-hold reconciliation of reroutes.

use crate::cost::CostConfig;
use crate::error::PlanError;
use crate::graph::{AirwayGraph, EXCLUDED_COST, SECONDS_PER_HOUR};
use crate::models::{FlightRequest, NodeId, RoutePath};
use crate::network::NetworkData;
use crate::spatial::distance_gc;
use crate::synth::{find_lowest_cost_route, path_cost, WindModel, UNFLYABLE_COST};
use crate::wind::WindField;
use serde::{Deserialize, Serialize};

/// Strategy for excluding edges of the just-found path before re-searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TosMethod {
    /// Exclude the single interior edge with the lowest cost.
    LowestCostEdge,
    /// Exclude the interior edge with the lowest cost per foot of
    /// great-circle length.
    LowestCostPerLength,
    /// Exclude every interior edge of the path.
    EntirePath,
}

/// Tunables for option-set generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TosConfig {
    /// Number of ranked options to produce per flight.
    pub num_options: usize,
    pub method: TosMethod,
    /// Leading edges of each path exempt from exclusion, reserved for a
    /// fixed departure procedure.
    pub protected_head: usize,
    /// Trailing edges exempt from exclusion; 1 leaves only the
    /// destination link free, 2 additionally protects the final edge for
    /// a fixed arrival procedure.
    pub protected_tail: usize,
}

impl Default for TosConfig {
    fn default() -> Self {
        Self {
            num_options: 5,
            method: TosMethod::LowestCostEdge,
            protected_head: 1,
            protected_tail: 1,
        }
    }
}

/// Exclude edges of `nodes` in the working graph according to the
/// configured method, so the next search must diverge.
///
/// Scalar costs are hard-excluded; in bucketed mode only the bucket the
/// path actually used (by its cumulative cost at that edge) is excluded,
/// so the edge stays available at other departure hours.
pub fn penalize_path_edges(
    graph: &mut AirwayGraph,
    network: &NetworkData,
    flight: &FlightRequest,
    nodes: &[NodeId],
    bucketed: bool,
    config: &TosConfig,
) {
    if nodes.len() < 2 {
        return;
    }
    let head = config.protected_head;
    let tail = config.protected_tail;
    if nodes.len() <= head + tail {
        return;
    }

    let offset = flight.departure_hour as f64 * SECONDS_PER_HOUR;
    let mut elapsed = 0.0;
    let mut best: Option<(NodeId, NodeId, f64, f64)> = None;

    for idx in 0..nodes.len() - 1 {
        let (from, to) = (nodes[idx], nodes[idx + 1]);
        let step = if bucketed {
            graph.edge_cost_at(from, to, offset + elapsed)
        } else {
            graph.edge_cost(from, to)
        };
        elapsed += step;

        if idx < head || idx >= nodes.len() - tail {
            continue;
        }

        match config.method {
            TosMethod::EntirePath => {
                graph.set_edge_cost(from, to, EXCLUDED_COST);
                if bucketed {
                    exclude_bucket_at(graph, from, to, offset + elapsed);
                }
            }
            TosMethod::LowestCostEdge | TosMethod::LowestCostPerLength => {
                let mut metric = step;
                if config.method == TosMethod::LowestCostPerLength {
                    if let (Some((lat1, lon1)), Some((lat2, lon2))) =
                        (network.position(from), network.position(to))
                    {
                        let length =
                            distance_gc(lat1, lon1, lat2, lon2, flight.cruise_altitude_ft);
                        if length > 0.0 {
                            metric = step / length;
                        }
                    }
                }
                if best.map(|(_, _, m, _)| metric < m).unwrap_or(true) {
                    best = Some((from, to, metric, elapsed));
                }
            }
        }
    }

    if config.method != TosMethod::EntirePath {
        if let Some((from, to, _, at_cost)) = best {
            graph.set_edge_cost(from, to, EXCLUDED_COST);
            if bucketed {
                exclude_bucket_at(graph, from, to, offset + at_cost);
            }
        }
    }
}

fn exclude_bucket_at(graph: &mut AirwayGraph, from: NodeId, to: NodeId, elapsed: f64) {
    if let Some(edge) = graph.edge(from, to) {
        let len = edge.buckets.len();
        if len > 1 {
            let bucket = (elapsed / SECONDS_PER_HOUR).floor().max(0.0) as usize % len;
            graph.set_bucket_cost(from, to, bucket, EXCLUDED_COST);
        }
    }
}

/// Produce up to `num_options` ranked route options for one flight.
///
/// The first option is the unconstrained wind-optimal route; each later
/// option is found after excluding edges of the previous one in the
/// working graph. The working graph accumulates exclusions across
/// iterations; callers keep a pristine template copy for later cost
/// comparisons against the unconstrained optimum.
pub fn generate_option_set<W: WindField>(
    working: &mut AirwayGraph,
    network: &NetworkData,
    flight: &FlightRequest,
    wind: &WindModel<'_, W>,
    cost_config: &CostConfig,
    config: &TosConfig,
) -> Result<Vec<RoutePath>, PlanError> {
    let bucketed = wind.is_bucketed();
    let mut options = Vec::with_capacity(config.num_options);

    for iteration in 0..config.num_options {
        // costs are recomputed once; later iterations must see the
        // accumulated exclusions, not fresh costs
        let result = find_lowest_cost_route(
            working,
            network,
            flight,
            wind,
            cost_config,
            iteration == 0,
        );
        let route = match result {
            Ok(route) => route,
            Err(err) if iteration == 0 => return Err(err),
            Err(_) => break,
        };
        if route.cost >= UNFLYABLE_COST {
            break;
        }
        penalize_path_edges(working, network, flight, &route.nodes, bucketed, config);
        options.push(route);
    }

    Ok(options)
}

/// Outcome of weighing a hazard detour against delaying departure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundHoldDecision {
    pub nodes: Vec<NodeId>,
    /// Departure delay in whole hours; zero when the detour (or the
    /// undelayed nominal) is kept.
    pub ground_hold_hours: u32,
    pub cost: f64,
}

/// Reconcile a detour against the ground-hold policy.
///
/// The nominal path is costed on the hazard-reduced graph at departure
/// delays of 0, 1, ... hours up to the number of forecast buckets. The
/// detour is kept only when it is strictly cheaper than every viable
/// delayed departure; otherwise the nominal path is kept and the delay
/// recorded as a ground hold. Returns `None` when there is no detour and
/// no delay clears the hazard.
pub fn reconcile_with_ground_hold(
    reduced: &AirwayGraph,
    nominal: &[NodeId],
    detour: Option<&[NodeId]>,
    departure_hour: u32,
) -> Option<GroundHoldDecision> {
    let num_hours = nominal
        .windows(2)
        .next()
        .and_then(|pair| reduced.edge(pair[0], pair[1]))
        .map(|edge| edge.buckets.len())
        .unwrap_or(0);
    let bucketed = num_hours > 1;
    let scan_hours = num_hours.max(1) as u32;

    let nominal_cost_at =
        |delay: u32| path_cost(reduced, nominal, bucketed, departure_hour + delay);

    match detour {
        Some(detour_nodes) => {
            let detour_cost = path_cost(reduced, detour_nodes, bucketed, departure_hour);
            let undelayed = nominal_cost_at(0);
            if detour_cost < undelayed {
                // a delayed departure that beats the detour turns into a
                // ground hold; otherwise the detour stands
                for delay in 1..scan_hours {
                    let delayed = nominal_cost_at(delay);
                    if delayed < UNFLYABLE_COST && delayed < detour_cost {
                        return Some(GroundHoldDecision {
                            nodes: nominal.to_vec(),
                            ground_hold_hours: delay,
                            cost: delayed,
                        });
                    }
                }
                Some(GroundHoldDecision {
                    nodes: detour_nodes.to_vec(),
                    ground_hold_hours: 0,
                    cost: detour_cost,
                })
            } else {
                Some(GroundHoldDecision {
                    nodes: nominal.to_vec(),
                    ground_hold_hours: 0,
                    cost: undelayed,
                })
            }
        }
        None => {
            for delay in 0..scan_hours {
                let cost = nominal_cost_at(delay);
                if cost < UNFLYABLE_COST {
                    return Some(GroundHoldDecision {
                        nodes: nominal.to_vec(),
                        ground_hold_hours: delay,
                        cost,
                    });
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Airway, Fix};
    use crate::wind::UniformWind;

    /// Two parallel corridors between AP1-like endpoints:
    /// S - A1 - A2 - E (short) and S - B1 - B2 - E (longer).
    fn corridor_network() -> NetworkData {
        let mut net = NetworkData::new();
        let coords = [
            ("SRC", 0.0, 0.0),
            ("A1", 0.0, 1.0),
            ("A2", 0.0, 2.0),
            ("B1", 0.8, 1.0),
            ("B2", 0.8, 2.0),
            ("DST", 0.0, 3.0),
        ];
        for (name, lat, lon) in coords {
            net.add_fix(Fix::Waypoint {
                name: name.to_string(),
                lat,
                lon,
            });
        }
        net.add_airway(Airway {
            name: "J1".to_string(),
            fix_names: vec!["SRC".into(), "A1".into(), "A2".into(), "DST".into()],
        });
        net.add_airway(Airway {
            name: "J2".to_string(),
            fix_names: vec!["SRC".into(), "B1".into(), "B2".into(), "DST".into()],
        });
        net
    }

    #[test]
    fn first_option_is_the_single_option_optimum() {
        let net = corridor_network();
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("SRC", "DST", "TOS1");
        let cost_config = CostConfig::default();

        let mut single_graph = net.build_graph(0);
        let single = find_lowest_cost_route(
            &mut single_graph,
            &net,
            &flight,
            &model,
            &cost_config,
            true,
        )
        .unwrap();

        let mut working = net.build_graph(0);
        let options = generate_option_set(
            &mut working,
            &net,
            &flight,
            &model,
            &cost_config,
            &TosConfig::default(),
        )
        .unwrap();

        assert!(!options.is_empty());
        assert_eq!(options[0].nodes, single.nodes);
        assert!((options[0].cost - single.cost).abs() < 1e-9);
    }

    #[test]
    fn options_are_distinct_and_ranked() {
        let net = corridor_network();
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("SRC", "DST", "TOS2");

        let mut working = net.build_graph(0);
        let options = generate_option_set(
            &mut working,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            &TosConfig {
                num_options: 2,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(options.len(), 2);
        assert_ne!(options[0].nodes, options[1].nodes);
        assert!(options[0].cost <= options[1].cost);
    }

    #[test]
    fn entire_path_method_removes_all_interior_edges() {
        let net = corridor_network();
        let flight = FlightRequest::new("SRC", "DST", "TOS3");
        let mut graph = net.build_graph(0);
        let nodes = vec![
            net.resolve("SRC").unwrap(),
            net.resolve("A1").unwrap(),
            net.resolve("A2").unwrap(),
            net.resolve("DST").unwrap(),
        ];
        let config = TosConfig {
            method: TosMethod::EntirePath,
            ..Default::default()
        };
        penalize_path_edges(&mut graph, &net, &flight, &nodes, false, &config);
        // first edge is protected, interior edges are excluded
        assert!(graph.edge_cost(nodes[0], nodes[1]) < EXCLUDED_COST);
        assert!(graph.edge_cost(nodes[1], nodes[2]) >= EXCLUDED_COST);
        assert!(graph.edge_cost(nodes[2], nodes[3]) >= EXCLUDED_COST);
    }

    #[test]
    fn ground_hold_preferred_when_delay_clears_hazard() {
        // chain with buckets: the middle edge is excluded for hours [0,2)
        let mut graph = AirwayGraph::new(4);
        graph.add_edge(0, 1, 100.0, 4);
        graph.add_edge(1, 2, 100.0, 4);
        graph.add_edge(2, 3, 100.0, 4);
        graph.set_bucket_cost(1, 2, 0, EXCLUDED_COST);
        graph.set_bucket_cost(1, 2, 1, EXCLUDED_COST);

        let nominal = vec![0, 1, 2, 3];
        let decision = reconcile_with_ground_hold(&graph, &nominal, None, 0).unwrap();
        assert_eq!(decision.ground_hold_hours, 2);
        assert_eq!(decision.nodes, nominal);
        assert!((decision.cost - 300.0).abs() < 1e-9);
    }

    #[test]
    fn cheap_detour_is_kept() {
        let mut graph = AirwayGraph::new(5);
        graph.add_edge(0, 1, 100.0, 4);
        graph.add_edge(1, 2, 100.0, 4);
        graph.add_edge(2, 3, 100.0, 4);
        // detour around node 2
        graph.add_edge(1, 4, 120.0, 4);
        graph.add_edge(4, 3, 120.0, 4);
        // nominal's middle edge excluded at every hour
        for bucket in 0..4 {
            graph.set_bucket_cost(1, 2, bucket, EXCLUDED_COST);
        }
        graph.set_edge_cost(1, 2, EXCLUDED_COST);

        let nominal = vec![0, 1, 2, 3];
        let detour = vec![0, 1, 4, 3];
        let decision = reconcile_with_ground_hold(&graph, &nominal, Some(&detour), 0).unwrap();
        assert_eq!(decision.nodes, detour);
        assert_eq!(decision.ground_hold_hours, 0);
        assert!((decision.cost - 340.0).abs() < 1e-9);
    }

    #[test]
    fn delayed_nominal_beats_expensive_detour() {
        let mut graph = AirwayGraph::new(5);
        graph.add_edge(0, 1, 100.0, 4);
        graph.add_edge(1, 2, 100.0, 4);
        graph.add_edge(2, 3, 100.0, 4);
        // very long detour
        graph.add_edge(1, 4, 5_000.0, 4);
        graph.add_edge(4, 3, 5_000.0, 4);
        // nominal blocked only at hour 0
        graph.set_bucket_cost(1, 2, 0, EXCLUDED_COST);

        let nominal = vec![0, 1, 2, 3];
        let detour = vec![0, 1, 4, 3];
        let decision = reconcile_with_ground_hold(&graph, &nominal, Some(&detour), 0).unwrap();
        assert_eq!(decision.nodes, nominal);
        assert_eq!(decision.ground_hold_hours, 1);
        assert!((decision.cost - 300.0).abs() < 1e-9);
    }
}
