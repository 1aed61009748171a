//! The route synthesizer: recomputes graph costs for one flight, invokes
//! the search primitive, and repairs degenerate results.

use crate::cost::{
    wind_optimal_cost, wind_optimal_cost_per_epoch, wind_optimal_heuristic, CostConfig,
};
use crate::error::PlanError;
use crate::graph::{AirwayGraph, EXCLUDED_COST, SECONDS_PER_HOUR};
use crate::models::{FlightRequest, NodeId, RoutePath};
use crate::network::NetworkData;
use crate::wind::{max_magnitude_kt, WindField};
use crate::astar::{self, SearchOptions};

/// Cost assigned to an edge whose wind-optimal cost has no real solution
/// for the current flight (cross-track wind above airspeed, or no forward
/// progress). Large enough that the edge is never selected, but below
/// [`EXCLUDED_COST`] so a later flight at a different airspeed recomputes
/// it normally.
pub const UNFLYABLE_COST: f64 = 1e90;

/// Wind input for a planning run: a single snapshot, or an ordered list of
/// per-epoch snapshots which switches every search to time-bucketed costs.
#[derive(Debug, Clone, Copy)]
pub enum WindModel<'a, W: WindField> {
    Single(&'a W),
    Epochs(&'a [W]),
}

impl<'a, W: WindField> WindModel<'a, W> {
    /// Whether searches against this model select per-epoch cost buckets.
    pub fn is_bucketed(&self) -> bool {
        matches!(self, WindModel::Epochs(epochs) if epochs.len() > 1)
    }

    pub fn num_epochs(&self) -> usize {
        match self {
            WindModel::Single(_) => 1,
            WindModel::Epochs(epochs) => epochs.len(),
        }
    }

    fn first(&self) -> Option<&'a W> {
        match self {
            WindModel::Single(w) => Some(w),
            WindModel::Epochs(epochs) => epochs.first(),
        }
    }

    /// Largest wind magnitude across the model, for the heuristic.
    pub fn max_magnitude_kt(&self) -> f64 {
        match self {
            WindModel::Single(w) => w.max_magnitude_kt(),
            WindModel::Epochs(epochs) => max_magnitude_kt(epochs),
        }
    }
}

/// Recompute every edge's scalar and per-epoch costs for the given
/// flight's airspeed and altitude.
///
/// Edges that are hard-excluded (scalar or any bucket at or above
/// [`EXCLUDED_COST`]) and edges carrying a hazard multiplier are left
/// untouched, so exclusions and penalties survive recomputation; excluded
/// edges are never revived.
pub fn recompute_edge_costs<W: WindField>(
    graph: &mut AirwayGraph,
    network: &NetworkData,
    flight: &FlightRequest,
    wind: &WindModel<'_, W>,
    config: &CostConfig,
) {
    let alt = flight.cruise_altitude_ft;
    let speed = flight.cruise_speed_kt;

    for (a, b) in graph.edge_pairs() {
        if graph.is_removed(a) || graph.is_removed(b) || graph.is_multiplied(a, b) {
            continue;
        }
        let Some(edge) = graph.edge(a, b) else {
            continue;
        };
        if edge.cost >= EXCLUDED_COST || edge.buckets.iter().any(|c| *c >= EXCLUDED_COST) {
            continue;
        }

        let (Some((lat1, lon1)), Some((lat2, lon2))) = (network.position(a), network.position(b))
        else {
            continue;
        };

        let scalar = match wind.first() {
            Some(w) => wind_optimal_cost(lat1, lon1, lat2, lon2, alt, speed, w, config)
                .unwrap_or(UNFLYABLE_COST),
            None => continue,
        };
        graph.set_edge_cost(a, b, scalar);

        if let WindModel::Epochs(epochs) = wind {
            if epochs.len() > 1 {
                let buckets = match wind_optimal_cost_per_epoch(
                    lat1, lon1, lat2, lon2, alt, speed, epochs, config,
                ) {
                    Ok(buckets) => buckets,
                    Err(_) => vec![UNFLYABLE_COST; epochs.len()],
                };
                graph.set_edge_buckets(a, b, buckets);
            }
        }
    }
}

/// Recompute every node's heuristic cost toward the flight's goal.
pub fn recompute_heuristics<W: WindField>(
    graph: &mut AirwayGraph,
    network: &NetworkData,
    flight: &FlightRequest,
    goal: NodeId,
    wind: &WindModel<'_, W>,
    config: &CostConfig,
) {
    let Some((goal_lat, goal_lon)) = network.position(goal) else {
        return;
    };
    let max_wind = wind.max_magnitude_kt();
    for id in 0..graph.node_count() {
        let Some((lat, lon)) = network.position(id) else {
            continue;
        };
        let h = wind_optimal_heuristic(
            lat,
            lon,
            goal_lat,
            goal_lon,
            flight.cruise_altitude_ft,
            flight.cruise_speed_kt,
            max_wind,
            config,
        );
        graph.set_heuristic(id, h);
    }
}

/// Re-sum a path's true cost from elapsed time zero, selecting cost
/// buckets by cumulative elapsed time when the search was bucketed.
pub fn path_cost(graph: &AirwayGraph, nodes: &[NodeId], bucketed: bool, start_hour: u32) -> f64 {
    let offset = start_hour as f64 * SECONDS_PER_HOUR;
    let mut total = 0.0;
    for pair in nodes.windows(2) {
        let step = if bucketed {
            graph.edge_cost_at(pair[0], pair[1], offset + total)
        } else {
            graph.edge_cost(pair[0], pair[1])
        };
        total += step;
    }
    total
}

/// Find the lowest-cost route for one flight.
///
/// When `recompute` is set the edge costs are rebuilt for this flight's
/// performance first; callers iterating over flights that share airspeed
/// and altitude may skip recomputation after the first search against a
/// given graph. Heuristics are always rebuilt since they depend on the
/// goal. Unresolved names and endpoints inside an excluded region abort
/// only this flight.
pub fn find_lowest_cost_route<W: WindField>(
    graph: &mut AirwayGraph,
    network: &NetworkData,
    flight: &FlightRequest,
    wind: &WindModel<'_, W>,
    config: &CostConfig,
    recompute: bool,
) -> Result<RoutePath, PlanError> {
    let source = network.resolve_for(&flight.origin, &flight.callsign)?;
    let sink = network.resolve_for(&flight.destination, &flight.callsign)?;

    let bucketed = wind.is_bucketed();
    let endpoint_blocked = |id: NodeId| {
        if bucketed {
            graph.is_removed_at(id, flight.departure_hour)
        } else {
            graph.is_removed(id)
        }
    };
    for (name, id) in [(&flight.origin, source), (&flight.destination, sink)] {
        if endpoint_blocked(id) {
            return Err(PlanError::ExcludedEndpoint {
                name: name.to_string(),
                id,
            });
        }
    }

    if recompute {
        recompute_edge_costs(graph, network, flight, wind, config);
    }
    recompute_heuristics(graph, network, flight, sink, wind, config);

    let opts = SearchOptions {
        time_bucketed: bucketed,
        start_hour: flight.departure_hour,
    };
    let mut nodes = astar::find_path(graph, source, sink, opts).ok_or_else(|| {
        PlanError::NoPath {
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
        }
    })?;

    // callers require at least one traversable segment
    if nodes.len() == 1 && source == sink {
        nodes.push(sink);
    }

    let cost = path_cost(graph, &nodes, bucketed, flight.departure_hour);
    Ok(RoutePath::new(nodes, cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Airway, Fix};
    use crate::wind::UniformWind;

    fn line_network() -> NetworkData {
        let mut net = NetworkData::new();
        for (name, lon) in [("AAA", 0.0), ("BBB", 1.0), ("CCC", 2.0)] {
            net.add_fix(Fix::Waypoint {
                name: name.to_string(),
                lat: 0.0,
                lon,
            });
        }
        net.add_airway(Airway {
            name: "J1".to_string(),
            fix_names: vec!["AAA".into(), "BBB".into(), "CCC".into()],
        });
        net
    }

    #[test]
    fn synthesizes_route_with_recomputed_costs() {
        let net = line_network();
        let mut graph = net.build_graph(0);
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("AAA", "CCC", "TEST1");
        let route = find_lowest_cost_route(
            &mut graph,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            true,
        )
        .unwrap();
        assert_eq!(route.nodes.len(), 3);
        assert!(route.cost > 0.0);
        // cost is seconds now, not the build-time distance
        assert!(route.cost < 10_000.0);
    }

    #[test]
    fn same_origin_and_destination_yields_length_two() {
        let net = line_network();
        let mut graph = net.build_graph(0);
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("BBB", "BBB", "TEST2");
        let route = find_lowest_cost_route(
            &mut graph,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            true,
        )
        .unwrap();
        let b = net.resolve("BBB").unwrap();
        assert_eq!(route.nodes, vec![b, b]);
    }

    #[test]
    fn unresolved_name_skips_flight() {
        let net = line_network();
        let mut graph = net.build_graph(0);
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("AAA", "ZZZZZ", "TEST3");
        let err = find_lowest_cost_route(
            &mut graph,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::UnresolvedFix { .. }));
    }

    #[test]
    fn excluded_endpoint_skips_flight() {
        let net = line_network();
        let mut graph = net.build_graph(0);
        let c = net.resolve("CCC").unwrap();
        graph.remove_node(c, EXCLUDED_COST, false, 0, 24);
        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("AAA", "CCC", "TEST4");
        let err = find_lowest_cost_route(
            &mut graph,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::ExcludedEndpoint { .. }));
    }

    #[test]
    fn excluded_edge_survives_recompute() {
        let net = line_network();
        let mut graph = net.build_graph(0);
        let a = net.resolve("AAA").unwrap();
        let b = net.resolve("BBB").unwrap();
        graph.set_edge_cost(a, b, EXCLUDED_COST);

        let wind = UniformWind::calm();
        let model = WindModel::Single(&wind);
        let flight = FlightRequest::new("AAA", "CCC", "TEST5");
        let result = find_lowest_cost_route(
            &mut graph,
            &net,
            &flight,
            &model,
            &CostConfig::default(),
            true,
        );
        // the only route crosses the excluded edge, so there is no path,
        // and the exclusion was not revived by recomputation
        assert!(matches!(result, Err(PlanError::NoPath { .. })));
        assert!(graph.edge_cost(a, b) >= EXCLUDED_COST);
    }

    #[test]
    fn path_cost_uses_buckets_cumulatively() {
        let mut graph = AirwayGraph::new(3);
        graph.add_edge(0, 1, 3_700.0, 4);
        graph.add_edge(1, 2, 100.0, 4);
        graph.set_bucket_cost(1, 2, 1, 500.0);
        let cost = path_cost(&graph, &[0, 1, 2], true, 0);
        assert!((cost - 4_200.0).abs() < 1e-9);
        // scalar mode ignores the buckets
        let scalar = path_cost(&graph, &[0, 1, 2], false, 0);
        assert!((scalar - 3_800.0).abs() < 1e-9);
    }
}
