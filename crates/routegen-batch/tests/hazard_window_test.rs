//! Hour-window behavior of hazard removals, end to end: the same request
//! at different departure hours sees different graphs.

use routegen_batch::{Planner, PlannerConfig, ScenarioKey};
use routegen_core::hazard::reduce_graph;
use routegen_core::synth::{find_lowest_cost_route, recompute_edge_costs};
use routegen_core::{
    Airway, CostConfig, Fix, FlightRequest, HazardConfig, HazardRegion, HazardScenario,
    NetworkData, Polygon, Severity, UniformWind, WindModel,
};

/// Diamond network: ALFA-BRVO-DLTA over the top, ALFA-CHLY-DLTA straight
/// through. The straight branch is shorter, so it wins whenever CHLY is
/// available.
fn diamond_network() -> NetworkData {
    let mut net = NetworkData::new();
    for (name, lat, lon) in [
        ("ALFA", 0.0, 0.0),
        ("BRVO", 1.0, 1.0),
        ("CHLY", 0.0, 1.0),
        ("DLTA", 0.0, 2.0),
    ] {
        net.add_fix(Fix::Waypoint {
            name: name.to_string(),
            lat,
            lon,
        });
    }
    net.add_airway(Airway {
        name: "TOP".to_string(),
        fix_names: vec!["ALFA".into(), "BRVO".into(), "DLTA".into()],
    });
    net.add_airway(Airway {
        name: "THRU".to_string(),
        fix_names: vec!["ALFA".into(), "CHLY".into(), "DLTA".into()],
    });
    net
}

/// Hard region covering only CHLY, active hours [0, 5).
fn chly_scenario() -> HazardScenario {
    vec![HazardRegion::new(
        Polygon::from_vertices(&[(0.8, -0.2), (1.2, -0.2), (1.2, 0.2), (0.8, 0.2)]),
        Severity::Hard,
        0,
        5,
    )]
}

fn names(net: &NetworkData, nodes: &[usize]) -> Vec<String> {
    nodes
        .iter()
        .map(|&id| net.name_of(id).unwrap().to_string())
        .collect()
}

#[test]
fn search_honors_removal_window_by_departure_hour() {
    let net = diamond_network();
    let epochs = vec![UniformWind::calm(); 8];
    let model = WindModel::Epochs(&epochs);
    let cost_config = CostConfig::default();

    // cost the graph for the flight first, then reduce; the reduction
    // writes exclusions only into the active hour buckets
    let mut graph = net.build_graph(epochs.len());
    let base_flight = FlightRequest::new("ALFA", "DLTA", "WIN1").with_departure_hour(2);
    recompute_edge_costs(&mut graph, &net, &base_flight, &model, &cost_config);
    reduce_graph(&mut graph, &chly_scenario(), &net, &HazardConfig::default());

    let at_hour_2 = find_lowest_cost_route(
        &mut graph,
        &net,
        &base_flight,
        &model,
        &cost_config,
        false,
    )
    .unwrap();
    assert_eq!(names(&net, &at_hour_2.nodes), vec!["ALFA", "BRVO", "DLTA"]);

    let later_flight = FlightRequest::new("ALFA", "DLTA", "WIN2").with_departure_hour(6);
    let at_hour_6 = find_lowest_cost_route(
        &mut graph,
        &net,
        &later_flight,
        &model,
        &cost_config,
        false,
    )
    .unwrap();
    assert_eq!(names(&net, &at_hour_6.nodes), vec!["ALFA", "CHLY", "DLTA"]);
}

#[test]
fn planner_reroutes_inside_window_and_reuses_nominal_outside() {
    let net = diamond_network();
    let epochs = vec![UniformWind::calm(); 8];
    let model = WindModel::Epochs(&epochs);
    let mut config = PlannerConfig::default();
    config.scale_factors = vec![1.0];
    let planner = Planner::new(&net, model, config).unwrap();

    let early = FlightRequest::new("ALFA", "DLTA", "WIN3").with_departure_hour(2);
    let late = FlightRequest::new("ALFA", "DLTA", "WIN4").with_departure_hour(6);
    let store = planner
        .plan_routes(&[early.clone(), late.clone()], &[chly_scenario()], &[])
        .unwrap();

    let key = ScenarioKey::new(0, 1.0);
    let early_route = store.get(&key, &early).unwrap();
    assert_eq!(names(&net, &early_route.nodes), vec!["ALFA", "BRVO", "DLTA"]);

    // departing after the window closes, the hazard no longer applies
    let late_route = store.get(&key, &late).unwrap();
    assert_eq!(names(&net, &late_route.nodes), vec!["ALFA", "CHLY", "DLTA"]);
}
