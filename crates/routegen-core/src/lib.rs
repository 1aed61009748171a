pub mod astar;
pub mod cost;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hazard;
pub mod models;
pub mod network;
pub mod procedures;
pub mod reroute;
pub mod spatial;
pub mod synth;
pub mod tos;
pub mod wind;

pub use astar::{find_path, SearchOptions};
pub use cost::{
    great_circle_cost, wind_optimal_cost, wind_optimal_cost_per_epoch, wind_optimal_heuristic,
    CostConfig,
};
pub use error::{CostError, PlanError};
pub use geometry::{convex_hull, union_convex_hull, Polygon};
pub use graph::{AirwayGraph, EdgeCost, RemovalWindow, EXCLUDED_COST, SECONDS_PER_HOUR};
pub use hazard::{
    apply_pireps, reduce_graph, scale_scenario, scale_scenarios, scenario_hull, HazardConfig,
    HazardRegion, HazardScenario, Severity,
};
pub use models::{
    Airport, Airway, ApproachProcedure, Fix, FlightRequest, NodeId, Pirep, PirepPhenomenon,
    RoutePath, SidProcedure, StarProcedure,
};
pub use network::NetworkData;
pub use procedures::attach_procedures;
pub use reroute::{
    entry_exit_nodes, path_intersects_scenario, splice_reroute, validate_reroute, RerouteConfig,
    RerouteMode, RerouteRejection,
};
pub use synth::{
    find_lowest_cost_route, path_cost, recompute_edge_costs, recompute_heuristics, WindModel,
    UNFLYABLE_COST,
};
pub use tos::{
    generate_option_set, penalize_path_edges, reconcile_with_ground_hold, GroundHoldDecision,
    TosConfig, TosMethod,
};
pub use wind::{max_magnitude_kt, GridWind, UniformWind, WindField, WindSample};
