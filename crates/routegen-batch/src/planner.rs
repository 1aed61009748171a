//! Batch orchestration: drive fleets of flights through the route
//! generator, per weather scenario and polygon scale.
//!
//! Flights fan out across worker threads, but the full per-flight
//! critical section (cost recomputation, search, result insertion) runs
//! behind a single lock over the shared graph; result stores are
//! concurrent maps, so inserts need no extra synchronization. Scenario
//! passes give each flight a private reduced copy of the costed template
//! graph, which keeps cost tables consistent without sharing mutable
//! state between flights.

use crate::config::PlannerConfig;
use crate::store::{OptionSetStore, ResultStore, ScenarioKey};
use routegen_core::hazard::{reduce_graph, scale_scenarios, scenario_hull};
use routegen_core::reroute::{
    entry_exit_nodes, path_intersects_scenario, splice_reroute, validate_reroute,
};
use routegen_core::synth::{find_lowest_cost_route, path_cost, recompute_edge_costs};
use routegen_core::tos::{generate_option_set, penalize_path_edges, reconcile_with_ground_hold};
use routegen_core::{
    apply_pireps, attach_procedures, AirwayGraph, FlightRequest, HazardScenario, NetworkData,
    Pirep, PlanError, RoutePath, WindField, WindModel,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use tracing::{debug, info, warn};

/// A graph plus the performance stamp its costs were last computed for,
/// so consecutive flights with the same airspeed and altitude skip the
/// recomputation.
struct CostedGraph {
    graph: AirwayGraph,
    costed_for: Option<(u64, u64)>,
}

impl CostedGraph {
    fn new(graph: AirwayGraph) -> Self {
        Self {
            graph,
            costed_for: None,
        }
    }

    fn ensure_costs<W: WindField>(
        &mut self,
        network: &NetworkData,
        flight: &FlightRequest,
        wind: &WindModel<'_, W>,
        config: &PlannerConfig,
    ) {
        let stamp = (
            flight.cruise_speed_kt.to_bits(),
            flight.cruise_altitude_ft.to_bits(),
        );
        if self.costed_for != Some(stamp) {
            recompute_edge_costs(&mut self.graph, network, flight, wind, &config.cost);
            self.costed_for = Some(stamp);
        }
    }
}

/// Weather-aware batch planner over one navigation network and wind model.
pub struct Planner<'a, W: WindField + Sync> {
    network: &'a NetworkData,
    wind: WindModel<'a, W>,
    config: PlannerConfig,
}

impl<'a, W: WindField + Sync> Planner<'a, W> {
    /// Build a planner. Fails fast when the network has no airway
    /// connectivity; nothing is planned in that case.
    pub fn new(
        network: &'a NetworkData,
        wind: WindModel<'a, W>,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        network.validate()?;
        Ok(Self {
            network,
            wind,
            config,
        })
    }

    fn num_buckets(&self) -> usize {
        if self.wind.is_bucketed() {
            self.wind.num_epochs()
        } else {
            0
        }
    }

    fn base_graph(&self, pireps: &[Pirep]) -> AirwayGraph {
        let mut graph = self.network.build_graph(self.num_buckets());
        if !pireps.is_empty() {
            apply_pireps(
                &mut graph,
                pireps,
                self.network,
                self.num_buckets().max(24) as u32,
                &self.config.hazard,
            );
        }
        graph
    }

    /// Plan one route per flight: the nominal wind-optimal route, then a
    /// spliced reroute (or verbatim nominal) per scenario and scale.
    pub fn plan_routes(
        &self,
        flights: &[FlightRequest],
        scenarios: &[HazardScenario],
        pireps: &[Pirep],
    ) -> Result<ResultStore, PlanError> {
        let store = ResultStore::new();
        let shared = Mutex::new(CostedGraph::new(self.base_graph(pireps)));

        let nominal = self.nominal_pass(&shared, flights, &store);
        info!(
            flights = flights.len(),
            planned = nominal.len(),
            "nominal pass complete"
        );

        let mut template = match shared.into_inner() {
            Ok(graph) => graph,
            Err(poisoned) => poisoned.into_inner(),
        };

        if scenarios.is_empty() || self.config.scale_factors.is_empty() {
            return Ok(store);
        }

        for (scale_bits, scaled_list) in scale_scenarios(scenarios, &self.config.scale_factors) {
            let scale = f64::from_bits(scale_bits);
            for (scenario_index, scaled_scenario) in scaled_list.iter().enumerate() {
                let key = ScenarioKey::new(scenario_index as i32, scale);
                let unscaled = &scenarios[scenario_index];
                let hull = scenario_hull(scaled_scenario, &self.config.hazard);

                for (flight, nominal_path) in &nominal {
                    self.plan_scenario_route(
                        &mut template,
                        key,
                        scaled_scenario,
                        unscaled,
                        &hull,
                        flight,
                        nominal_path,
                        &store,
                    );
                }
            }
        }

        Ok(store)
    }

    /// Run the nominal searches across worker threads, serializing each
    /// flight's critical section behind the shared graph lock.
    fn nominal_pass(
        &self,
        shared: &Mutex<CostedGraph>,
        flights: &[FlightRequest],
        store: &ResultStore,
    ) -> HashMap<FlightRequest, RoutePath> {
        let results: Mutex<HashMap<FlightRequest, RoutePath>> = Mutex::new(HashMap::new());
        let chunk_size = flights.len().div_ceil(self.config.num_workers.max(1)).max(1);

        thread::scope(|scope| {
            for chunk in flights.chunks(chunk_size) {
                let results = &results;
                scope.spawn(move || {
                    for flight in chunk {
                        let route = {
                            let mut costed = match shared.lock() {
                                Ok(guard) => guard,
                                Err(poisoned) => poisoned.into_inner(),
                            };
                            costed.ensure_costs(self.network, flight, &self.wind, &self.config);
                            find_lowest_cost_route(
                                &mut costed.graph,
                                self.network,
                                flight,
                                &self.wind,
                                &self.config.cost,
                                false,
                            )
                        };
                        match route {
                            Ok(mut path) => {
                                attach_procedures(&mut path, self.network);
                                store.insert(ScenarioKey::NOMINAL, flight.clone(), path.clone());
                                if let Ok(mut map) = results.lock() {
                                    map.insert(flight.clone(), path);
                                }
                            }
                            Err(err) => {
                                warn!(callsign = %flight.callsign, %err, "skipping flight");
                            }
                        }
                    }
                });
            }
        });

        match results.into_inner() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Plan one flight's entry for one `(scenario, scale)` key.
    #[allow(clippy::too_many_arguments)]
    fn plan_scenario_route(
        &self,
        template: &mut CostedGraph,
        key: ScenarioKey,
        scaled_scenario: &HazardScenario,
        unscaled: &HazardScenario,
        hull: &routegen_core::Polygon,
        flight: &FlightRequest,
        nominal: &RoutePath,
        store: &ResultStore,
    ) {
        template.ensure_costs(self.network, flight, &self.wind, &self.config);
        let mut reduced = template.graph.clone();
        reduce_graph(&mut reduced, scaled_scenario, self.network, &self.config.hazard);

        let bucketed = self.wind.is_bucketed();
        let hour = flight.departure_hour;

        // a nominal route clear of the issued regions is reused verbatim
        if !path_intersects_scenario(&nominal.nodes, unscaled, self.network, Some(&reduced), hour)
        {
            store.insert(key, flight.clone(), nominal.clone());
            return;
        }

        let Some(destination) = nominal.last() else {
            return;
        };
        let Some((entry, exit)) =
            entry_exit_nodes(&nominal.nodes, hull, self.network, &self.config.reroute)
        else {
            return;
        };
        let (Some(entry_name), Some(exit_name)) =
            (self.network.name_of(entry), self.network.name_of(exit))
        else {
            return;
        };

        let detour_request = FlightRequest {
            origin: entry_name.to_string(),
            destination: exit_name.to_string(),
            ..flight.clone()
        };

        let detour = match find_lowest_cost_route(
            &mut reduced,
            self.network,
            &detour_request,
            &self.wind,
            &self.config.cost,
            false,
        ) {
            Ok(detour) => detour,
            Err(err) => {
                warn!(
                    scenario = key.scenario,
                    scale = key.scale,
                    callsign = %flight.callsign,
                    %err,
                    "no reroute found, omitting result"
                );
                return;
            }
        };

        let spliced = splice_reroute(
            &nominal.nodes,
            &detour.nodes,
            self.network,
            &self.config.reroute,
        );
        match validate_reroute(&spliced, destination, unscaled, self.network, Some(&reduced), hour)
        {
            Ok(()) => {
                let cost = path_cost(&reduced, &spliced, bucketed, hour);
                let mut path = RoutePath::new(spliced, cost);
                attach_procedures(&mut path, self.network);
                store.insert(key, flight.clone(), path);
            }
            Err(rejection) => {
                warn!(
                    scenario = key.scenario,
                    scale = key.scale,
                    callsign = %flight.callsign,
                    ?rejection,
                    "reroute rejected, omitting result"
                );
            }
        }
    }

    /// Plan a ranked trajectory option set per flight: nominal options
    /// first, then per-scenario reroutes reconciled against the ground
    /// hold policy.
    pub fn plan_option_sets(
        &self,
        flights: &[FlightRequest],
        scenarios: &[HazardScenario],
        pireps: &[Pirep],
    ) -> Result<OptionSetStore, PlanError> {
        let store = OptionSetStore::new();
        let shared = Mutex::new(CostedGraph::new(self.base_graph(pireps)));

        let nominal = self.nominal_tos_pass(&shared, flights, &store);

        let mut template = match shared.into_inner() {
            Ok(graph) => graph,
            Err(poisoned) => poisoned.into_inner(),
        };

        if scenarios.is_empty() || self.config.scale_factors.is_empty() {
            return Ok(store);
        }

        for (scale_bits, scaled_list) in scale_scenarios(scenarios, &self.config.scale_factors) {
            let scale = f64::from_bits(scale_bits);
            for (scenario_index, scaled_scenario) in scaled_list.iter().enumerate() {
                let key = ScenarioKey::new(scenario_index as i32, scale);
                let unscaled = &scenarios[scenario_index];
                let hull = scenario_hull(scaled_scenario, &self.config.hazard);

                for (flight, options) in &nominal {
                    self.plan_scenario_options(
                        &mut template,
                        key,
                        scaled_scenario,
                        unscaled,
                        &hull,
                        flight,
                        options,
                        &store,
                    );
                }
            }
        }

        Ok(store)
    }

    /// Generate the nominal option set for every flight. Each flight
    /// takes a private working copy of the costed graph so accumulated
    /// exclusions never leak between flights.
    fn nominal_tos_pass(
        &self,
        shared: &Mutex<CostedGraph>,
        flights: &[FlightRequest],
        store: &OptionSetStore,
    ) -> HashMap<FlightRequest, Vec<RoutePath>> {
        let results: Mutex<HashMap<FlightRequest, Vec<RoutePath>>> = Mutex::new(HashMap::new());
        let chunk_size = flights.len().div_ceil(self.config.num_workers.max(1)).max(1);

        thread::scope(|scope| {
            for chunk in flights.chunks(chunk_size) {
                let results = &results;
                scope.spawn(move || {
                    for flight in chunk {
                        let generated = {
                            let mut costed = match shared.lock() {
                                Ok(guard) => guard,
                                Err(poisoned) => poisoned.into_inner(),
                            };
                            costed.ensure_costs(self.network, flight, &self.wind, &self.config);
                            let mut working = costed.graph.clone();
                            generate_option_set(
                                &mut working,
                                self.network,
                                flight,
                                &self.wind,
                                &self.config.cost,
                                &self.config.tos,
                            )
                        };
                        match generated {
                            Ok(options) => {
                                debug!(
                                    callsign = %flight.callsign,
                                    options = options.len(),
                                    "nominal option set"
                                );
                                let mut attached = Vec::with_capacity(options.len());
                                for mut option in options {
                                    attach_procedures(&mut option, self.network);
                                    store.push(
                                        ScenarioKey::NOMINAL,
                                        flight.clone(),
                                        option.clone(),
                                    );
                                    attached.push(option);
                                }
                                if let Ok(mut map) = results.lock() {
                                    map.insert(flight.clone(), attached);
                                }
                            }
                            Err(err) => {
                                warn!(callsign = %flight.callsign, %err, "skipping flight");
                            }
                        }
                    }
                });
            }
        });

        match results.into_inner() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Plan one flight's ranked options for one `(scenario, scale)` key.
    /// The reduced graph persists across the flight's options and
    /// accumulates exclusions so stored options stay distinct.
    #[allow(clippy::too_many_arguments)]
    fn plan_scenario_options(
        &self,
        template: &mut CostedGraph,
        key: ScenarioKey,
        scaled_scenario: &HazardScenario,
        unscaled: &HazardScenario,
        hull: &routegen_core::Polygon,
        flight: &FlightRequest,
        options: &[RoutePath],
        store: &OptionSetStore,
    ) {
        template.ensure_costs(self.network, flight, &self.wind, &self.config);
        let mut reduced = template.graph.clone();
        reduce_graph(&mut reduced, scaled_scenario, self.network, &self.config.hazard);

        let bucketed = self.wind.is_bucketed();
        let hour = flight.departure_hour;

        for option in options {
            let stored = if !path_intersects_scenario(
                &option.nodes,
                unscaled,
                self.network,
                Some(&reduced),
                hour,
            ) {
                Some(option.clone())
            } else {
                self.reroute_option(&mut reduced, key, unscaled, hull, flight, option)
            };

            let Some(path) = stored else {
                continue;
            };
            penalize_path_edges(
                &mut reduced,
                self.network,
                flight,
                &path.nodes,
                bucketed,
                &self.config.tos,
            );
            store.push(key, flight.clone(), path);
        }
    }

    /// Reroute one nominal option around the scenario and reconcile the
    /// detour against the ground-hold policy. Returns `None` when the
    /// result must be omitted.
    fn reroute_option(
        &self,
        reduced: &mut AirwayGraph,
        key: ScenarioKey,
        unscaled: &HazardScenario,
        hull: &routegen_core::Polygon,
        flight: &FlightRequest,
        option: &RoutePath,
    ) -> Option<RoutePath> {
        let destination = option.last()?;
        let hour = flight.departure_hour;

        let spliced = self
            .detour_for(reduced, hull, flight, option)
            .map(|detour| {
                splice_reroute(&option.nodes, &detour.nodes, self.network, &self.config.reroute)
            });

        let decision =
            reconcile_with_ground_hold(reduced, &option.nodes, spliced.as_deref(), hour);
        let Some(decision) = decision else {
            warn!(
                scenario = key.scenario,
                scale = key.scale,
                callsign = %flight.callsign,
                "no detour and no viable ground hold, omitting result"
            );
            return None;
        };

        let kept_nominal = decision.nodes == option.nodes;
        if !kept_nominal {
            if let Err(rejection) = validate_reroute(
                &decision.nodes,
                destination,
                unscaled,
                self.network,
                Some(&*reduced),
                hour,
            ) {
                let actual = decision.nodes.last().copied();
                warn!(
                    scenario = key.scenario,
                    scale = key.scale,
                    callsign = %flight.callsign,
                    expected = destination,
                    ?actual,
                    ?rejection,
                    "reroute rejected, omitting result"
                );
                return None;
            }
        }

        let mut path = RoutePath::new(decision.nodes, decision.cost);
        if decision.ground_hold_hours > 0 {
            path.ground_hold_hours = Some(decision.ground_hold_hours);
        }
        attach_procedures(&mut path, self.network);
        Some(path)
    }

    /// Search the reduced graph for a detour between the option's hull
    /// entry and its destination.
    fn detour_for(
        &self,
        reduced: &mut AirwayGraph,
        hull: &routegen_core::Polygon,
        flight: &FlightRequest,
        option: &RoutePath,
    ) -> Option<RoutePath> {
        let (entry, exit) =
            entry_exit_nodes(&option.nodes, hull, self.network, &self.config.reroute)?;
        let entry_name = self.network.name_of(entry)?;
        let exit_name = self.network.name_of(exit)?;
        let detour_request = FlightRequest {
            origin: entry_name.to_string(),
            destination: exit_name.to_string(),
            ..flight.clone()
        };
        find_lowest_cost_route(
            reduced,
            self.network,
            &detour_request,
            &self.wind,
            &self.config.cost,
            false,
        )
        .ok()
    }
}
