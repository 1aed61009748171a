//! Hazard regions and the graph reduction pass that encodes them as node
//! and edge penalties.

use crate::geometry::{union_convex_hull, Polygon};
use crate::graph::{AirwayGraph, EXCLUDED_COST};
use crate::models::{NodeId, Pirep, PirepPhenomenon};
use crate::network::NetworkData;
use crate::spatial::{distance_gc, NMI_TO_FT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity class of a hazard region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Excludes traversal entirely (SIGMET-class weather).
    Hard,
    /// Multiplies traversal cost inside the active window (AIRMET-class).
    Soft,
}

/// A closed weather polygon with a severity class and an active window in
/// forecast hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardRegion {
    pub polygon: Polygon,
    pub severity: Severity,
    pub start_hour: u32,
    pub end_hour: u32,
    pub issued_at: DateTime<Utc>,
}

impl HazardRegion {
    pub fn new(polygon: Polygon, severity: Severity, start_hour: u32, end_hour: u32) -> Self {
        Self {
            polygon,
            severity,
            start_hour,
            end_hour,
            issued_at: Utc::now(),
        }
    }
}

/// One weather scenario: a set of hazard regions that apply together.
pub type HazardScenario = Vec<HazardRegion>;

/// Tunables for hazard reduction. Defaults are operationally tuned
/// values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Cost multiplier applied by soft regions.
    pub soft_multiplier: f64,
    /// Node capture radius around a routine pilot report, nautical miles.
    pub pirep_radius_nmi: f64,
    /// Capture radius for urgent reports, nautical miles.
    pub pirep_urgent_radius_nmi: f64,
    /// Cost multipliers for pilot-report severities 1, 2 and 3.
    pub pirep_severity_multipliers: [f64; 3],
    /// Inflation applied to the union convex hull used for reroute
    /// entry/exit selection.
    pub hull_inflation: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            soft_multiplier: 2.0,
            pirep_radius_nmi: 10.0,
            pirep_urgent_radius_nmi: 20.0,
            pirep_severity_multipliers: [1.5, 2.0, 3.0],
            hull_inflation: 1.2,
        }
    }
}

/// Scale every region of a scenario about its own geometry. Factors other
/// than 1 scale the region's convex hull so concave polygons grow
/// predictably.
pub fn scale_scenario(scenario: &HazardScenario, factor: f64) -> HazardScenario {
    scenario
        .iter()
        .map(|region| {
            let polygon = if (factor - 1.0).abs() < f64::EPSILON {
                region.polygon.clone()
            } else {
                region.polygon.convex_hull().scale(factor)
            };
            HazardRegion {
                polygon,
                ..region.clone()
            }
        })
        .collect()
}

/// Scenarios scaled at every requested factor, keyed by factor bits so the
/// map iterates in ascending factor order.
pub fn scale_scenarios(
    scenarios: &[HazardScenario],
    factors: &[f64],
) -> BTreeMap<u64, Vec<HazardScenario>> {
    let mut out = BTreeMap::new();
    for &factor in factors {
        let scaled = scenarios
            .iter()
            .map(|scenario| scale_scenario(scenario, factor))
            .collect();
        out.insert(factor.to_bits(), scaled);
    }
    out
}

/// Convex hull of the union of a scenario's regions, inflated by the
/// configured factor. The reroute splicer walks the nominal path against
/// this hull to pick its detour entry point.
pub fn scenario_hull(scenario: &HazardScenario, config: &HazardConfig) -> Polygon {
    let polygons: Vec<Polygon> = scenario.iter().map(|r| r.polygon.clone()).collect();
    union_convex_hull(&polygons).scale(config.hull_inflation)
}

/// Reduce the graph for one hazard scenario.
///
/// Every node inside a region is removed with the region's severity and
/// window: hard regions exclude it outright, soft regions multiply its
/// incident edge costs. Nodes outside all regions have each incident edge
/// tested for segment/polygon intersection and penalized by the same rule,
/// guarded so repeated passes do not double-penalize. Returns the ids of
/// nodes that were inside a region.
pub fn reduce_graph(
    graph: &mut AirwayGraph,
    scenario: &HazardScenario,
    network: &NetworkData,
    config: &HazardConfig,
) -> Vec<NodeId> {
    let mut removed = Vec::new();
    if scenario.is_empty() {
        return removed;
    }

    for id in 0..graph.node_count() {
        let Some((lat, lon)) = network.position(id) else {
            continue;
        };

        for region in scenario {
            if region.polygon.contains(lon, lat) {
                match region.severity {
                    Severity::Soft => graph.remove_node(
                        id,
                        config.soft_multiplier,
                        true,
                        region.start_hour,
                        region.end_hour,
                    ),
                    Severity::Hard => graph.remove_node(
                        id,
                        EXCLUDED_COST,
                        false,
                        region.start_hour,
                        region.end_hour,
                    ),
                }
                removed.push(id);
            } else {
                let neighbors: Vec<NodeId> = graph.neighbors(id).to_vec();
                for other in neighbors {
                    let Some((olat, olon)) = network.position(other) else {
                        continue;
                    };
                    if !region.polygon.intersects_segment(lon, lat, olon, olat) {
                        continue;
                    }
                    match region.severity {
                        Severity::Soft => graph.penalize_edge(
                            id,
                            other,
                            config.soft_multiplier,
                            true,
                            region.start_hour,
                            region.end_hour,
                        ),
                        Severity::Hard => graph.penalize_edge(
                            id,
                            other,
                            EXCLUDED_COST,
                            false,
                            region.start_hour,
                            region.end_hour,
                        ),
                    }
                }
            }
        }
    }

    removed
}

/// Companion reduction pass driven by pilot weather reports.
///
/// A node within the report's capture radius (wider when the report is
/// urgent) during its active window receives a severity-dependent cost
/// multiplier; low-level wind shear excludes the node outright.
pub fn apply_pireps(
    graph: &mut AirwayGraph,
    pireps: &[Pirep],
    network: &NetworkData,
    num_forecast_hours: u32,
    config: &HazardConfig,
) {
    if pireps.is_empty() {
        return;
    }

    for id in 0..graph.node_count() {
        let Some((lat, lon)) = network.position(id) else {
            continue;
        };

        for pirep in pireps {
            let radius_nmi = if pirep.urgent {
                config.pirep_urgent_radius_nmi
            } else {
                config.pirep_radius_nmi
            };
            let dist_nmi = distance_gc(lat, lon, pirep.lat, pirep.lon, 0.0) / NMI_TO_FT;
            if dist_nmi >= radius_nmi {
                continue;
            }

            let start_hour = pirep.observed_hour;
            let end_hour = (pirep.observed_hour + pirep.valid_hours).min(num_forecast_hours);
            if start_hour >= end_hour {
                continue;
            }

            if pirep.phenomenon == PirepPhenomenon::WindShear {
                graph.remove_node(id, EXCLUDED_COST, false, start_hour, end_hour);
            } else {
                let index = (pirep.severity.clamp(1, 3) - 1) as usize;
                let multiplier = config.pirep_severity_multipliers[index];
                graph.remove_node(id, multiplier, true, start_hour, end_hour);
            }
        }
    }
}
