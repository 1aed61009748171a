//! Reroute splicing: detect hazard-affected nominal routes, route a detour
//! around the hazard, and stitch it back into the nominal path.

use crate::geometry::Polygon;
use crate::graph::{AirwayGraph, SECONDS_PER_HOUR};
use crate::hazard::{HazardScenario, Severity};
use crate::models::NodeId;
use crate::network::NetworkData;
use crate::spatial::{heading_gc, turn_angle_deg};
use serde::{Deserialize, Serialize};

/// How the detour endpoints are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerouteMode {
    /// Recompute from the original origin: entry is the path's first node.
    Replan,
    /// Patch only the affected portion: entry is the last node still
    /// outside the hazard hull.
    Reroute,
}

/// Tunables for reroute splicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteConfig {
    pub mode: RerouteMode,
    /// Turning angle above which a spliced segment counts as backtracking
    /// and its node is dropped, in degrees.
    pub backtrack_threshold_deg: f64,
    /// Leading nodes of the nominal path exempt from entry selection,
    /// reserved for a fixed departure procedure.
    pub protected_prefix: usize,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            mode: RerouteMode::Replan,
            backtrack_threshold_deg: 90.0,
            protected_prefix: 0,
        }
    }
}

/// Why a spliced reroute was rejected. Rejected results are omitted from
/// the result store; no partial path is substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RerouteRejection {
    /// The spliced path does not end at the requested destination, which
    /// happens when the search terminated at the hazard entry point.
    WrongTerminal { expected: NodeId, actual: NodeId },
    /// The spliced path still intersects the scenario's regions.
    IntersectsHazard,
}

/// Test whether a path intersects any region of a scenario.
///
/// Soft (advisory-class) regions do not trigger reroutes and are skipped.
/// When a graph is supplied, cost is accumulated along the path and a
/// region only counts while the path's elapsed hour falls inside the
/// region's active window.
pub fn path_intersects_scenario(
    nodes: &[NodeId],
    scenario: &HazardScenario,
    network: &NetworkData,
    graph: Option<&AirwayGraph>,
    start_hour: u32,
) -> bool {
    let mut elapsed = start_hour as f64 * SECONDS_PER_HOUR;
    for pair in nodes.windows(2) {
        let (Some((lat1, lon1)), Some((lat2, lon2))) =
            (network.position(pair[0]), network.position(pair[1]))
        else {
            continue;
        };
        if let Some(graph) = graph {
            elapsed += graph.edge_cost_at(pair[0], pair[1], elapsed);
        }

        for region in scenario {
            if region.severity == Severity::Soft {
                continue;
            }
            if graph.is_some() {
                let hour = elapsed / SECONDS_PER_HOUR;
                if (region.start_hour as f64) > hour || (region.end_hour as f64) < hour {
                    continue;
                }
            }
            if region.polygon.contains(lon1, lat1)
                || region.polygon.contains(lon2, lat2)
                || region.polygon.intersects_segment(lon1, lat1, lon2, lat2)
            {
                return true;
            }
        }
    }
    false
}

/// Choose the detour entry and exit nodes for a nominal path.
///
/// Replan mode keeps the path's own endpoints. Reroute mode walks the
/// path from the start (past any protected prefix) and returns the last
/// node before the path enters the hull; the exit is always the original
/// destination.
pub fn entry_exit_nodes(
    nominal: &[NodeId],
    hull: &Polygon,
    network: &NetworkData,
    config: &RerouteConfig,
) -> Option<(NodeId, NodeId)> {
    let first = *nominal.first()?;
    let exit = *nominal.last()?;

    if config.mode == RerouteMode::Replan {
        return Some((first, exit));
    }

    let offset = config.protected_prefix.min(nominal.len() - 1);
    let mut entry = nominal[offset];
    for &id in &nominal[offset..] {
        let Some((lat, lon)) = network.position(id) else {
            continue;
        };
        if hull.contains(lon, lat) {
            break;
        }
        entry = id;
    }
    Some((entry, exit))
}

/// Splice a detour back into its nominal path.
///
/// The nominal path's prefix up to (not including) the detour's entry
/// node is prepended, then backtracking at the seam is cleaned: starting
/// from the heading into the entry node, nodes whose turn angle exceeds
/// the configured threshold are dropped until the first segment that does
/// not backtrack.
pub fn splice_reroute(
    nominal: &[NodeId],
    detour: &[NodeId],
    network: &NetworkData,
    config: &RerouteConfig,
) -> Vec<NodeId> {
    let Some(&entry) = detour.first() else {
        return Vec::new();
    };

    let mut spliced: Vec<NodeId> = Vec::new();
    if let Some(pos) = nominal.iter().position(|&id| id == entry) {
        spliced.extend_from_slice(&nominal[..pos]);
    }
    let entry_index = spliced.len();
    spliced.extend_from_slice(detour);

    if entry_index == 0 {
        return spliced;
    }

    let prev = spliced[entry_index - 1];
    let (Some((plat, plon)), Some((elat, elon))) =
        (network.position(prev), network.position(entry))
    else {
        return spliced;
    };
    let theta0 = heading_gc(plat, plon, elat, elon);

    // drop nodes immediately after the entry while the turn away from the
    // inbound heading exceeds the threshold; keep from the first segment
    // that does not backtrack
    let mut drop_until = entry_index + 1;
    for index in (entry_index + 1)..spliced.len() {
        let Some((nlat, nlon)) = network.position(spliced[index]) else {
            break;
        };
        let theta1 = heading_gc(elat, elon, nlat, nlon);
        if turn_angle_deg(theta0, theta1).abs() > config.backtrack_threshold_deg {
            drop_until = index + 1;
        } else {
            break;
        }
    }
    if drop_until > entry_index + 1 {
        spliced.drain(entry_index + 1..drop_until);
    }

    spliced
}

/// Validate a spliced path: it must terminate at the requested
/// destination and must not intersect the scenario's regions.
pub fn validate_reroute(
    spliced: &[NodeId],
    destination: NodeId,
    scenario: &HazardScenario,
    network: &NetworkData,
    graph: Option<&AirwayGraph>,
    start_hour: u32,
) -> Result<(), RerouteRejection> {
    let actual = spliced.last().copied().unwrap_or(usize::MAX);
    if actual != destination {
        return Err(RerouteRejection::WrongTerminal {
            expected: destination,
            actual,
        });
    }
    if path_intersects_scenario(spliced, scenario, network, graph, start_hour) {
        return Err(RerouteRejection::IntersectsHazard);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::HazardRegion;
    use crate::models::Fix;

    fn grid_network() -> NetworkData {
        // fixes on a 1-degree grid around the equator
        let mut net = NetworkData::new();
        let coords = [
            ("W2", 0.0, -2.0),
            ("W1", 0.0, -1.0),
            ("CTR", 0.0, 0.0),
            ("E1", 0.0, 1.0),
            ("E2", 0.0, 2.0),
            ("N1", 1.0, 0.0),
        ];
        for (name, lat, lon) in coords {
            net.add_fix(Fix::Waypoint {
                name: name.to_string(),
                lat,
                lon,
            });
        }
        net
    }

    fn id(net: &NetworkData, name: &str) -> NodeId {
        net.resolve(name).unwrap()
    }

    fn hard_region(vertices: &[(f64, f64)]) -> HazardRegion {
        HazardRegion::new(Polygon::from_vertices(vertices), Severity::Hard, 0, 24)
    }

    #[test]
    fn intersection_found_for_crossing_path() {
        let net = grid_network();
        let scenario = vec![hard_region(&[
            (-0.3, -0.3),
            (0.3, -0.3),
            (0.3, 0.3),
            (-0.3, 0.3),
        ])];
        let crossing = vec![id(&net, "W1"), id(&net, "CTR"), id(&net, "E1")];
        assert!(path_intersects_scenario(
            &crossing, &scenario, &net, None, 0
        ));
        let clear = vec![id(&net, "W1"), id(&net, "N1"), id(&net, "E1")];
        assert!(!path_intersects_scenario(&clear, &scenario, &net, None, 0));
    }

    #[test]
    fn soft_regions_do_not_trigger_reroutes() {
        let net = grid_network();
        let mut scenario = vec![hard_region(&[
            (-0.3, -0.3),
            (0.3, -0.3),
            (0.3, 0.3),
            (-0.3, 0.3),
        ])];
        scenario[0].severity = Severity::Soft;
        let crossing = vec![id(&net, "W1"), id(&net, "CTR"), id(&net, "E1")];
        assert!(!path_intersects_scenario(
            &crossing, &scenario, &net, None, 0
        ));
    }

    #[test]
    fn replan_mode_uses_path_endpoints() {
        let net = grid_network();
        let nominal = vec![id(&net, "W2"), id(&net, "W1"), id(&net, "CTR"), id(&net, "E2")];
        let hull = Polygon::from_vertices(&[(-0.3, -0.3), (0.3, -0.3), (0.3, 0.3), (-0.3, 0.3)]);
        let config = RerouteConfig::default();
        let (entry, exit) = entry_exit_nodes(&nominal, &hull, &net, &config).unwrap();
        assert_eq!(entry, id(&net, "W2"));
        assert_eq!(exit, id(&net, "E2"));
    }

    #[test]
    fn reroute_mode_stops_before_hull() {
        let net = grid_network();
        let nominal = vec![id(&net, "W2"), id(&net, "W1"), id(&net, "CTR"), id(&net, "E2")];
        let hull = Polygon::from_vertices(&[(-0.3, -0.3), (0.3, -0.3), (0.3, 0.3), (-0.3, 0.3)]);
        let config = RerouteConfig {
            mode: RerouteMode::Reroute,
            ..Default::default()
        };
        let (entry, exit) = entry_exit_nodes(&nominal, &hull, &net, &config).unwrap();
        assert_eq!(entry, id(&net, "W1"));
        assert_eq!(exit, id(&net, "E2"));
    }

    #[test]
    fn splice_prepends_nominal_prefix() {
        let net = grid_network();
        let nominal = vec![id(&net, "W2"), id(&net, "W1"), id(&net, "CTR"), id(&net, "E2")];
        let detour = vec![id(&net, "W1"), id(&net, "N1"), id(&net, "E2")];
        let spliced = splice_reroute(&nominal, &detour, &net, &RerouteConfig::default());
        assert_eq!(
            spliced,
            vec![id(&net, "W2"), id(&net, "W1"), id(&net, "N1"), id(&net, "E2")]
        );
    }

    #[test]
    fn splice_drops_backtracking_nodes() {
        let net = grid_network();
        // inbound heading is due east (W2 -> W1); a detour that first jumps
        // back west past W2 turns ~180 degrees and must be dropped
        let nominal = vec![id(&net, "W2"), id(&net, "W1"), id(&net, "E2")];
        let detour = vec![id(&net, "W1"), id(&net, "W2"), id(&net, "N1"), id(&net, "E2")];
        let spliced = splice_reroute(&nominal, &detour, &net, &RerouteConfig::default());
        assert_eq!(
            spliced,
            vec![id(&net, "W2"), id(&net, "W1"), id(&net, "N1"), id(&net, "E2")]
        );
    }

    #[test]
    fn validation_rejects_wrong_terminal() {
        let net = grid_network();
        let scenario = vec![];
        let spliced = vec![id(&net, "W2"), id(&net, "W1")];
        let err =
            validate_reroute(&spliced, id(&net, "E2"), &scenario, &net, None, 0).unwrap_err();
        assert_eq!(
            err,
            RerouteRejection::WrongTerminal {
                expected: id(&net, "E2"),
                actual: id(&net, "W1"),
            }
        );
    }

    #[test]
    fn validation_rejects_hazard_intersection() {
        let net = grid_network();
        let scenario = vec![hard_region(&[
            (-0.3, -0.3),
            (0.3, -0.3),
            (0.3, 0.3),
            (-0.3, 0.3),
        ])];
        let through = vec![id(&net, "W1"), id(&net, "CTR"), id(&net, "E1")];
        let err = validate_reroute(&through, id(&net, "E1"), &scenario, &net, None, 0)
            .unwrap_err();
        assert_eq!(err, RerouteRejection::IntersectsHazard);
    }
}
