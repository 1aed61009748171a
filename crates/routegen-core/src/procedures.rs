//! Procedure attachment: label finished routes with departure and arrival
//! procedures and a compatible approach.

use crate::models::{NodeId, RoutePath};
use crate::network::NetworkData;
use crate::spatial::distance_gc;

/// Attach SID, STAR and approach labels to a finished route.
///
/// The departure procedure is matched by the route's second node against
/// the exit-fix lists of the origin airport's SIDs; if none lists it, the
/// SID whose exit fix is geographically nearest to that node is used.
/// Arrival matching is symmetric on the second-to-last node. The approach
/// is looked up through the attached STAR by shared transition fix, else
/// nearest.
pub fn attach_procedures(path: &mut RoutePath, network: &NetworkData) {
    if path.nodes.len() < 2 {
        return;
    }

    let origin = path.nodes[0];
    let destination = path.nodes[path.nodes.len() - 1];
    let exit_node = path.nodes[1];
    let entry_node = path.nodes[path.nodes.len() - 2];

    if let Some(airport) = network.airport_by_id(origin) {
        let airport_code = airport.code.clone();
        path.sid = match_departure(network, &airport_code, exit_node);
    }

    if let Some(airport) = network.airport_by_id(destination) {
        let airport_code = airport.code.clone();
        path.star = match_arrival(network, &airport_code, entry_node);
        if let Some(star_name) = path.star.clone() {
            path.approach = match_approach(network, &airport_code, &star_name, entry_node);
        }
    }
}

fn match_departure(network: &NetworkData, airport: &str, exit_node: NodeId) -> Option<String> {
    let exit_name = network.name_of(exit_node)?;
    for sid in network.sids().iter().filter(|s| s.airport == airport) {
        if sid.exit_fixes.iter().any(|f| f == exit_name) {
            return Some(sid.name.clone());
        }
    }
    // no SID lists this fix; fall back to the geographically nearest exit
    nearest_procedure(
        network,
        exit_node,
        network
            .sids()
            .iter()
            .filter(|s| s.airport == airport)
            .map(|s| (s.name.as_str(), s.exit_fixes.as_slice())),
    )
}

fn match_arrival(network: &NetworkData, airport: &str, entry_node: NodeId) -> Option<String> {
    let entry_name = network.name_of(entry_node)?;
    for star in network.stars().iter().filter(|s| s.airport == airport) {
        if star.entry_fixes.iter().any(|f| f == entry_name) {
            return Some(star.name.clone());
        }
    }
    nearest_procedure(
        network,
        entry_node,
        network
            .stars()
            .iter()
            .filter(|s| s.airport == airport)
            .map(|s| (s.name.as_str(), s.entry_fixes.as_slice())),
    )
}

fn match_approach(
    network: &NetworkData,
    airport: &str,
    star_name: &str,
    entry_node: NodeId,
) -> Option<String> {
    let star = network
        .stars()
        .iter()
        .find(|s| s.airport == airport && s.name == star_name)?;

    for approach in network.approaches().iter().filter(|a| a.airport == airport) {
        let shares_terminal = approach
            .transition_fixes
            .iter()
            .any(|f| star.entry_fixes.contains(f));
        if shares_terminal {
            return Some(approach.name.clone());
        }
    }
    nearest_procedure(
        network,
        entry_node,
        network
            .approaches()
            .iter()
            .filter(|a| a.airport == airport)
            .map(|a| (a.name.as_str(), a.transition_fixes.as_slice())),
    )
}

/// The procedure whose listed fix is nearest to the given node.
fn nearest_procedure<'a, I>(network: &NetworkData, node: NodeId, procedures: I) -> Option<String>
where
    I: Iterator<Item = (&'a str, &'a [String])>,
{
    let (lat, lon) = network.position(node)?;
    let mut best: Option<(&str, f64)> = None;
    for (name, fixes) in procedures {
        for fix_name in fixes {
            let Some(id) = network.resolve(fix_name) else {
                continue;
            };
            let Some((flat, flon)) = network.position(id) else {
                continue;
            };
            let d = distance_gc(lat, lon, flat, flon, 0.0);
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((name, d));
            }
        }
    }
    best.map(|(name, _)| name.to_string())
}
