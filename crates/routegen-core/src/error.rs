//! Error types for route planning.

use thiserror::Error;

/// Failure kinds raised while planning a single flight or validating the
/// network. Per-flight failures skip that flight only; `NoConnectivity` is
/// fatal and aborts the batch before any flight is processed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanError {
    /// The requested origin or destination name cannot be mapped to a node
    /// id, even after the reserved-prefix retry.
    #[error("could not resolve fix {name:?} for flight {callsign}")]
    UnresolvedFix { name: String, callsign: String },

    /// The source or sink node lies inside a hard-excluded hazard region.
    #[error("endpoint {name:?} (node {id}) is inside an excluded region")]
    ExcludedEndpoint { name: String, id: usize },

    /// The search found no path between the resolved endpoints.
    #[error("no path from {origin} to {destination}")]
    NoPath { origin: String, destination: String },

    /// The base network has no airway connectivity loaded at all.
    #[error("network has no airway connectivity")]
    NoConnectivity,
}

/// Failure computing a wind-optimal segment cost.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CostError {
    /// The cross-track wind component exceeds the airspeed, so no crab
    /// angle can hold the track. The edge must be treated as unflyable
    /// rather than produce a non-real cost.
    #[error("cross-track wind exceeds airspeed")]
    CrosswindExceedsAirspeed,

    /// Zero or negative ground speed; the segment cannot be completed.
    #[error("wind reduces ground speed below zero")]
    NoForwardProgress,
}
