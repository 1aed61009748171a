//! Core data models for the route generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Identifier of a navigable point in the airway graph.
///
/// Fix ids occupy `[0, F)`; airport ids occupy `[F, F+A)` where `F` is the
/// number of fixes loaded into the network. The partition is fixed once the
/// network is built.
pub type NodeId = usize;

/// A navigable enroute point: either a radio navaid or an RNAV waypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Fix {
    Navaid {
        name: String,
        lat: f64,
        lon: f64,
        elevation_ft: f64,
        frequency_khz: f64,
    },
    Waypoint {
        name: String,
        lat: f64,
        lon: f64,
    },
}

impl Fix {
    pub fn name(&self) -> &str {
        match self {
            Fix::Navaid { name, .. } => name,
            Fix::Waypoint { name, .. } => name,
        }
    }

    pub fn lat(&self) -> f64 {
        match self {
            Fix::Navaid { lat, .. } => *lat,
            Fix::Waypoint { lat, .. } => *lat,
        }
    }

    pub fn lon(&self) -> f64 {
        match self {
            Fix::Navaid { lon, .. } => *lon,
            Fix::Waypoint { lon, .. } => *lon,
        }
    }
}

/// An airport terminal node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    /// ICAO code, e.g. "KSFO".
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_ft: f64,
}

/// A named ordered sequence of fixes defining enroute connectivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airway {
    pub name: String,
    /// Fix names in airway order. Consecutive entries become graph edges.
    pub fix_names: Vec<String>,
}

/// A published departure procedure connecting an airport to the enroute
/// structure through one of its exit fixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidProcedure {
    pub name: String,
    pub airport: String,
    pub exit_fixes: Vec<String>,
}

/// A published arrival procedure entered at one of its entry fixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarProcedure {
    pub name: String,
    pub airport: String,
    pub entry_fixes: Vec<String>,
}

/// A published approach procedure, joined from an arrival via a shared
/// transition fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachProcedure {
    pub name: String,
    pub airport: String,
    pub transition_fixes: Vec<String>,
}

/// One flight's routing request. Doubles as the key under which the
/// computed route is stored.
///
/// Two requests are equal iff origin, destination and callsign match;
/// speed, altitude and departure hour do not participate in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRequest {
    pub origin: String,
    pub destination: String,
    pub callsign: String,
    /// Cruise true airspeed in knots.
    pub cruise_speed_kt: f64,
    /// Cruise altitude in feet.
    pub cruise_altitude_ft: f64,
    /// Forecast hour at which the flight departs. Selects the starting
    /// cost bucket for time-bucketed searches.
    pub departure_hour: u32,
}

impl FlightRequest {
    pub fn new(origin: &str, destination: &str, callsign: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            callsign: callsign.to_string(),
            cruise_speed_kt: 450.0,
            cruise_altitude_ft: 35_000.0,
            departure_hour: 0,
        }
    }

    pub fn with_performance(mut self, cruise_speed_kt: f64, cruise_altitude_ft: f64) -> Self {
        self.cruise_speed_kt = cruise_speed_kt;
        self.cruise_altitude_ft = cruise_altitude_ft;
        self
    }

    pub fn with_departure_hour(mut self, hour: u32) -> Self {
        self.departure_hour = hour;
        self
    }
}

impl PartialEq for FlightRequest {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
            && self.destination == other.destination
            && self.callsign == other.callsign
    }
}

impl Eq for FlightRequest {}

impl Hash for FlightRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.destination.hash(state);
        self.callsign.hash(state);
    }
}

/// A computed route: an ordered sequence of at least two node ids, its
/// total transit cost in seconds, and the procedures attached after
/// synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePath {
    pub nodes: Vec<NodeId>,
    /// Total transit cost in seconds, re-summed from elapsed time zero.
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    /// Departure delay recorded when a ground hold was chosen in lieu of
    /// an available detour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_hold_hours: Option<u32>,
    pub computed_at: DateTime<Utc>,
}

impl RoutePath {
    pub fn new(nodes: Vec<NodeId>, cost: f64) -> Self {
        Self {
            nodes,
            cost,
            sid: None,
            star: None,
            approach: None,
            ground_hold_hours: None,
            computed_at: Utc::now(),
        }
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A pilot weather report with a derived position and observation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pirep {
    /// Position derived from the referenced waypoint plus bearing/distance.
    pub lat: f64,
    pub lon: f64,
    /// Reported phenomenon, e.g. turbulence or icing.
    pub phenomenon: PirepPhenomenon,
    /// Severity 1 (light) to 3 (severe).
    pub severity: u8,
    pub urgent: bool,
    /// Forecast hour of the observation.
    pub observed_hour: u32,
    /// Number of hours the report remains valid after observation.
    pub valid_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PirepPhenomenon {
    Turbulence,
    Icing,
    /// Low-level wind shear. Always excludes affected nodes outright.
    WindShear,
}

impl Pirep {
    /// Whether the report is active at the given forecast hour.
    pub fn active_at(&self, hour: u32) -> bool {
        hour >= self.observed_hour && hour < self.observed_hour + self.valid_hours
    }
}
