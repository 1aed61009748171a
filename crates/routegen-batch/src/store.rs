//! Result stores keyed by weather scenario and polygon scale.

use dashmap::DashMap;
use routegen_core::{FlightRequest, RoutePath};
use serde::Serialize;

/// Key addressing one `(scenario, scale)` result set. Nominal results,
/// computed before any hazard reduction, live under the sentinel key
/// `(-1, 0.0)`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScenarioKey {
    pub scenario: i32,
    pub scale: f64,
}

impl ScenarioKey {
    pub const NOMINAL: ScenarioKey = ScenarioKey {
        scenario: -1,
        scale: 0.0,
    };

    pub fn new(scenario: i32, scale: f64) -> Self {
        Self { scenario, scale }
    }

    pub fn is_nominal(&self) -> bool {
        self.scenario < 0
    }
}

impl PartialEq for ScenarioKey {
    fn eq(&self, other: &Self) -> bool {
        self.scenario == other.scenario && self.scale.to_bits() == other.scale.to_bits()
    }
}

impl Eq for ScenarioKey {}

impl std::hash::Hash for ScenarioKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.scenario.hash(state);
        self.scale.to_bits().hash(state);
    }
}

/// Store for single-option planning: one route per flight per key.
/// Entries are write-once; later inserts under the same flight keep the
/// first value.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: DashMap<ScenarioKey, DashMap<FlightRequest, RoutePath>>,
}

#[derive(Debug, Serialize)]
struct ResultExport<'a, P: Serialize> {
    scenario: i32,
    scale: f64,
    results: Vec<FlightExport<'a, P>>,
}

#[derive(Debug, Serialize)]
struct FlightExport<'a, P: Serialize> {
    flight: &'a FlightRequest,
    #[serde(flatten)]
    value: P,
}

#[derive(Debug, Serialize)]
struct SingleValue<'a> {
    route: &'a RoutePath,
}

#[derive(Debug, Serialize)]
struct OptionsValue<'a> {
    options: &'a [RoutePath],
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route; returns false if the flight already had a route
    /// under this key.
    pub fn insert(&self, key: ScenarioKey, flight: FlightRequest, path: RoutePath) -> bool {
        let set = self.inner.entry(key).or_default();
        if set.contains_key(&flight) {
            return false;
        }
        set.insert(flight, path);
        true
    }

    pub fn get(&self, key: &ScenarioKey, flight: &FlightRequest) -> Option<RoutePath> {
        self.inner
            .get(key)
            .and_then(|set| set.get(flight).map(|r| r.value().clone()))
    }

    pub fn contains(&self, key: &ScenarioKey, flight: &FlightRequest) -> bool {
        self.inner
            .get(key)
            .map(|set| set.contains_key(flight))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<ScenarioKey> {
        self.inner.iter().map(|entry| *entry.key()).collect()
    }

    pub fn num_results(&self, key: &ScenarioKey) -> usize {
        self.inner.get(key).map(|set| set.len()).unwrap_or(0)
    }

    /// Serialize every result set for downstream consumers.
    pub fn to_json(&self) -> serde_json::Value {
        let mut sets = Vec::new();
        for entry in self.inner.iter() {
            let key = *entry.key();
            let results: Vec<(FlightRequest, RoutePath)> = entry
                .value()
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            let export = ResultExport {
                scenario: key.scenario,
                scale: key.scale,
                results: results
                    .iter()
                    .map(|(flight, route)| FlightExport {
                        flight,
                        value: SingleValue { route },
                    })
                    .collect(),
            };
            sets.push(serde_json::to_value(&export).unwrap_or(serde_json::Value::Null));
        }
        serde_json::Value::Array(sets)
    }
}

/// Store for option-set planning: an ordered list of ranked routes per
/// flight per key.
#[derive(Debug, Default)]
pub struct OptionSetStore {
    inner: DashMap<ScenarioKey, DashMap<FlightRequest, Vec<RoutePath>>>,
}

impl OptionSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option to the flight's ranked list under this key.
    pub fn push(&self, key: ScenarioKey, flight: FlightRequest, path: RoutePath) {
        self.inner
            .entry(key)
            .or_default()
            .entry(flight)
            .or_default()
            .push(path);
    }

    pub fn get(&self, key: &ScenarioKey, flight: &FlightRequest) -> Option<Vec<RoutePath>> {
        self.inner
            .get(key)
            .and_then(|set| set.get(flight).map(|r| r.value().clone()))
    }

    pub fn keys(&self) -> Vec<ScenarioKey> {
        self.inner.iter().map(|entry| *entry.key()).collect()
    }

    pub fn num_results(&self, key: &ScenarioKey) -> usize {
        self.inner.get(key).map(|set| set.len()).unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut sets = Vec::new();
        for entry in self.inner.iter() {
            let key = *entry.key();
            let results: Vec<(FlightRequest, Vec<RoutePath>)> = entry
                .value()
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            let export = ResultExport {
                scenario: key.scenario,
                scale: key.scale,
                results: results
                    .iter()
                    .map(|(flight, options)| FlightExport {
                        flight,
                        value: OptionsValue {
                            options: options.as_slice(),
                        },
                    })
                    .collect(),
            };
            sets.push(serde_json::to_value(&export).unwrap_or(serde_json::Value::Null));
        }
        serde_json::Value::Array(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(cost: f64) -> RoutePath {
        RoutePath::new(vec![0, 1], cost)
    }

    #[test]
    fn nominal_key_is_distinct() {
        assert_ne!(ScenarioKey::NOMINAL, ScenarioKey::new(0, 1.0));
        assert!(ScenarioKey::NOMINAL.is_nominal());
        assert!(!ScenarioKey::new(0, 1.0).is_nominal());
    }

    #[test]
    fn scale_participates_in_key_identity() {
        let store = ResultStore::new();
        let flight = FlightRequest::new("KSFO", "KJFK", "UAL1");
        store.insert(ScenarioKey::new(0, 1.0), flight.clone(), path(10.0));
        store.insert(ScenarioKey::new(0, 1.5), flight.clone(), path(20.0));
        assert_eq!(
            store.get(&ScenarioKey::new(0, 1.0), &flight).unwrap().cost,
            10.0
        );
        assert_eq!(
            store.get(&ScenarioKey::new(0, 1.5), &flight).unwrap().cost,
            20.0
        );
    }

    #[test]
    fn inserts_are_write_once() {
        let store = ResultStore::new();
        let flight = FlightRequest::new("KSFO", "KJFK", "UAL1");
        assert!(store.insert(ScenarioKey::NOMINAL, flight.clone(), path(10.0)));
        assert!(!store.insert(ScenarioKey::NOMINAL, flight.clone(), path(99.0)));
        assert_eq!(store.get(&ScenarioKey::NOMINAL, &flight).unwrap().cost, 10.0);
    }

    #[test]
    fn option_sets_preserve_order() {
        let store = OptionSetStore::new();
        let flight = FlightRequest::new("KSFO", "KJFK", "UAL1");
        store.push(ScenarioKey::NOMINAL, flight.clone(), path(10.0));
        store.push(ScenarioKey::NOMINAL, flight.clone(), path(20.0));
        let options = store.get(&ScenarioKey::NOMINAL, &flight).unwrap();
        assert_eq!(options.len(), 2);
        assert!(options[0].cost < options[1].cost);
    }

    #[test]
    fn json_export_round_trips() {
        let store = ResultStore::new();
        let flight = FlightRequest::new("KSFO", "KJFK", "UAL1");
        store.insert(ScenarioKey::new(2, 1.5), flight, path(42.0));
        let json = store.to_json();
        let sets = json.as_array().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0]["scenario"], 2);
        assert_eq!(sets[0]["results"][0]["route"]["cost"], 42.0);
    }
}
