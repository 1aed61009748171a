//! Planner configuration from defaults and environment.

use routegen_core::{CostConfig, HazardConfig, RerouteConfig, TosConfig};
use std::env;

/// Aggregated tunables for a planning run. Every empirically chosen
/// constant of the engine surfaces here rather than being hard-coded.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub cost: CostConfig,
    pub hazard: HazardConfig,
    pub reroute: RerouteConfig,
    pub tos: TosConfig,
    /// Polygon scaling factors to evaluate per scenario. Factor 1.0 is
    /// the scenario as issued.
    pub scale_factors: Vec<f64>,
    /// Worker threads for the per-flight fan-out. The per-flight critical
    /// section is serialized behind one lock regardless.
    pub num_workers: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cost: CostConfig::default(),
            hazard: HazardConfig::default(),
            reroute: RerouteConfig::default(),
            tos: TosConfig::default(),
            scale_factors: vec![1.0, 1.5],
            num_workers: 4,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = read_var("ROUTEGEN_NUM_OPTIONS") {
            config.tos.num_options = n;
        }
        if let Some(n) = read_var("ROUTEGEN_NUM_WORKERS") {
            config.num_workers = n;
        }
        if let Some(m) = read_var("ROUTEGEN_SOFT_MULTIPLIER") {
            config.hazard.soft_multiplier = m;
        }
        if let Some(deg) = read_var("ROUTEGEN_BACKTRACK_THRESHOLD_DEG") {
            config.reroute.backtrack_threshold_deg = deg;
        }
        config
    }
}

fn read_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
