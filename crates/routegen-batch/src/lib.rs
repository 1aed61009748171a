pub mod config;
pub mod planner;
pub mod store;

pub use config::PlannerConfig;
pub use planner::Planner;
pub use store::{OptionSetStore, ResultStore, ScenarioKey};
