//! Rule parameters, validation and scenario loading

mod data;
pub mod loader;

pub use data::{RuleParameters, Scenario, blended_rate};
pub use loader::{load_scenarios, load_scenarios_from_reader, load_parameters_json};
