//! Scenario runner for batch decompositions
//!
//! Holds one rule configuration and decomposes many independent parameter
//! sets with it, in parallel.

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::decomposition::{Decomposer, Decomposition};
use crate::error::FiscalRuleResult;
use crate::params::{RuleParameters, Scenario};
use crate::rule::RuleConfig;

/// Result of decomposing one named scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<Decomposition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioOutcome {
    pub fn is_ok(&self) -> bool {
        self.decomposition.is_some()
    }
}

/// Batch runner bound to one rule configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(RuleConfig::default());
/// let scenarios = load_scenarios("scenarios.csv")?;
/// for outcome in runner.run_batch(&scenarios) {
///     println!("{}: {:?}", outcome.name, outcome.decomposition.map(|d| d.pb_target));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    decomposer: Decomposer,
}

impl ScenarioRunner {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            decomposer: Decomposer::new(config),
        }
    }

    /// Create runner with the variant selected by the environment
    pub fn from_env() -> FiscalRuleResult<Self> {
        Ok(Self::new(RuleConfig::from_env()?))
    }

    pub fn config(&self) -> &RuleConfig {
        self.decomposer.config()
    }

    /// Decompose a single parameter set
    pub fn run(&self, params: &RuleParameters) -> FiscalRuleResult<Decomposition> {
        self.decomposer.decompose(params)
    }

    /// Decompose many scenarios in parallel, keeping input order
    ///
    /// A failing scenario is reported in its outcome and does not stop the
    /// rest of the batch.
    pub fn run_batch(&self, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
        let outcomes: Vec<ScenarioOutcome> = scenarios
            .par_iter()
            .map(|scenario| match self.run(&scenario.params) {
                Ok(decomposition) => ScenarioOutcome {
                    name: scenario.name.clone(),
                    decomposition: Some(decomposition),
                    error: None,
                },
                Err(e) => {
                    warn!("scenario '{}' rejected: {}", scenario.name, e);
                    ScenarioOutcome {
                        name: scenario.name.clone(),
                        decomposition: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!("decomposed {} scenarios ({} rejected)", outcomes.len(), failed);
        outcomes
    }
}
