//! Fiscal Rule - required primary balance engine for debt-anchored fiscal rules
//!
//! This library provides:
//! - Required primary balance under a debt anchor with an FX prudential loading
//! - Sequential counterfactual decomposition into domestic interest, foreign
//!   interest, FX valuation and debt convergence effects
//! - Cyclical adjustment with an optional escape clause for deep recessions
//! - Scenario loading and parallel batch decomposition

pub mod error;
pub mod params;
pub mod rule;
pub mod decomposition;
pub mod scenario;

// Re-export commonly used types
pub use error::{FiscalRuleError, FiscalRuleResult};
pub use params::{RuleParameters, Scenario};
pub use rule::{evaluate, ConvergenceRule, CyclicalRule, EscapeDirection, EvaluationFlags, EvaluationResult, RateOverrides, RuleConfig, RuleEvaluator};
pub use decomposition::{decompose, ContributionKind, ContributionRow, Decomposer, Decomposition, WaterfallBar};
pub use scenario::{ScenarioOutcome, ScenarioRunner};
