//! Rule evaluation: required primary balance and cyclical adjustment

pub mod config;
mod cyclical;
mod evaluator;

pub use config::{ConvergenceRule, CyclicalRule, EscapeDirection, RuleConfig};
pub use cyclical::output_gap_effect;
pub use evaluator::{evaluate, EvaluationFlags, EvaluationResult, RateOverrides, RuleEvaluator};
