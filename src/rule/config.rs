//! Rule variant selection
//!
//! Two variants of the rule have been used in practice and they give
//! materially different targets near the anchor and in deep recessions, so
//! every evaluation takes the variant explicitly.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{FiscalRuleError, FiscalRuleResult};

/// Default output gap below which the escape clause applies
pub const DEFAULT_ESCAPE_THRESHOLD: f64 = -3.0;

/// Default output gap above which the boom-side escape clause applies
pub const DEFAULT_ESCAPE_ABOVE_THRESHOLD: f64 = 3.0;

/// Default marginal elasticity beyond the escape threshold (100%)
pub const DEFAULT_ESCAPE_ELASTICITY: f64 = 1.0;

/// Environment keys read by [`RuleConfig::from_env`]
pub const ENV_CONVERGENCE: &str = "FISCAL_RULE_CONVERGENCE";
pub const ENV_CYCLICAL: &str = "FISCAL_RULE_CYCLICAL";
pub const ENV_ESCAPE_THRESHOLD: &str = "FISCAL_RULE_ESCAPE_THRESHOLD";
pub const ENV_ESCAPE_ELASTICITY: &str = "FISCAL_RULE_ESCAPE_ELASTICITY";
pub const ENV_ESCAPE_DIRECTION: &str = "FISCAL_RULE_ESCAPE_DIRECTION";

/// How the excess of debt over the anchor enters the convergence term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceRule {
    /// Excess is floored at zero: debt below the anchor earns no extra room
    #[default]
    Floored,
    /// Signed excess: debt below the anchor raises the debt target
    Unfloored,
}

impl ConvergenceRule {
    /// Excess debt the convergence fraction is applied to
    pub fn excess(&self, d_total: f64, d_star: f64) -> f64 {
        match self {
            ConvergenceRule::Floored => (d_total - d_star).max(0.0),
            ConvergenceRule::Unfloored => d_total - d_star,
        }
    }
}

impl FromStr for ConvergenceRule {
    type Err = FiscalRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floored" => Ok(ConvergenceRule::Floored),
            "unfloored" => Ok(ConvergenceRule::Unfloored),
            other => Err(FiscalRuleError::Config(format!("Unknown convergence rule: {}", other))),
        }
    }
}

/// Side of the threshold on which the escape elasticity takes over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeDirection {
    /// Gaps below the threshold (deep recessions)
    #[default]
    Below,
    /// Gaps above the threshold (strong booms)
    Above,
}

impl EscapeDirection {
    pub fn default_threshold(&self) -> f64 {
        match self {
            EscapeDirection::Below => DEFAULT_ESCAPE_THRESHOLD,
            EscapeDirection::Above => DEFAULT_ESCAPE_ABOVE_THRESHOLD,
        }
    }
}

impl FromStr for EscapeDirection {
    type Err = FiscalRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "below" => Ok(EscapeDirection::Below),
            "above" => Ok(EscapeDirection::Above),
            other => Err(FiscalRuleError::Config(format!("Unknown escape direction: {}", other))),
        }
    }
}

/// Cyclical adjustment of the structural target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CyclicalRule {
    /// `epsilon_pb * OG` everywhere
    Linear,
    /// `epsilon_pb` on the near side of `threshold`, `escape_elasticity` on
    /// the side given by `direction`
    EscapeClause {
        threshold: f64,
        escape_elasticity: f64,
        #[serde(default)]
        direction: EscapeDirection,
    },
}

impl CyclicalRule {
    /// Recession-side escape clause: full pass-through below an output gap of -3
    pub fn escape_clause() -> Self {
        CyclicalRule::escape_clause_toward(EscapeDirection::Below)
    }

    /// Escape clause on the given side, at that side's default threshold
    pub fn escape_clause_toward(direction: EscapeDirection) -> Self {
        CyclicalRule::EscapeClause {
            threshold: direction.default_threshold(),
            escape_elasticity: DEFAULT_ESCAPE_ELASTICITY,
            direction,
        }
    }
}

impl Default for CyclicalRule {
    fn default() -> Self {
        CyclicalRule::escape_clause()
    }
}

impl FromStr for CyclicalRule {
    type Err = FiscalRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(CyclicalRule::Linear),
            "escape_clause" | "escape_clause_below" => Ok(CyclicalRule::escape_clause()),
            "escape_clause_above" => Ok(CyclicalRule::escape_clause_toward(EscapeDirection::Above)),
            other => Err(FiscalRuleError::Config(format!("Unknown cyclical rule: {}", other))),
        }
    }
}

/// Variant selection for one deployment of the rule
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    pub convergence: ConvergenceRule,
    pub cyclical: CyclicalRule,
}

impl RuleConfig {
    pub fn new(convergence: ConvergenceRule, cyclical: CyclicalRule) -> Self {
        Self { convergence, cyclical }
    }

    /// Read the variant from the process environment
    ///
    /// Unset keys keep the defaults; a set but unparseable key is an error.
    pub fn from_env() -> FiscalRuleResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuleConfig::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> FiscalRuleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let convergence = match lookup(ENV_CONVERGENCE) {
            Some(value) => value.parse()?,
            None => ConvergenceRule::default(),
        };

        let mut cyclical = match lookup(ENV_CYCLICAL) {
            Some(value) => value.parse()?,
            None => CyclicalRule::default(),
        };

        if let Some(value) = lookup(ENV_ESCAPE_DIRECTION) {
            let direction: EscapeDirection = value.parse()?;
            if matches!(cyclical, CyclicalRule::EscapeClause { .. }) {
                cyclical = CyclicalRule::escape_clause_toward(direction);
            }
        }

        if let CyclicalRule::EscapeClause { threshold, escape_elasticity, .. } = &mut cyclical {
            if let Some(value) = lookup(ENV_ESCAPE_THRESHOLD) {
                *threshold = parse_finite(ENV_ESCAPE_THRESHOLD, &value)?;
            }
            if let Some(value) = lookup(ENV_ESCAPE_ELASTICITY) {
                *escape_elasticity = parse_finite(ENV_ESCAPE_ELASTICITY, &value)?;
            }
        }

        Ok(Self { convergence, cyclical })
    }
}

fn parse_finite(key: &str, value: &str) -> FiscalRuleResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FiscalRuleError::Config(format!("{} must be a finite number, got '{}'", key, value)))
}
