//! Required primary balance under the debt-anchoring rule

use log::debug;
use serde::{Deserialize, Serialize};

use super::config::RuleConfig;
use crate::error::{FiscalRuleError, FiscalRuleResult};
use crate::params::RuleParameters;

/// Which optional terms enter an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFlags {
    /// Apply `tau` to the excess over the anchor
    pub include_convergence: bool,

    /// Load the foreign term with the FX reversion risk
    pub include_fx_risk: bool,
}

impl EvaluationFlags {
    /// Both terms on: the full structural requirement
    pub const FULL: Self = Self {
        include_convergence: true,
        include_fx_risk: true,
    };

    pub const fn new(include_convergence: bool, include_fx_risk: bool) -> Self {
        Self {
            include_convergence,
            include_fx_risk,
        }
    }
}

impl Default for EvaluationFlags {
    fn default() -> Self {
        Self::FULL
    }
}

/// Interest rates substituted for the parameter set's own rates (in %)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateOverrides {
    pub r_dom: Option<f64>,
    pub r_fx: Option<f64>,
}

impl RateOverrides {
    pub const NONE: Self = Self { r_dom: None, r_fx: None };

    pub fn new(r_dom: Option<f64>, r_fx: Option<f64>) -> Self {
        Self { r_dom, r_fx }
    }

    /// Set both rates explicitly
    pub fn both(r_dom: f64, r_fx: f64) -> Self {
        Self {
            r_dom: Some(r_dom),
            r_fx: Some(r_fx),
        }
    }
}

/// Output of one evaluation; all values in % of GDP except the two FX terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Required primary balance
    pub pb_req: f64,

    /// Domestic debt carried forward at `(1 + r_dom) / (1 + n)`
    pub domestic_term: f64,

    /// Foreign debt carried forward, including the FX risk loading
    pub fx_term: f64,

    /// Risk loading applied to the foreign term (fraction)
    pub fx_debt_risk: f64,

    /// `ln(E) - ln(E10)`; negative when the currency is weaker than average
    pub undervaluation: f64,

    /// Debt level the rule steers toward this period
    pub d_target: f64,
}

/// Compute the required primary balance.
///
/// Switching a term off means zeroing it (`tau` or the risk loading), and
/// overriding a rate with `n` removes that debt's excess return over growth.
pub fn evaluate(
    params: &RuleParameters,
    flags: EvaluationFlags,
    overrides: RateOverrides,
    config: &RuleConfig,
) -> FiscalRuleResult<EvaluationResult> {
    params.validate()?;
    for (field, value) in [("r_dom_override", overrides.r_dom), ("r_fx_override", overrides.r_fx)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(FiscalRuleError::invalid(field, format!("must be finite, got {}", v)));
            }
        }
    }

    let d_total = params.total_debt();
    let tau = if flags.include_convergence { params.tau } else { 0.0 };
    let r_dom = overrides.r_dom.unwrap_or(params.r_dom);
    let r_fx = overrides.r_fx.unwrap_or(params.r_fx);
    let growth = params.growth_factor();

    let undervaluation = params.e.ln() - params.e10.ln();
    let fx_debt_risk = if flags.include_fx_risk {
        params.kappa * (-undervaluation)
    } else {
        0.0
    };
    let d_target = d_total - tau * config.convergence.excess(d_total, params.d_star);

    let domestic_term = (1.0 + r_dom / 100.0) / growth * params.d_dom;
    let fx_term = (1.0 + r_fx / 100.0) * (1.0 + fx_debt_risk) / growth * params.d_fx;
    let pb_req = domestic_term + fx_term - d_target;

    debug!(
        "evaluate flags={:?} r_dom={} r_fx={} -> pb_req={:.6} (dom={:.6} fx={:.6} target={:.6})",
        flags, r_dom, r_fx, pb_req, domestic_term, fx_term, d_target
    );

    Ok(EvaluationResult {
        pb_req,
        domestic_term,
        fx_term,
        fx_debt_risk,
        undervaluation,
        d_target,
    })
}

/// Stateless evaluator bound to one rule configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        params: &RuleParameters,
        flags: EvaluationFlags,
        overrides: RateOverrides,
    ) -> FiscalRuleResult<EvaluationResult> {
        evaluate(params, flags, overrides, &self.config)
    }

    /// Full structural requirement with the parameter set's own rates
    pub fn structural(&self, params: &RuleParameters) -> FiscalRuleResult<EvaluationResult> {
        self.evaluate(params, EvaluationFlags::FULL, RateOverrides::NONE)
    }
}
