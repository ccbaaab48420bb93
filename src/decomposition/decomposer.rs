//! Sequential counterfactual decomposition of the target primary balance

use log::debug;
use serde::{Deserialize, Serialize};

use super::rows::{stack_bars, ContributionKind, ContributionRow, WaterfallBar};
use crate::error::FiscalRuleResult;
use crate::params::RuleParameters;
use crate::rule::{output_gap_effect, EvaluationFlags, EvaluationResult, RateOverrides, RuleConfig, RuleEvaluator};

/// Target primary balance split into its economic effects (% of GDP)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Full structural evaluation (both optional terms, own rates)
    pub base: EvaluationResult,

    pub pb_structural: f64,
    pub domestic_interest_effect: f64,
    pub foreign_interest_effect: f64,
    pub fx_valuation_effect: f64,
    pub convergence_effect: f64,
    pub output_gap_effect: f64,
    pub pb_target: f64,
}

impl Decomposition {
    /// The seven rows in reporting order
    pub fn rows(&self) -> [ContributionRow; 7] {
        let values = [
            self.pb_target,
            self.output_gap_effect,
            self.pb_structural,
            self.domestic_interest_effect,
            self.foreign_interest_effect,
            self.fx_valuation_effect,
            self.convergence_effect,
        ];

        let mut rows = [ContributionRow { kind: ContributionKind::Target, value_pct_gdp: 0.0 }; 7];
        for (i, kind) in ContributionKind::ORDER.iter().enumerate() {
            rows[i] = ContributionRow { kind: *kind, value_pct_gdp: values[i] };
        }
        rows
    }

    /// Rows with their stacked-bar offsets
    pub fn bars(&self) -> [WaterfallBar; 7] {
        stack_bars(&self.rows())
    }

    pub fn value(&self, kind: ContributionKind) -> f64 {
        match kind {
            ContributionKind::Target => self.pb_target,
            ContributionKind::Cyclical => self.output_gap_effect,
            ContributionKind::Structural => self.pb_structural,
            ContributionKind::DomesticInterest => self.domestic_interest_effect,
            ContributionKind::ForeignInterest => self.foreign_interest_effect,
            ContributionKind::FxValuation => self.fx_valuation_effect,
            ContributionKind::Convergence => self.convergence_effect,
        }
    }

    /// Sum of the four structural effects
    pub fn effects_total(&self) -> f64 {
        ContributionKind::ORDER
            .iter()
            .filter(|kind| kind.is_structural_effect())
            .map(|kind| self.value(*kind))
            .sum()
    }

    /// Structural balance left unexplained by the four effects; zero up to
    /// rounding for every supported rule variant
    pub fn residual(&self) -> f64 {
        self.pb_structural - self.effects_total()
    }
}

/// Runs the five counterfactual evaluations behind a decomposition
#[derive(Debug, Clone, Copy, Default)]
pub struct Decomposer {
    evaluator: RuleEvaluator,
}

impl Decomposer {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            evaluator: RuleEvaluator::new(config),
        }
    }

    pub fn config(&self) -> &RuleConfig {
        self.evaluator.config()
    }

    /// Decompose the target primary balance for one parameter set.
    ///
    /// Each channel is isolated by evaluating with the other debt's rate set
    /// to `n` (no excess return over growth) and the optional terms off.
    pub fn decompose(&self, params: &RuleParameters) -> FiscalRuleResult<Decomposition> {
        let n = params.n;
        let bare = EvaluationFlags::new(false, false);

        let base = self.evaluator.evaluate(
            params,
            EvaluationFlags::FULL,
            RateOverrides::both(params.r_dom, params.r_fx),
        )?;
        let step_dom = self
            .evaluator
            .evaluate(params, bare, RateOverrides::both(params.r_dom, n))?;
        let step_fx = self
            .evaluator
            .evaluate(params, bare, RateOverrides::both(n, params.r_fx))?;
        let step_fxval = self.evaluator.evaluate(
            params,
            EvaluationFlags::new(false, true),
            RateOverrides::both(n, params.r_fx),
        )?;
        let step_conv = self.evaluator.evaluate(
            params,
            EvaluationFlags::new(true, false),
            RateOverrides::both(n, n),
        )?;

        let pb_structural = base.pb_req;
        let output_gap_effect = output_gap_effect(&self.config().cyclical, params.og, params.epsilon_pb);

        let decomposition = Decomposition {
            base,
            pb_structural,
            domestic_interest_effect: step_dom.pb_req,
            foreign_interest_effect: step_fx.pb_req,
            fx_valuation_effect: step_fxval.pb_req - step_fx.pb_req,
            convergence_effect: step_conv.pb_req,
            output_gap_effect,
            pb_target: pb_structural + output_gap_effect,
        };

        debug!(
            "decompose structural={:.6} cyclical={:.6} target={:.6} residual={:.3e}",
            decomposition.pb_structural,
            decomposition.output_gap_effect,
            decomposition.pb_target,
            decomposition.residual()
        );

        Ok(decomposition)
    }
}

/// Decompose with an explicit rule configuration
pub fn decompose(params: &RuleParameters, config: &RuleConfig) -> FiscalRuleResult<Decomposition> {
    Decomposer::new(*config).decompose(params)
}
