//! Rule parameter record and input validation

use serde::{Deserialize, Serialize};

use crate::error::{FiscalRuleError, FiscalRuleResult};

/// Inputs to a single rule evaluation
///
/// Debt stocks are percent of GDP, rates and growth are whole percents
/// (4.0 means 4%), exchange rates are domestic units per foreign unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParameters {
    /// Domestic-currency debt (% of GDP)
    pub d_dom: f64,

    /// Foreign-currency debt (% of GDP)
    pub d_fx: f64,

    /// Debt anchor d* (% of GDP)
    pub d_star: f64,

    /// Fraction of the excess over the anchor removed each year
    pub tau: f64,

    /// Prudential FX adjustment coefficient
    pub kappa: f64,

    /// Real domestic interest rate (%)
    pub r_dom: f64,

    /// Real foreign-currency interest rate (%)
    pub r_fx: f64,

    /// Real GDP growth (%)
    pub n: f64,

    /// Current real exchange rate
    #[serde(rename = "E")]
    pub e: f64,

    /// 10-year average real exchange rate
    #[serde(rename = "E10")]
    pub e10: f64,

    /// Output gap (percentage points)
    #[serde(rename = "OG")]
    pub og: f64,

    /// Elasticity of the primary balance to the output gap
    pub epsilon_pb: f64,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            d_dom: 29.0,
            d_fx: 38.0,
            d_star: 50.0,
            tau: 0.05,
            kappa: 0.3,
            r_dom: 4.0,
            r_fx: 4.0,
            n: 3.0,
            e: 1.00,
            e10: 1.10,
            og: 0.0,
            epsilon_pb: 0.5,
        }
    }
}

impl RuleParameters {
    /// Total debt stock (% of GDP)
    pub fn total_debt(&self) -> f64 {
        self.d_dom + self.d_fx
    }

    /// Gross growth factor `1 + n/100`
    pub fn growth_factor(&self) -> f64 {
        1.0 + self.n / 100.0
    }

    /// Check the preconditions every evaluation relies on.
    pub fn validate(&self) -> FiscalRuleResult<()> {
        let fields = [
            ("d_dom", self.d_dom),
            ("d_fx", self.d_fx),
            ("d_star", self.d_star),
            ("tau", self.tau),
            ("kappa", self.kappa),
            ("r_dom", self.r_dom),
            ("r_fx", self.r_fx),
            ("n", self.n),
            ("E", self.e),
            ("E10", self.e10),
            ("OG", self.og),
            ("epsilon_pb", self.epsilon_pb),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(FiscalRuleError::invalid(field, format!("must be finite, got {}", value)));
            }
        }

        for (field, value) in [("d_dom", self.d_dom), ("d_fx", self.d_fx), ("d_star", self.d_star)] {
            if value < 0.0 {
                return Err(FiscalRuleError::invalid(field, format!("debt ratio must be >= 0, got {}", value)));
            }
        }

        // ln(E) - ln(E10) is undefined otherwise
        if self.e <= 0.0 {
            return Err(FiscalRuleError::invalid("E", format!("exchange rate must be > 0, got {}", self.e)));
        }
        if self.e10 <= 0.0 {
            return Err(FiscalRuleError::invalid("E10", format!("exchange rate must be > 0, got {}", self.e10)));
        }

        if self.growth_factor() == 0.0 {
            return Err(FiscalRuleError::invalid("n", "growth of -100% makes 1 + n/100 zero"));
        }

        Ok(())
    }

    /// Replace the domestic rate with a maturity-weighted blend
    pub fn with_blended_r_dom(mut self, legacy: f64, rollover_share: f64) -> FiscalRuleResult<Self> {
        self.r_dom = blended_rate(self.r_dom, legacy, rollover_share)?;
        Ok(self)
    }

    /// Replace the foreign rate with a maturity-weighted blend
    pub fn with_blended_r_fx(mut self, legacy: f64, rollover_share: f64) -> FiscalRuleResult<Self> {
        self.r_fx = blended_rate(self.r_fx, legacy, rollover_share)?;
        Ok(self)
    }
}

/// Effective interest rate on a debt stock.
///
/// Only the share of the stock maturing within the next year reprices at the
/// current market rate; the rest keeps the historical rate it was issued at.
pub fn blended_rate(current: f64, legacy: f64, rollover_share: f64) -> FiscalRuleResult<f64> {
    if !current.is_finite() || !legacy.is_finite() {
        return Err(FiscalRuleError::invalid("rate", "blended rates must be finite"));
    }
    if !(0.0..=1.0).contains(&rollover_share) {
        return Err(FiscalRuleError::invalid(
            "rollover_share",
            format!("must be within [0, 1], got {}", rollover_share),
        ));
    }
    Ok(rollover_share * current + (1.0 - rollover_share) * legacy)
}

/// A named parameter set, as loaded from a scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub params: RuleParameters,
}

impl Scenario {
    pub fn new(name: impl Into<String>, params: RuleParameters) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}
