//! Contribution rows and waterfall stacking offsets

use serde::{Deserialize, Serialize};

/// Component of the target primary balance
///
/// Carries a stable machine key only; display labels belong to whoever
/// renders the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Target,
    Cyclical,
    Structural,
    DomesticInterest,
    ForeignInterest,
    FxValuation,
    Convergence,
}

impl ContributionKind {
    /// Reporting order of the waterfall
    pub const ORDER: [ContributionKind; 7] = [
        ContributionKind::Target,
        ContributionKind::Cyclical,
        ContributionKind::Structural,
        ContributionKind::DomesticInterest,
        ContributionKind::ForeignInterest,
        ContributionKind::FxValuation,
        ContributionKind::Convergence,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ContributionKind::Target => "target",
            ContributionKind::Cyclical => "cyclical",
            ContributionKind::Structural => "structural",
            ContributionKind::DomesticInterest => "domestic_interest",
            ContributionKind::ForeignInterest => "foreign_interest",
            ContributionKind::FxValuation => "fx_valuation",
            ContributionKind::Convergence => "convergence",
        }
    }

    /// One of the four structural effects that sum to the structural balance
    pub fn is_structural_effect(&self) -> bool {
        matches!(
            self,
            ContributionKind::DomesticInterest
                | ContributionKind::ForeignInterest
                | ContributionKind::FxValuation
                | ContributionKind::Convergence
        )
    }
}

/// A labelled contribution in % of GDP
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    pub kind: ContributionKind,
    pub value_pct_gdp: f64,
}

/// A contribution placed on a stacked bar chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterfallBar {
    pub kind: ContributionKind,
    pub value: f64,
    /// Level the bar starts from
    pub bottom: f64,
}

impl WaterfallBar {
    /// Level the bar ends at
    pub fn top(&self) -> f64 {
        self.bottom + self.value
    }
}

/// Stack the seven rows: the cyclical bar sits on the structural balance and
/// the structural effects are chained from zero.
pub fn stack_bars(rows: &[ContributionRow; 7]) -> [WaterfallBar; 7] {
    let structural = rows
        .iter()
        .find(|row| row.kind == ContributionKind::Structural)
        .map_or(0.0, |row| row.value_pct_gdp);

    let mut running = 0.0;
    let mut bars = [WaterfallBar { kind: ContributionKind::Target, value: 0.0, bottom: 0.0 }; 7];
    for (bar, row) in bars.iter_mut().zip(rows) {
        let bottom = match row.kind {
            ContributionKind::Cyclical => structural,
            kind if kind.is_structural_effect() => {
                let bottom = running;
                running += row.value_pct_gdp;
                bottom
            }
            _ => 0.0,
        };
        *bar = WaterfallBar {
            kind: row.kind,
            value: row.value_pct_gdp,
            bottom,
        };
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: [f64; 7]) -> [ContributionRow; 7] {
        let mut out = [ContributionRow { kind: ContributionKind::Target, value_pct_gdp: 0.0 }; 7];
        for (i, kind) in ContributionKind::ORDER.iter().enumerate() {
            out[i] = ContributionRow { kind: *kind, value_pct_gdp: values[i] };
        }
        out
    }

    #[test]
    fn test_stack_offsets() {
        // target, cyclical, structural, dom, for, fxval, conv
        let bars = stack_bars(&rows([1.5, -1.0, 2.5, 1.0, 0.5, 0.25, 0.75]));

        let bottoms: Vec<f64> = bars.iter().map(|b| b.bottom).collect();
        assert_eq!(bottoms, vec![0.0, 2.5, 0.0, 0.0, 1.0, 1.5, 1.75]);

        // The chained effects end at the structural balance
        assert_eq!(bars[6].top(), bars[2].top());
        // The cyclical bar ends at the target
        assert_eq!(bars[1].top(), bars[0].top());
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = ContributionKind::ORDER.iter().map(|k| k.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn test_structural_effects() {
        let effects: Vec<_> = ContributionKind::ORDER
            .iter()
            .filter(|k| k.is_structural_effect())
            .collect();
        assert_eq!(effects.len(), 4);
        assert_eq!(*effects[0], ContributionKind::DomesticInterest);
    }

    #[test]
    fn test_serialized_kind() {
        let json = serde_json::to_string(&ContributionKind::FxValuation).unwrap();
        assert_eq!(json, "\"fx_valuation\"");
    }
}
