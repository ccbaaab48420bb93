//! Cyclical (output gap) adjustment of the structural target

use super::config::{CyclicalRule, EscapeDirection};

/// Stabilizer effect of the output gap on the target primary balance
///
/// A negative gap lowers the target. Under the escape clause the part of
/// the gap beyond the threshold, on the side named by the direction, is
/// passed through at `escape_elasticity` instead of `epsilon_pb`; the effect
/// stays continuous at the threshold.
pub fn output_gap_effect(rule: &CyclicalRule, og: f64, epsilon_pb: f64) -> f64 {
    match *rule {
        CyclicalRule::Linear => epsilon_pb * og,
        CyclicalRule::EscapeClause { threshold, escape_elasticity, direction } => {
            let (og_within, og_beyond) = match direction {
                EscapeDirection::Below => (og.max(threshold), og.min(threshold) - threshold),
                EscapeDirection::Above => (og.min(threshold), og.max(threshold) - threshold),
            };
            epsilon_pb * og_within + escape_elasticity * og_beyond
        }
    }
}
