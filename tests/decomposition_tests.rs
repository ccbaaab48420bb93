use approx::assert_abs_diff_eq;
use fiscal_rule::params::load_scenarios_from_reader;
use fiscal_rule::{
    decompose, evaluate, ContributionKind, ConvergenceRule, CyclicalRule, EscapeDirection, EvaluationFlags,
    FiscalRuleError, RateOverrides, RuleConfig, RuleParameters, ScenarioRunner,
};

// ===========================================================================
// Property sweeps over a grid of economies
// ===========================================================================

fn economies() -> Vec<RuleParameters> {
    let mut out = Vec::new();
    for &(d_dom, d_fx) in &[(0.0, 0.0), (29.0, 38.0), (10.0, 80.0), (95.0, 5.0)] {
        for &(r_dom, r_fx, n) in &[(4.0, 4.0, 3.0), (9.0, 2.5, -4.0), (-1.0, 6.0, 1.0)] {
            for &(e, e10) in &[(1.0, 1.1), (1.3, 1.0), (850.0, 850.0)] {
                out.push(RuleParameters {
                    d_dom,
                    d_fx,
                    r_dom,
                    r_fx,
                    n,
                    e,
                    e10,
                    ..Default::default()
                });
            }
        }
    }
    out
}

fn all_configs() -> Vec<RuleConfig> {
    let mut out = Vec::new();
    for convergence in [ConvergenceRule::Floored, ConvergenceRule::Unfloored] {
        for cyclical in [
            CyclicalRule::Linear,
            CyclicalRule::escape_clause(),
            CyclicalRule::escape_clause_toward(EscapeDirection::Above),
        ] {
            out.push(RuleConfig::new(convergence, cyclical));
        }
    }
    out
}

#[test]
fn test_effects_sum_to_structural_balance() {
    for config in all_configs() {
        for params in economies() {
            let d = decompose(&params, &config).unwrap();
            assert!(
                (d.effects_total() - d.pb_structural).abs() < 1e-9,
                "additivity broken for {:?} under {:?}: {} vs {}",
                params,
                config,
                d.effects_total(),
                d.pb_structural
            );
        }
    }
}

#[test]
fn test_structural_matches_base_terms() {
    let config = RuleConfig::default();
    for params in economies() {
        let base = evaluate(&params, EvaluationFlags::FULL, RateOverrides::NONE, &config).unwrap();
        let d = decompose(&params, &config).unwrap();
        assert_abs_diff_eq!(d.pb_structural, base.pb_req, epsilon = 1e-12);
        assert_abs_diff_eq!(
            d.pb_structural,
            base.domestic_term + base.fx_term - base.d_target,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_target_is_structural_plus_cyclical() {
    for config in all_configs() {
        for og in [-8.0, -3.0, -1.0, 0.0, 2.5] {
            let params = RuleParameters { og, ..Default::default() };
            let d = decompose(&params, &config).unwrap();
            assert_abs_diff_eq!(d.pb_target, d.pb_structural + d.output_gap_effect, epsilon = 1e-12);
        }
    }
}

// ===========================================================================
// Worked example with the default parameters
// ===========================================================================

#[test]
fn test_default_waterfall() {
    let d = decompose(&RuleParameters::default(), &RuleConfig::default()).unwrap();
    let rows = d.rows();

    assert_eq!(rows[0].kind, ContributionKind::Target);
    assert_eq!(rows[6].kind, ContributionKind::Convergence);

    assert_abs_diff_eq!(d.base.undervaluation, -0.0953, epsilon = 1e-4);
    assert_abs_diff_eq!(d.base.fx_debt_risk, 0.0286, epsilon = 1e-4);
    assert_abs_diff_eq!(d.base.d_target, 66.15, epsilon = 1e-9);
    assert_abs_diff_eq!(d.base.domestic_term, 29.2816, epsilon = 1e-4);
    assert_abs_diff_eq!(d.pb_structural, 2.5976, epsilon = 1e-4);
    assert_abs_diff_eq!(d.pb_target, d.pb_structural, epsilon = 1e-12);
}

// ===========================================================================
// Escape clause direction
// ===========================================================================

#[test]
fn test_boom_side_escape_clause_through_decomposition() {
    let config = RuleConfig::new(
        ConvergenceRule::Floored,
        CyclicalRule::escape_clause_toward(EscapeDirection::Above),
    );
    let epsilon_pb = 0.5;

    for og in [-7.0, -5.0, 0.0, 3.0, 5.0, 8.0] {
        let params = RuleParameters { og, epsilon_pb, ..Default::default() };
        let d = decompose(&params, &config).unwrap();
        // epsilon_pb up to +3, full pass-through beyond it
        let expected = epsilon_pb * og.min(3.0) + (og.max(3.0) - 3.0) * 1.0;
        assert_abs_diff_eq!(d.output_gap_effect, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_escape_directions_differ() {
    let params = RuleParameters { og: 5.0, ..Default::default() };
    let below = decompose(&params, &RuleConfig::default()).unwrap();
    let above = decompose(
        &params,
        &RuleConfig::new(ConvergenceRule::Floored, "escape_clause_above".parse().unwrap()),
    )
    .unwrap();

    assert_abs_diff_eq!(below.output_gap_effect, 2.5, epsilon = 1e-12);
    assert_abs_diff_eq!(above.output_gap_effect, 3.5, epsilon = 1e-12);
    assert_abs_diff_eq!(below.pb_structural, above.pb_structural);
}

// ===========================================================================
// Input errors
// ===========================================================================

#[test]
fn test_invalid_exchange_rates_reported() {
    for (e, e10) in [(1.0, 0.0), (0.0, 1.0), (-2.0, 1.0)] {
        let params = RuleParameters { e, e10, ..Default::default() };
        match decompose(&params, &RuleConfig::default()) {
            Err(FiscalRuleError::InvalidInput { .. }) => {}
            other => panic!("expected InvalidInput for E={} E10={}, got {:?}", e, e10, other),
        }
    }
}

#[test]
fn test_collapse_of_output_rejected() {
    let params = RuleParameters { n: -100.0, ..Default::default() };
    assert!(matches!(
        decompose(&params, &RuleConfig::default()),
        Err(FiscalRuleError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Batch runs from CSV
// ===========================================================================

#[test]
fn test_batch_from_csv() {
    let data = "\
scenario,d_dom,d_fx,d_star,tau,kappa,r_dom,r_fx,n,E,E10,OG,epsilon_pb
baseline,29,38,50,0.05,0.3,4,4,3,1.00,1.10,0,0.5
deep_recession,29,38,50,0.05,0.3,4,4,-6,1.00,1.10,-7,0.5
broken,29,38,50,0.05,0.3,4,4,3,1.00,0,0,0.5
";
    let scenarios = load_scenarios_from_reader(data.as_bytes()).unwrap();
    let runner = ScenarioRunner::new(RuleConfig::new(ConvergenceRule::Floored, CyclicalRule::escape_clause()));
    let outcomes = runner.run_batch(&scenarios);

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].name, "baseline");

    let deep = outcomes[1].decomposition.unwrap();
    // -3 at 0.5 plus -4 at 1.0
    assert_abs_diff_eq!(deep.output_gap_effect, -5.5, epsilon = 1e-12);

    assert!(outcomes[2].decomposition.is_none());
    assert!(outcomes[2].error.is_some());
}
