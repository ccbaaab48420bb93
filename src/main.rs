//! Fiscal Rule CLI
//!
//! Command-line interface for evaluating and decomposing the required
//! primary balance. Rule variants default to the environment
//! (FISCAL_RULE_CONVERGENCE, FISCAL_RULE_CYCLICAL, FISCAL_RULE_ESCAPE_THRESHOLD,
//! FISCAL_RULE_ESCAPE_ELASTICITY) and can be overridden per run.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fiscal_rule::params::{load_parameters_json, load_scenarios};
use fiscal_rule::{
    ContributionKind, ConvergenceRule, CyclicalRule, Decomposition, EscapeDirection, EvaluationFlags, RateOverrides,
    RuleConfig, RuleEvaluator, RuleParameters, ScenarioRunner,
};

/// Required primary balance under a debt-anchoring fiscal rule
#[derive(Parser)]
#[command(name = "fiscal-rule", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Language for component labels
    #[arg(long, value_enum, default_value = "en", global = true)]
    lang: Lang,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose the target primary balance into its components
    Decompose {
        #[command(flatten)]
        params: ParamArgs,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Evaluate the required primary balance with explicit toggles
    Evaluate {
        #[command(flatten)]
        params: ParamArgs,
        #[command(flatten)]
        rule: RuleArgs,
        /// Leave out the debt convergence term
        #[arg(long)]
        no_convergence: bool,
        /// Leave out the FX risk loading
        #[arg(long)]
        no_fx_risk: bool,
        /// Domestic rate to use instead of r_dom (%)
        #[arg(long, allow_negative_numbers = true)]
        r_dom_override: Option<f64>,
        /// Foreign rate to use instead of r_fx (%)
        #[arg(long, allow_negative_numbers = true)]
        r_fx_override: Option<f64>,
    },
    /// Decompose every scenario in a CSV file
    Batch {
        /// Scenario CSV (scenario,d_dom,d_fx,d_star,tau,kappa,r_dom,r_fx,n,E,E10,OG,epsilon_pb)
        #[arg(long)]
        input: PathBuf,
        /// Output CSV path (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        rule: RuleArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Es,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConvergenceArg {
    Floored,
    Unfloored,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CyclicalArg {
    Linear,
    /// Full pass-through of output gaps below -3
    EscapeClause,
    /// Full pass-through of output gaps above +3
    EscapeClauseAbove,
}

/// Parameter set: JSON file and/or individual flags (flags win)
#[derive(Args, Debug)]
struct ParamArgs {
    /// JSON file with a parameter object; missing fields take defaults
    #[arg(long)]
    input: Option<PathBuf>,
    /// Domestic debt (% of GDP)
    #[arg(long)]
    d_dom: Option<f64>,
    /// Foreign debt (% of GDP)
    #[arg(long)]
    d_fx: Option<f64>,
    /// Debt anchor (% of GDP)
    #[arg(long)]
    d_star: Option<f64>,
    /// Fraction of the excess removed per year
    #[arg(long)]
    tau: Option<f64>,
    /// Prudential FX coefficient
    #[arg(long, allow_negative_numbers = true)]
    kappa: Option<f64>,
    /// Real domestic interest rate (%)
    #[arg(long, allow_negative_numbers = true)]
    r_dom: Option<f64>,
    /// Real foreign interest rate (%)
    #[arg(long, allow_negative_numbers = true)]
    r_fx: Option<f64>,
    /// Real GDP growth (%)
    #[arg(long, allow_negative_numbers = true)]
    n: Option<f64>,
    /// Current real exchange rate
    #[arg(long = "e")]
    e: Option<f64>,
    /// 10-year average real exchange rate
    #[arg(long = "e10")]
    e10: Option<f64>,
    /// Output gap (percentage points)
    #[arg(long, allow_negative_numbers = true)]
    og: Option<f64>,
    /// Elasticity of the primary balance to the output gap
    #[arg(long, allow_negative_numbers = true)]
    epsilon_pb: Option<f64>,
    /// Historical rate on outstanding domestic debt (%), blended into r_dom
    #[arg(long, allow_negative_numbers = true, requires = "r_dom_rollover")]
    r_dom_legacy: Option<f64>,
    /// Share of domestic debt maturing within a year
    #[arg(long, requires = "r_dom_legacy")]
    r_dom_rollover: Option<f64>,
    /// Historical rate on outstanding foreign debt (%), blended into r_fx
    #[arg(long, allow_negative_numbers = true, requires = "r_fx_rollover")]
    r_fx_legacy: Option<f64>,
    /// Share of foreign debt maturing within a year
    #[arg(long, requires = "r_fx_legacy")]
    r_fx_rollover: Option<f64>,
}

impl ParamArgs {
    fn resolve(&self) -> Result<RuleParameters> {
        let mut params = match &self.input {
            Some(path) => load_parameters_json(path)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
            None => RuleParameters::default(),
        };

        let fields: [(&mut f64, Option<f64>); 12] = [
            (&mut params.d_dom, self.d_dom),
            (&mut params.d_fx, self.d_fx),
            (&mut params.d_star, self.d_star),
            (&mut params.tau, self.tau),
            (&mut params.kappa, self.kappa),
            (&mut params.r_dom, self.r_dom),
            (&mut params.r_fx, self.r_fx),
            (&mut params.n, self.n),
            (&mut params.e, self.e),
            (&mut params.e10, self.e10),
            (&mut params.og, self.og),
            (&mut params.epsilon_pb, self.epsilon_pb),
        ];
        for (slot, value) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }

        if let (Some(legacy), Some(share)) = (self.r_dom_legacy, self.r_dom_rollover) {
            params = params.with_blended_r_dom(legacy, share)?;
        }
        if let (Some(legacy), Some(share)) = (self.r_fx_legacy, self.r_fx_rollover) {
            params = params.with_blended_r_fx(legacy, share)?;
        }

        Ok(params)
    }
}

/// Rule variant overrides on top of the environment
#[derive(Args, Debug)]
struct RuleArgs {
    /// Treatment of debt below the anchor
    #[arg(long, value_enum)]
    convergence: Option<ConvergenceArg>,
    /// Cyclical adjustment form
    #[arg(long, value_enum)]
    cyclical: Option<CyclicalArg>,
    /// Output gap below which the escape clause applies
    #[arg(long, allow_negative_numbers = true)]
    escape_threshold: Option<f64>,
    /// Elasticity applied beyond the escape threshold
    #[arg(long)]
    escape_elasticity: Option<f64>,
}

impl RuleArgs {
    fn resolve(&self) -> Result<RuleConfig> {
        let config = RuleConfig::from_env().context("Invalid rule configuration in environment")?;
        Ok(self.apply(config))
    }

    fn apply(&self, base: RuleConfig) -> RuleConfig {
        let mut config = base;

        if let Some(convergence) = self.convergence {
            config.convergence = match convergence {
                ConvergenceArg::Floored => ConvergenceRule::Floored,
                ConvergenceArg::Unfloored => ConvergenceRule::Unfloored,
            };
        }
        if let Some(cyclical) = self.cyclical {
            config.cyclical = match cyclical {
                CyclicalArg::Linear => CyclicalRule::Linear,
                CyclicalArg::EscapeClause => CyclicalRule::escape_clause(),
                CyclicalArg::EscapeClauseAbove => CyclicalRule::escape_clause_toward(EscapeDirection::Above),
            };
        }
        if let CyclicalRule::EscapeClause { threshold, escape_elasticity, .. } = &mut config.cyclical {
            if let Some(t) = self.escape_threshold {
                *threshold = t;
            }
            if let Some(e) = self.escape_elasticity {
                *escape_elasticity = e;
            }
        }

        config
    }
}

fn label(kind: ContributionKind, lang: Lang) -> &'static str {
    match (lang, kind) {
        (Lang::En, ContributionKind::Target) => "Target primary balance",
        (Lang::En, ContributionKind::Cyclical) => "Fiscal stabilizer (output gap)",
        (Lang::En, ContributionKind::Structural) => "Structural primary balance",
        (Lang::En, ContributionKind::DomesticInterest) => "Domestic interest effect",
        (Lang::En, ContributionKind::ForeignInterest) => "Foreign interest effect",
        (Lang::En, ContributionKind::FxValuation) => "FX valuation effect (prudential)",
        (Lang::En, ContributionKind::Convergence) => "Convergence to debt anchor (tau)",
        (Lang::Es, ContributionKind::Target) => "Balance primario objetivo",
        (Lang::Es, ContributionKind::Cyclical) => "Efecto estabilizador fiscal (brecha de producto)",
        (Lang::Es, ContributionKind::Structural) => "Balance primario estructural objetivo",
        (Lang::Es, ContributionKind::DomesticInterest) => "Efecto de interés doméstico",
        (Lang::Es, ContributionKind::ForeignInterest) => "Efecto de interés extranjero",
        (Lang::Es, ContributionKind::FxValuation) => "Efecto de valoración FX (prudencial)",
        (Lang::Es, ContributionKind::Convergence) => "Convergencia al objetivo de deuda (efecto tau)",
    }
}

fn print_decomposition(decomposition: &Decomposition, format: OutputFormat, lang: Lang) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "decomposition": decomposition,
                "rows": decomposition.rows(),
                "bars": decomposition.bars(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["component", "label", "value_pct_gdp", "bottom"])?;
            for bar in decomposition.bars() {
                writer.write_record([
                    bar.kind.key().to_string(),
                    label(bar.kind, lang).to_string(),
                    format!("{:.6}", bar.value),
                    format!("{:.6}", bar.bottom),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            println!("{:<50} {:>12} {:>12}", "Component", "% of GDP", "Bottom");
            println!("{}", "-".repeat(76));
            for bar in decomposition.bars() {
                println!("{:<50} {:>12.2} {:>12.2}", label(bar.kind, lang), bar.value, bar.bottom);
            }
            println!();
            println!("  Undervaluation (ln E - ln E10): {:.4}", decomposition.base.undervaluation);
            println!("  FX debt risk loading:           {:.4}", decomposition.base.fx_debt_risk);
            println!("  Debt target this period:        {:.2}", decomposition.base.d_target);
        }
    }
    Ok(())
}

fn run_batch(input: &Path, output: Option<&Path>, config: RuleConfig) -> Result<()> {
    let scenarios = load_scenarios(input)
        .with_context(|| format!("Failed to load scenarios from {}", input.display()))?;
    info!("Loaded {} scenarios from {}", scenarios.len(), input.display());

    let runner = ScenarioRunner::new(config);
    let outcomes = runner.run_batch(&scenarios);

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Unable to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec!["scenario".to_string()];
    header.extend(ContributionKind::ORDER.iter().map(|k| k.key().to_string()));
    header.push("error".to_string());
    writer.write_record(&header)?;

    for outcome in &outcomes {
        let mut record = vec![outcome.name.clone()];
        match &outcome.decomposition {
            Some(d) => record.extend(ContributionKind::ORDER.iter().map(|k| format!("{:.6}", d.value(*k)))),
            None => record.extend(ContributionKind::ORDER.iter().map(|_| String::new())),
        }
        record.push(outcome.error.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }
    writer.flush()?;

    if let Some(path) = output {
        println!("Results for {} scenarios written to: {}", outcomes.len(), path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Decompose { params, rule } => {
            let params = params.resolve()?;
            let config = rule.resolve()?;
            info!("Decomposing with {:?}", config);

            let runner = ScenarioRunner::new(config);
            let decomposition = runner.run(&params)?;
            print_decomposition(&decomposition, cli.format, cli.lang)?;
        }
        Commands::Evaluate {
            params,
            rule,
            no_convergence,
            no_fx_risk,
            r_dom_override,
            r_fx_override,
        } => {
            let params = params.resolve()?;
            let evaluator = RuleEvaluator::new(rule.resolve()?);
            let result = evaluator.evaluate(
                &params,
                EvaluationFlags::new(!no_convergence, !no_fx_risk),
                RateOverrides::new(*r_dom_override, *r_fx_override),
            )?;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(io::stdout());
                    writer.serialize(result)?;
                    writer.flush()?;
                }
                OutputFormat::Table => {
                    println!("Required primary balance: {:>10.4} % of GDP", result.pb_req);
                    println!("  Domestic term:          {:>10.4}", result.domestic_term);
                    println!("  Foreign term:           {:>10.4}", result.fx_term);
                    println!("  Debt target:            {:>10.4}", result.d_target);
                    println!("  FX debt risk:           {:>10.4}", result.fx_debt_risk);
                    println!("  Undervaluation:         {:>10.4}", result.undervaluation);
                }
            }
        }
        Commands::Batch { input, output, rule } => {
            run_batch(input, output.as_deref(), rule.resolve()?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["fiscal-rule"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn decompose_args(cli: &Cli) -> (&ParamArgs, &RuleArgs) {
        match &cli.command {
            Commands::Decompose { params, rule } => (params, rule),
            _ => panic!("expected decompose"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&["decompose", "--og", "-5", "--d-fx", "40", "--e", "0.9"]);
        let (params, _) = decompose_args(&cli);
        let resolved = params.resolve().unwrap();

        assert_eq!(resolved.og, -5.0);
        assert_eq!(resolved.d_fx, 40.0);
        assert_eq!(resolved.e, 0.9);
        assert_eq!(resolved.d_dom, RuleParameters::default().d_dom);
    }

    #[test]
    fn test_flags_override_json_file() {
        let path = std::env::temp_dir().join(format!("fiscal-rule-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"d_dom": 12.0, "r_dom": 6.0, "OG": 1.0}"#).unwrap();

        let cli = parse(&[
            "decompose",
            "--input",
            path.to_str().unwrap(),
            "--og",
            "-2",
            "--r-dom-legacy",
            "2",
            "--r-dom-rollover",
            "0.25",
        ]);
        let (params, _) = decompose_args(&cli);
        let resolved = params.resolve().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(resolved.d_dom, 12.0);
        assert_eq!(resolved.og, -2.0);
        // Blend applied to the file's rate: 0.25 * 6 + 0.75 * 2
        assert_abs_diff_eq!(resolved.r_dom, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rollover_requires_legacy_rate() {
        let result = Cli::try_parse_from(["fiscal-rule", "decompose", "--r-fx-rollover", "0.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_flags_override_base() {
        let cli = parse(&["decompose", "--convergence", "unfloored", "--escape-threshold", "-4"]);
        let (_, rule) = decompose_args(&cli);
        let config = rule.apply(RuleConfig::default());

        assert_eq!(config.convergence, ConvergenceRule::Unfloored);
        assert_eq!(
            config.cyclical,
            CyclicalRule::EscapeClause {
                threshold: -4.0,
                escape_elasticity: 1.0,
                direction: EscapeDirection::Below,
            }
        );
    }

    #[test]
    fn test_boom_side_rule_flag() {
        let cli = parse(&["evaluate", "--cyclical", "escape-clause-above", "--no-fx-risk"]);
        let rule = match &cli.command {
            Commands::Evaluate { rule, no_fx_risk, .. } => {
                assert!(*no_fx_risk);
                rule
            }
            _ => panic!("expected evaluate"),
        };
        let config = rule.apply(RuleConfig::new(ConvergenceRule::Unfloored, CyclicalRule::Linear));

        assert_eq!(config.convergence, ConvergenceRule::Unfloored);
        assert_eq!(config.cyclical, CyclicalRule::escape_clause_toward(EscapeDirection::Above));
    }

    #[test]
    fn test_no_flags_keep_base() {
        let cli = parse(&["decompose"]);
        let (_, rule) = decompose_args(&cli);
        let base = RuleConfig::new(ConvergenceRule::Unfloored, CyclicalRule::Linear);
        assert_eq!(rule.apply(base), base);
    }
}
