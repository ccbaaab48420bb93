//! Load scenarios from CSV files and parameter sets from JSON

use super::{RuleParameters, Scenario};
use crate::error::FiscalRuleResult;
use csv::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw CSV row matching the scenario file columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "scenario")]
    scenario: String,
    d_dom: f64,
    d_fx: f64,
    d_star: f64,
    tau: f64,
    kappa: f64,
    r_dom: f64,
    r_fx: f64,
    n: f64,
    #[serde(rename = "E")]
    e: f64,
    #[serde(rename = "E10")]
    e10: f64,
    #[serde(rename = "OG")]
    og: f64,
    epsilon_pb: f64,
}

impl CsvRow {
    fn into_scenario(self) -> Scenario {
        Scenario {
            name: self.scenario,
            params: RuleParameters {
                d_dom: self.d_dom,
                d_fx: self.d_fx,
                d_star: self.d_star,
                tau: self.tau,
                kappa: self.kappa,
                r_dom: self.r_dom,
                r_fx: self.r_fx,
                n: self.n,
                e: self.e,
                e10: self.e10,
                og: self.og,
                epsilon_pb: self.epsilon_pb,
            },
        }
    }
}

/// Load all scenarios from a CSV file
///
/// Rows are not validated here; invalid parameter sets are reported per
/// scenario when they are evaluated.
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> FiscalRuleResult<Vec<Scenario>> {
    let reader = Reader::from_path(path)?;
    collect_rows(reader)
}

/// Load scenarios from any reader (e.g., string buffer, request body)
pub fn load_scenarios_from_reader<R: std::io::Read>(reader: R) -> FiscalRuleResult<Vec<Scenario>> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: Reader<R>) -> FiscalRuleResult<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        scenarios.push(row.into_scenario());
    }
    Ok(scenarios)
}

/// Load one parameter set from a JSON object; missing fields take defaults
pub fn load_parameters_json<P: AsRef<Path>>(path: P) -> FiscalRuleResult<RuleParameters> {
    let file = File::open(path)?;
    let params = serde_json::from_reader(BufReader::new(file))?;
    Ok(params)
}
