//! AWS Lambda handler for fiscal rule decompositions
//!
//! Accepts a parameter set via JSON and returns the structural and target
//! primary balance with the full waterfall. Missing parameters take the
//! default values; rule variants default to the function's environment.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use aws_lambda_events::event::lambda_function_urls::LambdaFunctionUrlRequest;
use fiscal_rule::{
    ContributionRow, ConvergenceRule, CyclicalRule, Decomposition, FiscalRuleError, RuleConfig, RuleParameters,
    ScenarioRunner, WaterfallBar,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input for a decomposition request
#[derive(Debug, Deserialize)]
pub struct DecompositionRequest {
    /// Rule parameters; unspecified fields take defaults
    #[serde(flatten)]
    pub params: RuleParameters,

    /// "floored" or "unfloored" (default: environment)
    #[serde(default)]
    pub convergence: Option<String>,

    /// "linear", "escape_clause" or "escape_clause_above" (default: environment)
    #[serde(default)]
    pub cyclical: Option<String>,

    /// Historical rate on outstanding domestic debt (%)
    #[serde(default)]
    pub r_dom_legacy: Option<f64>,

    /// Share of domestic debt maturing within a year (0-1)
    #[serde(default)]
    pub r_dom_rollover: Option<f64>,

    /// Historical rate on outstanding foreign debt (%)
    #[serde(default)]
    pub r_fx_legacy: Option<f64>,

    /// Share of foreign debt maturing within a year (0-1)
    #[serde(default)]
    pub r_fx_rollover: Option<f64>,
}

/// Output from the decomposition
#[derive(Debug, Serialize)]
pub struct DecompositionResponse {
    pub params: RuleParameters,
    pub config: RuleConfig,
    pub pb_structural: f64,
    pub pb_target: f64,
    pub decomposition: Decomposition,
    pub rows: Vec<ContributionRow>,
    pub bars: Vec<WaterfallBar>,
    pub execution_time_us: u64,
}

/// Function URL response envelope
#[derive(Debug, Serialize)]
struct UrlResponse {
    #[serde(rename = "statusCode")]
    status_code: u16,
    headers: HashMap<String, String>,
    body: String,
}

fn cors_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    headers.insert("Access-Control-Allow-Methods".to_string(), "POST, OPTIONS".to_string());
    headers.insert("Access-Control-Allow-Headers".to_string(), "Content-Type".to_string());
    headers
}

fn error_response(status: u16, message: &str) -> UrlResponse {
    UrlResponse {
        status_code: status,
        headers: cors_headers(),
        body: serde_json::json!({ "error": message }).to_string(),
    }
}

fn resolve_config(request: &DecompositionRequest, base: RuleConfig) -> Result<RuleConfig, FiscalRuleError> {
    let mut config = base;
    if let Some(convergence) = &request.convergence {
        config.convergence = convergence.parse::<ConvergenceRule>()?;
    }
    if let Some(cyclical) = &request.cyclical {
        config.cyclical = cyclical.parse::<CyclicalRule>()?;
    }
    Ok(config)
}

fn resolve_params(request: &DecompositionRequest) -> Result<RuleParameters, FiscalRuleError> {
    let mut params = request.params;
    if let (Some(legacy), Some(share)) = (request.r_dom_legacy, request.r_dom_rollover) {
        params = params.with_blended_r_dom(legacy, share)?;
    }
    if let (Some(legacy), Some(share)) = (request.r_fx_legacy, request.r_fx_rollover) {
        params = params.with_blended_r_fx(legacy, share)?;
    }
    Ok(params)
}

/// Run one decomposition request body
///
/// `base` carries the function's configured rule; a request naming its own
/// variant gets a runner of its own.
fn process(body: &str, base: &ScenarioRunner) -> UrlResponse {
    let start = std::time::Instant::now();

    let request: DecompositionRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    let params = match resolve_params(&request) {
        Ok(p) => p,
        Err(e) => return error_response(400, &e.to_string()),
    };
    let config = match resolve_config(&request, *base.config()) {
        Ok(c) => c,
        Err(e) => return error_response(400, &e.to_string()),
    };

    let custom;
    let runner = if config == *base.config() {
        base
    } else {
        custom = ScenarioRunner::new(config);
        &custom
    };

    let decomposition = match runner.run(&params) {
        Ok(d) => d,
        Err(e) => {
            warn!("rejected request: {}", e);
            return error_response(400, &e.to_string());
        }
    };

    let response = DecompositionResponse {
        params,
        config,
        pb_structural: decomposition.pb_structural,
        pb_target: decomposition.pb_target,
        decomposition,
        rows: decomposition.rows().to_vec(),
        bars: decomposition.bars().to_vec(),
        execution_time_us: start.elapsed().as_micros() as u64,
    };

    match serde_json::to_string(&response) {
        Ok(body) => UrlResponse {
            status_code: 200,
            headers: cors_headers(),
            body,
        },
        Err(e) => error_response(500, &format!("Failed to serialize response: {}", e)),
    }
}

/// Lambda handler function
async fn handler(event: LambdaEvent<LambdaFunctionUrlRequest>) -> Result<UrlResponse, Error> {
    let request = event.payload;

    // Handle CORS preflight
    if request.request_context.http.method.as_deref() == Some("OPTIONS") {
        return Ok(UrlResponse {
            status_code: 200,
            headers: cors_headers(),
            body: String::new(),
        });
    }

    if request.is_base64_encoded {
        return Ok(error_response(400, "Binary request bodies are not supported"));
    }

    let runner = match ScenarioRunner::from_env() {
        Ok(runner) => runner,
        Err(e) => return Ok(error_response(500, &e.to_string())),
    };

    let body = request.body.unwrap_or_else(|| "{}".to_string());
    let response = process(&body, &runner);
    info!("responded {} in request {}", response.status_code, event.context.request_id);
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn body_json(response: &UrlResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_empty_body_uses_defaults() {
        let response = process("{}", &ScenarioRunner::default());
        assert_eq!(response.status_code, 200);

        let json = body_json(&response);
        assert_abs_diff_eq!(json["pb_structural"].as_f64().unwrap(), 2.597570, epsilon = 1e-6);
        assert_eq!(json["rows"].as_array().unwrap().len(), 7);
        assert_eq!(json["rows"][0]["kind"], "target");
    }

    #[test]
    fn test_variant_and_params_from_body() {
        let body = r#"{"OG": -5.0, "cyclical": "linear", "convergence": "unfloored"}"#;
        let response = process(body, &ScenarioRunner::default());
        assert_eq!(response.status_code, 200);

        let json = body_json(&response);
        assert_abs_diff_eq!(json["decomposition"]["output_gap_effect"].as_f64().unwrap(), -2.5, epsilon = 1e-12);
        assert_eq!(json["config"]["convergence"], "unfloored");
    }

    #[test]
    fn test_boom_side_variant_from_body() {
        let body = r#"{"OG": 5.0, "cyclical": "escape_clause_above"}"#;
        let json = body_json(&process(body, &ScenarioRunner::default()));

        // 3 at 0.5 plus 2 at 1.0
        assert_abs_diff_eq!(json["decomposition"]["output_gap_effect"].as_f64().unwrap(), 3.5, epsilon = 1e-12);
        assert_eq!(json["config"]["cyclical"]["direction"], "above");
    }

    #[test]
    fn test_function_rule_used_without_request_variant() {
        let runner = ScenarioRunner::new(RuleConfig::new(ConvergenceRule::Floored, CyclicalRule::Linear));
        let json = body_json(&process(r#"{"OG": -5.0}"#, &runner));
        assert_abs_diff_eq!(json["decomposition"]["output_gap_effect"].as_f64().unwrap(), -2.5, epsilon = 1e-12);
        assert_eq!(json["config"]["cyclical"]["kind"], "linear");
    }

    #[test]
    fn test_blended_rate_in_body() {
        let body = r#"{"r_dom": 6.0, "r_dom_legacy": 2.0, "r_dom_rollover": 0.25}"#;
        let json = body_json(&process(body, &ScenarioRunner::default()));
        assert_abs_diff_eq!(json["params"]["r_dom"].as_f64().unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_input_is_400() {
        let response = process(r#"{"E10": 0.0}"#, &ScenarioRunner::default());
        assert_eq!(response.status_code, 400);
        assert!(body_json(&response)["error"].as_str().unwrap().contains("E10"));

        assert_eq!(process("not json", &ScenarioRunner::default()).status_code, 400);
        assert_eq!(process(r#"{"cyclical": "kinked"}"#, &ScenarioRunner::default()).status_code, 400);
    }
}
