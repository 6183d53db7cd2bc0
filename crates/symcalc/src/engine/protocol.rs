//! JSON envelope exchanged with the engine program
//!
//! One command per line in, one reply per line out. The same envelope is
//! used for the Python worker process and for Pyodide's `symcalc_handle`.

use super::SamplingPlan;
use crate::core::{CalculationRequest, CalculationResult, EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Command sent to the engine program
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum EngineCommand<'a> {
    /// Import a package into the session
    Load {
        /// Package name
        package: &'a str,
    },
    /// Run one calculation
    Evaluate {
        /// What to compute
        request: &'a CalculationRequest,
        /// How to sample it
        plan: &'a SamplingPlan,
    },
}

impl EngineCommand<'_> {
    /// Serializes to a single JSON line (no trailing newline)
    pub fn to_line(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reply from the engine program
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineReply {
    /// Whether the command succeeded
    pub ok: bool,
    /// Failure description when `ok` is false
    #[serde(default)]
    pub error: Option<String>,
    /// Calculation result for `evaluate`
    #[serde(default)]
    pub result: Option<CalculationResult>,
    /// Set on the worker's greeting line
    #[serde(default)]
    pub ready: bool,
}

impl EngineReply {
    /// Parses one reply line
    pub fn parse(line: &str) -> EngineResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(EngineError::protocol("empty reply"));
        }
        Ok(serde_json::from_str(line)?)
    }

    /// Turns a failed reply into an error
    pub fn into_ack(self) -> EngineResult<()> {
        if self.ok {
            Ok(())
        } else {
            Err(EngineError::evaluation(self.failure_message()))
        }
    }

    /// Extracts the calculation result
    pub fn into_result(self) -> EngineResult<CalculationResult> {
        if !self.ok {
            return Err(EngineError::evaluation(self.failure_message()));
        }
        self.result
            .ok_or_else(|| EngineError::protocol("reply carries no result"))
    }

    fn failure_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "engine reported failure without a message".to_string())
    }
}

/// Checks that the engine answered in the mode it was asked about
pub fn ensure_mode(
    request: &CalculationRequest,
    result: CalculationResult,
) -> EngineResult<CalculationResult> {
    if request.mode() == result.mode() {
        Ok(result)
    } else {
        Err(EngineError::protocol(format!(
            "asked for {}, engine answered {}",
            request.mode(),
            result.mode()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DifferentiationRequest, IntegrationRequest};
    use pretty_assertions::assert_eq;

    fn integrate(expr: &str) -> CalculationRequest {
        CalculationRequest::Integrate(IntegrationRequest {
            expression: expr.into(),
            lower_bound: 0.0,
            upper_bound: 2.0,
            sample_count: 1000,
        })
    }

    #[test]
    fn test_load_command_line() {
        let line = EngineCommand::Load { package: "sympy" }.to_line().unwrap();
        assert_eq!(line, r#"{"op":"load","package":"sympy"}"#);
    }

    #[test]
    fn test_evaluate_command_shape() {
        let request = integrate("x**2");
        let plan = SamplingPlan::default();
        let line = EngineCommand::Evaluate {
            request: &request,
            plan: &plan,
        }
        .to_line()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["op"], "evaluate");
        assert_eq!(value["request"]["kind"], "integration");
        assert_eq!(value["request"]["expression"], "x**2");
        assert_eq!(value["plan"]["simulations"], 10);
        assert_eq!(value["plan"]["plot_domain"][0], -10.0);
    }

    #[test]
    fn test_hostile_expression_stays_data() {
        let hostile = "x')\nimport os\nos.system('true')\n#";
        let request = integrate(hostile);
        let plan = SamplingPlan::default();
        let line = EngineCommand::Evaluate {
            request: &request,
            plan: &plan,
        }
        .to_line()
        .unwrap();
        // Still one line, and the expression round-trips untouched
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["request"]["expression"], hostile);
    }

    #[test]
    fn test_reply_success_with_result() {
        let reply = EngineReply::parse(
            r#"{"ok":true,"result":{"kind":"differentiation","symbolic_value":"2*x"}}"#,
        )
        .unwrap();
        let result = reply.into_result().unwrap();
        assert_eq!(result.symbolic_value(), "2*x");
    }

    #[test]
    fn test_reply_failure_becomes_evaluation_error() {
        let reply = EngineReply::parse(r#"{"ok":false,"error":"SympifyError: x+"}"#).unwrap();
        let err = reply.into_result().unwrap_err();
        assert!(matches!(err, EngineError::Evaluation { ref message } if message.contains("SympifyError")));
    }

    #[test]
    fn test_reply_failure_without_message() {
        let reply = EngineReply::parse(r#"{"ok":false}"#).unwrap();
        assert!(reply.into_ack().is_err());
    }

    #[test]
    fn test_reply_ok_without_result_is_protocol_error() {
        let reply = EngineReply::parse(r#"{"ok":true}"#).unwrap();
        assert!(matches!(
            reply.into_result(),
            Err(EngineError::Protocol { .. })
        ));
    }

    #[test]
    fn test_ready_greeting() {
        let reply = EngineReply::parse(r#"{"ok":true,"ready":true}"#).unwrap();
        assert!(reply.ready);
        assert!(reply.into_ack().is_ok());
    }

    #[test]
    fn test_garbage_reply() {
        assert!(matches!(
            EngineReply::parse("Traceback (most recent call last):"),
            Err(EngineError::Protocol { .. })
        ));
        assert!(matches!(
            EngineReply::parse("   "),
            Err(EngineError::Protocol { .. })
        ));
    }

    #[test]
    fn test_ensure_mode_mismatch() {
        let request = CalculationRequest::Differentiate(DifferentiationRequest {
            expression: "x".into(),
        });
        let result: CalculationResult = serde_json::from_str(
            r#"{"kind":"integration","symbolic_value":"1","monte_carlo_estimate":1.0,"lower_bound":0.0,"upper_bound":1.0}"#,
        )
        .unwrap();
        assert!(ensure_mode(&request, result).is_err());
    }
}
