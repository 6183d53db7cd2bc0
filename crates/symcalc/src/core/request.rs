//! Request builder: form fields in, validated request out

use super::{
    CalculationMode, CalculationRequest, DifferentiationRequest, IntegrationRequest,
    ValidationError,
};

/// Raw text of the form fields at the moment the trigger fired
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    /// Integration panel expression
    pub integrand: String,
    /// Lower bound field
    pub lower_bound: String,
    /// Upper bound field
    pub upper_bound: String,
    /// Differentiation panel expression
    pub derivand: String,
}

impl FormValues {
    /// Form with only the integration panel filled in
    #[must_use]
    pub fn integration(expression: &str, lower: &str, upper: &str) -> Self {
        Self {
            integrand: expression.to_string(),
            lower_bound: lower.to_string(),
            upper_bound: upper.to_string(),
            derivand: String::new(),
        }
    }

    /// Form with only the differentiation panel filled in
    #[must_use]
    pub fn differentiation(expression: &str) -> Self {
        Self {
            derivand: expression.to_string(),
            ..Self::default()
        }
    }
}

/// Builds the request for `mode` from the current form.
///
/// Only the fields of the active panel are looked at. The expression is
/// trimmed; bounds must parse as finite `f64`.
pub fn build_request(
    mode: CalculationMode,
    form: &FormValues,
    sample_count: u64,
) -> Result<CalculationRequest, ValidationError> {
    match mode {
        CalculationMode::Integration => {
            let expression = non_empty(&form.integrand)?;
            let lower_bound = parse_bound("lower", &form.lower_bound)?;
            let upper_bound = parse_bound("upper", &form.upper_bound)?;
            Ok(CalculationRequest::Integrate(IntegrationRequest {
                expression,
                lower_bound,
                upper_bound,
                sample_count,
            }))
        }
        CalculationMode::Differentiation => {
            let expression = non_empty(&form.derivand)?;
            Ok(CalculationRequest::Differentiate(DifferentiationRequest {
                expression,
            }))
        }
    }
}

fn non_empty(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyExpression);
    }
    Ok(trimmed.to_string())
}

fn parse_bound(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidBound {
        field,
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}
