//! Core types: calculation modes, requests, results and errors
//!
//! Nothing in here talks to the page or the engine; the controller and
//! the engine adapters are built on top of these types.

pub mod format;
pub mod request;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Result type for a calculation round-trip
pub type CalcResult<T> = Result<T, CalcError>;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Which calculation the page is set up for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMode {
    /// Definite integral between two bounds
    #[default]
    Integration,
    /// Symbolic derivative with respect to `x`
    Differentiation,
}

impl CalculationMode {
    /// Both modes, in selector order
    pub const ALL: [Self; 2] = [Self::Integration, Self::Differentiation];

    /// Value carried by the mode selector radio button
    #[must_use]
    pub const fn selector_value(self) -> &'static str {
        match self {
            Self::Integration => "integration",
            Self::Differentiation => "derivation",
        }
    }

    /// Parses a mode selector value
    #[must_use]
    pub fn from_selector_value(value: &str) -> Option<Self> {
        match value {
            "integration" => Some(Self::Integration),
            "derivation" | "differentiation" => Some(Self::Differentiation),
            _ => None,
        }
    }

    /// Element id of the input panel belonging to this mode
    #[must_use]
    pub const fn panel_id(self) -> &'static str {
        match self {
            Self::Integration => "integrationSection",
            Self::Differentiation => "derivationSection",
        }
    }

    /// Element id of the radio button selecting this mode
    #[must_use]
    pub const fn selector_id(self) -> &'static str {
        match self {
            Self::Integration => "calcType-integration",
            Self::Differentiation => "calcType-derivation",
        }
    }

    /// The other mode
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Integration => Self::Differentiation,
            Self::Differentiation => Self::Integration,
        }
    }
}

impl std::fmt::Display for CalculationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.selector_value())
    }
}

/// Definite integral request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRequest {
    /// Expression in `x`, passed to the engine verbatim
    pub expression: String,
    /// Lower integration bound (finite)
    pub lower_bound: f64,
    /// Upper integration bound (finite)
    pub upper_bound: f64,
    /// Uniform samples per Monte Carlo batch
    pub sample_count: u64,
}

/// Derivative request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentiationRequest {
    /// Expression in `x`, passed to the engine verbatim
    pub expression: String,
}

/// A validated request, ready for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalculationRequest {
    /// Integrate between bounds
    #[serde(rename = "integration")]
    Integrate(IntegrationRequest),
    /// Differentiate
    #[serde(rename = "differentiation")]
    Differentiate(DifferentiationRequest),
}

impl CalculationRequest {
    /// The mode this request belongs to
    #[must_use]
    pub const fn mode(&self) -> CalculationMode {
        match self {
            Self::Integrate(_) => CalculationMode::Integration,
            Self::Differentiate(_) => CalculationMode::Differentiation,
        }
    }

    /// The user's expression
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Integrate(r) => &r.expression,
            Self::Differentiate(r) => &r.expression,
        }
    }
}

/// Outcome of an integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResult {
    /// Closed-form value as printed by the engine
    pub symbolic_value: String,
    /// Monte Carlo estimate averaged over all batches, `NaN` if undefined
    #[serde(deserialize_with = "nullable_value")]
    pub monte_carlo_estimate: f64,
    /// Lower bound the integral was taken over
    pub lower_bound: f64,
    /// Upper bound the integral was taken over
    pub upper_bound: f64,
    /// Plot abscissae
    #[serde(default)]
    pub sampled_x: Vec<f64>,
    /// f(x) at each abscissa, `NaN` where undefined
    #[serde(default, deserialize_with = "nullable_samples")]
    pub sampled_y: Vec<f64>,
}

/// Outcome of a differentiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentiationResult {
    /// Derivative as printed by the engine
    pub symbolic_value: String,
    /// Plot abscissae
    #[serde(default)]
    pub sampled_x: Vec<f64>,
    /// f(x) at each abscissa, `NaN` where undefined
    #[serde(default, deserialize_with = "nullable_samples")]
    pub sampled_y: Vec<f64>,
    /// f'(x) at each abscissa, `NaN` where undefined
    #[serde(default, deserialize_with = "nullable_samples")]
    pub sampled_derivative_y: Vec<f64>,
}

/// Engine response, consumed once by the presenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalculationResult {
    /// Integral with approximation and samples
    Integration(IntegrationResult),
    /// Derivative with samples
    Differentiation(DifferentiationResult),
}

impl CalculationResult {
    /// Symbolic value of either variant
    #[must_use]
    pub fn symbolic_value(&self) -> &str {
        match self {
            Self::Integration(r) => &r.symbolic_value,
            Self::Differentiation(r) => &r.symbolic_value,
        }
    }

    /// Mode that produced this result
    #[must_use]
    pub const fn mode(&self) -> CalculationMode {
        match self {
            Self::Integration(_) => CalculationMode::Integration,
            Self::Differentiation(_) => CalculationMode::Differentiation,
        }
    }

    /// Whether there is anything to plot
    #[must_use]
    pub fn has_samples(&self) -> bool {
        match self {
            Self::Integration(r) => !r.sampled_x.is_empty() && !r.sampled_y.is_empty(),
            Self::Differentiation(r) => !r.sampled_x.is_empty() && !r.sampled_y.is_empty(),
        }
    }
}

/// `null` entries mark points where the function is undefined
fn nullable_samples<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn nullable_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Busy overlay projection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadingState {
    /// Overlay visible
    pub active: bool,
    /// Status line shown in the overlay
    pub message: String,
}

impl LoadingState {
    /// An active overlay with a message
    #[must_use]
    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            active: true,
            message: message.into(),
        }
    }

    /// A hidden overlay
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Form input that cannot become a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Expression field empty or whitespace
    #[error("Expression is empty")]
    EmptyExpression,

    /// Bound field does not hold a finite number
    #[error("Invalid {field} bound: {value:?}")]
    InvalidBound {
        /// Which bound (`lower` or `upper`)
        field: &'static str,
        /// Raw field content
        value: String,
    },
}

/// Anything that goes wrong on the engine side of the boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// No session has been opened yet, or it has gone away
    #[error("Engine session unavailable")]
    SessionUnavailable,

    /// Session creation failed
    #[error("Engine startup failed: {message}")]
    Startup {
        /// Error message
        message: String,
    },

    /// A package could not be loaded into the session
    #[error("Failed to load package {package}: {message}")]
    PackageLoad {
        /// Package name
        package: String,
        /// Error message
        message: String,
    },

    /// The engine rejected or failed to evaluate the expression
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Error message reported by the engine
        message: String,
    },

    /// Reply could not be understood
    #[error("Engine protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// Pipe to the engine process broke
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a startup error
    #[must_use]
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    /// Create a package load error
    #[must_use]
    pub fn package_load(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PackageLoad {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(err.to_string())
    }
}

/// Failure of one calculation, either side of the engine boundary
#[derive(Debug, Error)]
pub enum CalcError {
    /// Rejected before reaching the engine
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raised by the engine
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CalcError {
    /// Whether the engine was never called
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
