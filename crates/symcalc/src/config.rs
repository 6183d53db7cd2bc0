//! Page configuration
//!
//! Everything here has a default matching the stock page; a config file
//! (YAML) or an inline JSON block only needs the fields it changes.

use crate::engine::SamplingPlan;
use crate::ui::locale::Locale;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed
    #[error("Configuration parse error: {message}")]
    Parse {
        /// Error message
        message: String,
    },

    /// A value is out of range
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a parse error
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Lifecycle events
    #[default]
    Normal,
    /// Engine round-trips
    Verbose,
    /// Everything
    Debug,
}

impl Verbosity {
    /// Default filter directive for this verbosity
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Monte Carlo cross-check settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Uniform samples per batch
    pub sample_count: u64,
    /// Batches averaged into the estimate
    pub simulations: u32,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            sample_count: 999_999,
            simulations: 10,
        }
    }
}

/// Plot sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Left end of the plotted domain
    pub domain_start: f64,
    /// Right end of the plotted domain
    pub domain_end: f64,
    /// Samples across the domain
    pub points: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            domain_start: -10.0,
            domain_end: 10.0,
            points: 400,
        }
    }
}

/// Calculator page configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Page language
    pub locale: Locale,
    /// Pause before a calculation so the overlay can paint (ms)
    pub paint_delay_ms: u64,
    /// Monte Carlo settings
    pub monte_carlo: MonteCarloConfig,
    /// Plot settings
    pub plot: PlotConfig,
    /// Interpreter for the native worker session
    pub python: String,
    /// Log verbosity
    pub verbosity: Verbosity,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            paint_delay_ms: 10,
            monte_carlo: MonteCarloConfig::default(),
            plot: PlotConfig::default(),
            python: "python3".to_string(),
            verbosity: Verbosity::Normal,
        }
    }
}

impl CalculatorConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set locale
    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set paint delay
    #[must_use]
    pub const fn with_paint_delay_ms(mut self, ms: u64) -> Self {
        self.paint_delay_ms = ms;
        self
    }

    /// Set Monte Carlo sample count and batch count
    #[must_use]
    pub const fn with_monte_carlo(mut self, sample_count: u64, simulations: u32) -> Self {
        self.monte_carlo.sample_count = sample_count;
        self.monte_carlo.simulations = simulations;
        self
    }

    /// Set plot domain and resolution
    #[must_use]
    pub fn with_plot(mut self, start: f64, end: f64, points: u32) -> Self {
        self.plot.domain_start = start;
        self.plot.domain_end = end;
        self.plot.points = points;
        self
    }

    /// Set the worker interpreter
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Parses and validates a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monte_carlo.sample_count == 0 {
            return Err(ConfigError::invalid("monte_carlo.sample_count must be > 0"));
        }
        if self.monte_carlo.simulations == 0 {
            return Err(ConfigError::invalid("monte_carlo.simulations must be > 0"));
        }
        if !self.plot.domain_start.is_finite() || !self.plot.domain_end.is_finite() {
            return Err(ConfigError::invalid("plot domain must be finite"));
        }
        if self.plot.domain_start >= self.plot.domain_end {
            return Err(ConfigError::invalid(
                "plot.domain_start must be below plot.domain_end",
            ));
        }
        if self.plot.points < 2 {
            return Err(ConfigError::invalid("plot.points must be at least 2"));
        }
        if self.python.trim().is_empty() {
            return Err(ConfigError::invalid("python must name an interpreter"));
        }
        Ok(())
    }

    /// Pause before each calculation
    #[must_use]
    pub const fn paint_delay(&self) -> Duration {
        Duration::from_millis(self.paint_delay_ms)
    }

    /// Sampling parameters sent with every evaluation
    #[must_use]
    pub fn sampling_plan(&self) -> SamplingPlan {
        SamplingPlan {
            simulations: self.monte_carlo.simulations,
            plot_domain: (self.plot.domain_start, self.plot.domain_end),
            plot_points: self.plot.points,
        }
    }
}
