//! Symcalc - Integral and Derivative Calculator Page
//!
//! This crate wires a calculator page to an embedded symbolic engine
//! (SymPy + NumPy on Pyodide in the browser, or a Python worker process
//! natively). The page logic never computes anything symbolic itself:
//! it reads the form, builds a structured request, hands it to the
//! engine, and renders what comes back through MathJax and Plotly.
//!
//! # Layout
//!
//! - [`core`]: formatter, request builder, result types and errors
//! - [`engine`]: the `MathEngine` boundary and its sessions
//! - [`ui`]: page surface, presenter and the controller state machine
//! - [`config`]: page configuration
//!
//! # Example
//!
//! ```rust
//! use symcalc::prelude::*;
//!
//! assert_eq!(format_expression("8/3"), r"\frac{8}{3}");
//!
//! let form = FormValues::integration("x**2", "0", "2");
//! let request = build_request(CalculationMode::Integration, &form, 1000).unwrap();
//! assert!(matches!(request, CalculationRequest::Integrate(_)));
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::float_cmp
    )
)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod core;
pub mod engine;
#[cfg(feature = "native")]
pub mod logging;
pub mod ui;

#[cfg(feature = "wasm")]
pub mod wasm;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{CalculatorConfig, ConfigError, Verbosity};
    pub use crate::core::format::format_expression;
    pub use crate::core::request::{build_request, FormValues};
    pub use crate::core::{
        CalcError, CalcResult, CalculationMode, CalculationRequest, CalculationResult,
        DifferentiationRequest, DifferentiationResult, EngineError, IntegrationRequest,
        IntegrationResult, LoadingState, ValidationError,
    };
    pub use crate::engine::{MathEngine, MockEngine, SamplingPlan};
    pub use crate::ui::collab::{
        Charter, PlotSeries, PlotStyle, RecordingCharter, RecordingTypesetter, Typesetter,
    };
    pub use crate::ui::controller::{Controller, RejectReason, TriggerOutcome};
    pub use crate::ui::dom::{DomElement, DomEvent, MockDom};
    pub use crate::ui::locale::Locale;
    pub use crate::ui::page::PageSurface;
    pub use crate::ui::presenter::Presenter;
    pub use crate::ui::scheduler::{ImmediateScheduler, Scheduler};

    #[cfg(feature = "native")]
    pub use crate::engine::process::ProcessEngine;
    #[cfg(feature = "native")]
    pub use crate::ui::scheduler::TokioScheduler;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        assert_eq!(format_expression("a/b"), r"\frac{a}{b}");
        assert_eq!(CalculationMode::default(), CalculationMode::Integration);
    }

    #[test]
    fn test_builder_through_prelude() {
        let form = FormValues::differentiation("x**2");
        let request = build_request(CalculationMode::Differentiation, &form, 10).unwrap();
        assert_eq!(request.expression(), "x**2");
    }
}
