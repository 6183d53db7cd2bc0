//! Math engine boundary
//!
//! The engine is an external collaborator: it receives a structured
//! request and answers with a [`CalculationResult`]. Everything that
//! crosses the boundary is JSON data fed to a fixed program
//! ([`ENGINE_PROGRAM`]); user text is never spliced into code.
//!
//! ```text
//! Controller ──► MathEngine::evaluate(request, plan)
//!                    │  EngineCommand (JSON line)
//!                    ▼
//!               engine program (SymPy + NumPy)
//!                    │  EngineReply   (JSON line)
//!                    ▼
//!               CalculationResult
//! ```

mod mock;
pub mod protocol;

#[cfg(feature = "native")]
pub mod process;

#[cfg(feature = "wasm")]
pub mod pyodide;

pub use mock::{EngineCall, MockEngine};

use crate::core::{CalculationRequest, CalculationResult, EngineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Program run inside the engine session. Defines `symcalc_handle` and,
/// when run as a script, a JSON-lines worker loop on stdin/stdout.
pub const ENGINE_PROGRAM: &str = include_str!("program.py");

/// Packages the session needs before the first evaluation, in load order
pub const REQUIRED_PACKAGES: [&str; 2] = ["sympy", "numpy"];

/// Numeric sampling parameters sent along with every evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlan {
    /// Monte Carlo batches averaged into the estimate
    pub simulations: u32,
    /// Plot domain `(start, end)`
    pub plot_domain: (f64, f64),
    /// Number of plot samples across the domain
    pub plot_points: u32,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            simulations: 10,
            plot_domain: (-10.0, 10.0),
            plot_points: 400,
        }
    }
}

/// A symbolic/numeric engine session.
///
/// Futures are not `Send`: the page runs on one thread and the browser
/// session is a JS object.
#[async_trait(?Send)]
pub trait MathEngine {
    /// Creates the session. Called once, before anything else.
    async fn open_session(&self) -> EngineResult<()>;

    /// Loads one package into the open session
    async fn load_package(&self, name: &str) -> EngineResult<()>;

    /// Runs one calculation
    async fn evaluate(
        &self,
        request: &CalculationRequest,
        plan: &SamplingPlan,
    ) -> EngineResult<CalculationResult>;

    /// Short name for logs
    fn name(&self) -> &str;
}
