//! Scripted engine for tests and offline demos

use super::{MathEngine, SamplingPlan};
use crate::core::{CalculationRequest, CalculationResult, EngineError, EngineResult};
use crate::ui::scheduler::yield_now;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One call observed by a [`MockEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `open_session`
    OpenSession,
    /// `load_package(name)`
    LoadPackage(String),
    /// `evaluate(request, _)`
    Evaluate(CalculationRequest),
}

#[derive(Debug)]
enum Scripted {
    Reply(CalculationResult),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<EngineCall>,
    replies: VecDeque<Scripted>,
    fail_open: Option<String>,
    fail_package: Option<String>,
}

/// Engine that answers from a queue of scripted replies.
///
/// Clones share state, so a test can keep one handle and give the other
/// to the controller. Every call yields once before answering, like a
/// real session would.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Rc<RefCell<MockState>>,
}

impl MockEngine {
    /// Creates an engine with no scripted replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply
    #[must_use]
    pub fn with_reply(self, result: CalculationResult) -> Self {
        self.push_reply(result);
        self
    }

    /// Queues a failing reply
    #[must_use]
    pub fn with_failure(self, message: &str) -> Self {
        self.push_failure(message);
        self
    }

    /// Makes `open_session` fail
    #[must_use]
    pub fn failing_open(self, message: &str) -> Self {
        self.state.borrow_mut().fail_open = Some(message.to_string());
        self
    }

    /// Makes loading `package` fail
    #[must_use]
    pub fn failing_package(self, package: &str) -> Self {
        self.state.borrow_mut().fail_package = Some(package.to_string());
        self
    }

    /// Queues a successful reply
    pub fn push_reply(&self, result: CalculationResult) {
        self.state
            .borrow_mut()
            .replies
            .push_back(Scripted::Reply(result));
    }

    /// Queues a failing reply
    pub fn push_failure(&self, message: &str) {
        self.state
            .borrow_mut()
            .replies
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// All calls so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of `evaluate` calls so far
    #[must_use]
    pub fn evaluate_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, EngineCall::Evaluate(_)))
            .count()
    }

    /// Packages loaded so far, in order
    #[must_use]
    pub fn loaded_packages(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::LoadPackage(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

#[async_trait(?Send)]
impl MathEngine for MockEngine {
    async fn open_session(&self) -> EngineResult<()> {
        self.record(EngineCall::OpenSession);
        yield_now().await;
        match self.state.borrow().fail_open.clone() {
            Some(message) => Err(EngineError::startup(message)),
            None => Ok(()),
        }
    }

    async fn load_package(&self, name: &str) -> EngineResult<()> {
        self.record(EngineCall::LoadPackage(name.to_string()));
        yield_now().await;
        if self.state.borrow().fail_package.as_deref() == Some(name) {
            return Err(EngineError::package_load(name, "scripted failure"));
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        request: &CalculationRequest,
        _plan: &SamplingPlan,
    ) -> EngineResult<CalculationResult> {
        self.record(EngineCall::Evaluate(request.clone()));
        yield_now().await;
        let next = self.state.borrow_mut().replies.pop_front();
        match next {
            Some(Scripted::Reply(result)) => Ok(result),
            Some(Scripted::Fail(message)) => Err(EngineError::evaluation(message)),
            None => Err(EngineError::evaluation("no scripted reply")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DifferentiationRequest, DifferentiationResult};

    fn derivative(value: &str) -> CalculationResult {
        CalculationResult::Differentiation(DifferentiationResult {
            symbolic_value: value.into(),
            sampled_x: vec![],
            sampled_y: vec![],
            sampled_derivative_y: vec![],
        })
    }

    fn request() -> CalculationRequest {
        CalculationRequest::Differentiate(DifferentiationRequest {
            expression: "x**2".into(),
        })
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let engine = MockEngine::new()
            .with_reply(derivative("2*x"))
            .with_failure("boom");
        let plan = SamplingPlan::default();

        let first = engine.evaluate(&request(), &plan).await.unwrap();
        assert_eq!(first.symbolic_value(), "2*x");
        assert!(engine.evaluate(&request(), &plan).await.is_err());
        assert!(engine.evaluate(&request(), &plan).await.is_err());
        assert_eq!(engine.evaluate_count(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let engine = MockEngine::new();
        let handle = engine.clone();
        engine.open_session().await.unwrap();
        engine.load_package("sympy").await.unwrap();
        assert_eq!(
            handle.calls(),
            vec![
                EngineCall::OpenSession,
                EngineCall::LoadPackage("sympy".into())
            ]
        );
        assert_eq!(handle.loaded_packages(), vec!["sympy".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_open() {
        let engine = MockEngine::new().failing_open("no interpreter");
        assert!(matches!(
            engine.open_session().await,
            Err(EngineError::Startup { .. })
        ));
    }

    #[tokio::test]
    async fn test_failing_package() {
        let engine = MockEngine::new().failing_package("numpy");
        assert!(engine.load_package("sympy").await.is_ok());
        assert!(matches!(
            engine.load_package("numpy").await,
            Err(EngineError::PackageLoad { ref package, .. }) if package == "numpy"
        ));
    }

    #[test]
    fn test_name() {
        assert_eq!(MockEngine::new().name(), "mock");
    }
}
