//! UI state controller
//!
//! Owns the calculation mode, the busy flag and the engine session. The page
//! moves through `Busy(loading)` at startup, then alternates between `Idle`
//! and `Busy(calculating)`; a trigger while busy or before the engine is
//! ready is rejected without side effects.

use super::dom::{DomEvent, MockDom};
use super::page::{ids, PageSurface};
use super::presenter::Presenter;
use super::scheduler::Scheduler;
use crate::config::CalculatorConfig;
use crate::core::request::{build_request, FormValues};
use crate::core::{CalcError, CalcResult, CalculationMode, EngineResult, LoadingState};
use crate::engine::{MathEngine, REQUIRED_PACKAGES};
use std::cell::{Ref, RefCell, RefMut};
use tracing::{debug, info, warn};

/// Mutable page state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Active mode
    pub mode: CalculationMode,
    /// Busy overlay state
    pub loading: LoadingState,
    /// Engine session open and packages loaded
    pub ready: bool,
    /// `start` has been called
    pub started: bool,
    /// Bumped whenever the displayed result is cleared by a mode selection
    pub generation: u64,
}

impl UiState {
    #[cfg(test)]
    pub(crate) fn ready_for_tests() -> Self {
        Self {
            ready: true,
            started: true,
            ..Self::default()
        }
    }
}

/// Holds the page in the busy state until dropped.
///
/// Dropping hides the overlay and re-enables the trigger if the engine is
/// ready, on every exit path.
pub struct BusyGuard<'a, P: PageSurface> {
    state: &'a RefCell<UiState>,
    page: &'a RefCell<P>,
}

impl<P: PageSurface> std::fmt::Debug for BusyGuard<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusyGuard")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, P: PageSurface> BusyGuard<'a, P> {
    /// Marks the page busy with `message`
    pub fn acquire(state: &'a RefCell<UiState>, page: &'a RefCell<P>, message: &str) -> Self {
        state.borrow_mut().loading = LoadingState::busy(message);
        {
            let mut page = page.borrow_mut();
            page.set_text(ids::LOADING_INDICATOR, message);
            page.set_visible(ids::LOADING_OVERLAY, true);
            page.set_disabled(ids::CALCULATE, true);
        }
        Self { state, page }
    }
}

impl<P: PageSurface> Drop for BusyGuard<'_, P> {
    fn drop(&mut self) {
        let ready = match self.state.try_borrow_mut() {
            Ok(mut state) => {
                state.loading = LoadingState::idle();
                state.ready
            }
            Err(_) => false,
        };
        if let Ok(mut page) = self.page.try_borrow_mut() {
            page.set_visible(ids::LOADING_OVERLAY, false);
            page.set_text(ids::LOADING_INDICATOR, "");
            page.set_disabled(ids::CALCULATE, !ready);
        }
    }
}

/// Why a trigger was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A calculation is already running
    Busy,
    /// The engine has not finished starting
    NotReady,
}

/// What happened to one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A result was displayed
    Completed,
    /// The error indicator was displayed
    Failed,
    /// A mode selection cleared the page before the outcome was fully shown
    Superseded,
    /// Nothing happened
    Rejected(RejectReason),
}

/// Calculator page controller
pub struct Controller<P: PageSurface> {
    page: RefCell<P>,
    state: RefCell<UiState>,
    engine: Box<dyn MathEngine>,
    scheduler: Box<dyn Scheduler>,
    presenter: Presenter,
    config: CalculatorConfig,
}

impl<P: PageSurface> std::fmt::Debug for Controller<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("engine", &self.engine.name())
            .field("presenter", &self.presenter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: PageSurface> Controller<P> {
    /// Creates a controller in its initial state: loading, integration mode,
    /// trigger disabled
    pub fn new(
        page: P,
        engine: impl MathEngine + 'static,
        presenter: Presenter,
        config: CalculatorConfig,
    ) -> Self {
        let controller = Self {
            page: RefCell::new(page),
            state: RefCell::new(UiState::default()),
            engine: Box::new(engine),
            scheduler: default_scheduler(),
            presenter,
            config,
        };
        let loading = controller.config.locale.loading();
        controller.state.borrow_mut().loading = LoadingState::busy(loading);
        {
            let mut page = controller.page.borrow_mut();
            page.set_text(ids::LOADING_INDICATOR, loading);
            page.set_visible(ids::LOADING_OVERLAY, true);
            page.set_disabled(ids::CALCULATE, true);
        }
        controller.apply_mode(CalculationMode::Integration);
        controller
    }

    /// Replaces the paint-pause scheduler
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    /// Opens the engine session and loads the packages. Runs once; later
    /// calls return immediately.
    pub async fn start(&self) -> CalcResult<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.started {
                debug!("start called again, ignoring");
                return Ok(());
            }
            state.started = true;
        }

        let busy = BusyGuard::acquire(&self.state, &self.page, self.config.locale.loading());
        info!(engine = self.engine.name(), "starting engine session");

        match self.open_engine().await {
            Ok(()) => {
                self.state.borrow_mut().ready = true;
                info!("engine ready");
                drop(busy);
                Ok(())
            }
            Err(e) => {
                let err = CalcError::from(e);
                self.presenter.show_failure(&self.page, &err);
                drop(busy);
                Err(err)
            }
        }
    }

    async fn open_engine(&self) -> EngineResult<()> {
        self.engine.open_session().await?;
        for package in REQUIRED_PACKAGES {
            debug!(package, "loading package");
            self.engine.load_package(package).await?;
        }
        Ok(())
    }

    /// Switches mode. Always clears the result and plot, also when `mode` is
    /// already active.
    pub fn select_mode(&self, mode: CalculationMode) {
        info!(%mode, "mode selected");
        self.apply_mode(mode);
    }

    fn apply_mode(&self, mode: CalculationMode) {
        {
            let mut state = self.state.borrow_mut();
            state.mode = mode;
            state.generation = state.generation.wrapping_add(1);
        }
        {
            let mut page = self.page.borrow_mut();
            page.set_visible(mode.panel_id(), true);
            page.set_visible(mode.other().panel_id(), false);
            page.set_checked(mode.selector_id(), true);
            page.set_checked(mode.other().selector_id(), false);
            page.set_text(ids::TITLE, self.config.locale.title(mode));
        }
        self.presenter.clear(&self.page);
    }

    /// Runs one calculation for the active mode
    pub async fn trigger(&self) -> TriggerOutcome {
        {
            let state = self.state.borrow();
            if !state.ready {
                warn!("trigger before engine ready");
                return TriggerOutcome::Rejected(RejectReason::NotReady);
            }
            if state.loading.active {
                debug!("trigger while busy");
                return TriggerOutcome::Rejected(RejectReason::Busy);
            }
        }

        let mode = self.mode();
        let generation = self.generation();
        let busy = BusyGuard::acquire(
            &self.state,
            &self.page,
            self.config.locale.calculating(),
        );
        self.scheduler
            .yield_to_renderer(self.config.paint_delay())
            .await;

        let form = read_form(&*self.page.borrow());
        let outcome = match build_request(mode, &form, self.config.monte_carlo.sample_count) {
            Ok(request) => {
                debug!(%mode, expression = request.expression(), "evaluating");
                self.engine
                    .evaluate(&request, &self.config.sampling_plan())
                    .await
                    .map_err(CalcError::from)
            }
            Err(e) => Err(CalcError::from(e)),
        };

        if self.generation() != generation {
            info!(%mode, "mode changed during calculation, discarding outcome");
            drop(busy);
            return TriggerOutcome::Superseded;
        }

        let failed = outcome.is_err();
        let shown = self
            .presenter
            .present(&self.page, outcome, busy, || self.generation() == generation)
            .await;
        if !shown {
            info!(%mode, "mode changed while typesetting, plot skipped");
            TriggerOutcome::Superseded
        } else if failed {
            TriggerOutcome::Failed
        } else {
            TriggerOutcome::Completed
        }
    }

    /// Routes a page event: mode radio changes and trigger clicks
    pub async fn handle_event(&self, event: &DomEvent) -> Option<TriggerOutcome> {
        match event {
            DomEvent::Change { value, .. } => {
                if let Some(mode) = CalculationMode::from_selector_value(value) {
                    self.select_mode(mode);
                }
                None
            }
            DomEvent::Click { element_id } if element_id == ids::CALCULATE => {
                Some(self.trigger().await)
            }
            _ => None,
        }
    }

    /// Borrow the page
    pub fn page(&self) -> Ref<'_, P> {
        self.page.borrow()
    }

    /// Borrow the page mutably
    pub fn page_mut(&self) -> RefMut<'_, P> {
        self.page.borrow_mut()
    }

    /// Active mode
    pub fn mode(&self) -> CalculationMode {
        self.state.borrow().mode
    }

    /// Counter of result-clearing mode selections
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Current busy state
    pub fn loading_state(&self) -> LoadingState {
        self.state.borrow().loading.clone()
    }

    /// Whether startup has completed
    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Whether the page is busy
    pub fn is_busy(&self) -> bool {
        self.state.borrow().loading.active
    }

    /// Configuration in use
    pub const fn config(&self) -> &CalculatorConfig {
        &self.config
    }
}

impl Controller<MockDom> {
    /// Applies `event` to the mock page, then routes it
    pub async fn dispatch(&self, event: DomEvent) -> Option<TriggerOutcome> {
        self.page.borrow_mut().dispatch_event(event.clone());
        self.handle_event(&event).await
    }
}

/// Snapshot of the form fields
pub fn read_form<P: PageSurface>(page: &P) -> FormValues {
    FormValues {
        integrand: page.input_value(ids::INTEGRAND),
        lower_bound: page.input_value(ids::LOWER_BOUND),
        upper_bound: page.input_value(ids::UPPER_BOUND),
        derivand: page.input_value(ids::DERIVAND),
    }
}

#[cfg(feature = "native")]
fn default_scheduler() -> Box<dyn Scheduler> {
    Box::new(super::scheduler::TokioScheduler)
}

#[cfg(not(feature = "native"))]
fn default_scheduler() -> Box<dyn Scheduler> {
    Box::new(super::scheduler::ImmediateScheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DifferentiationResult, EngineError, IntegrationResult};
    use crate::engine::{EngineCall, MockEngine};
    use crate::ui::collab::{
        ChartCall, RecordingCharter, RecordingTypesetter, RenderError, Typesetter,
    };
    use crate::ui::locale::Locale;
    use crate::ui::scheduler::{yield_now, ImmediateScheduler};
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::rc::Rc;

    fn integral() -> crate::core::CalculationResult {
        crate::core::CalculationResult::Integration(IntegrationResult {
            symbolic_value: "8/3".into(),
            monte_carlo_estimate: 2.6667,
            lower_bound: 0.0,
            upper_bound: 2.0,
            sampled_x: vec![0.0, 1.0, 2.0],
            sampled_y: vec![0.0, 1.0, 4.0],
        })
    }

    fn derivative() -> crate::core::CalculationResult {
        crate::core::CalculationResult::Differentiation(DifferentiationResult {
            symbolic_value: "2*x".into(),
            sampled_x: vec![0.0, 1.0],
            sampled_y: vec![0.0, 1.0],
            sampled_derivative_y: vec![0.0, 2.0],
        })
    }

    fn controller(engine: MockEngine) -> (Controller<MockDom>, RecordingCharter) {
        let charter = RecordingCharter::new();
        let presenter = Presenter::new(RecordingTypesetter::new(), charter.clone(), Locale::En);
        let controller = Controller::new(
            MockDom::calculator_page(),
            engine,
            presenter,
            CalculatorConfig::default().with_paint_delay_ms(0),
        )
        .with_scheduler(ImmediateScheduler);
        (controller, charter)
    }

    #[test]
    fn test_initial_state() {
        let (c, _) = controller(MockEngine::new());
        assert_eq!(c.mode(), CalculationMode::Integration);
        assert!(c.is_busy());
        assert!(!c.is_ready());
        assert_eq!(c.loading_state().message, "Loading...");
        let page = c.page();
        assert!(page.is_disabled(ids::CALCULATE));
        assert!(page.is_visible(ids::LOADING_OVERLAY));
        assert!(page.is_visible("integrationSection"));
        assert!(!page.is_visible("derivationSection"));
        assert_eq!(page.get_element_text(ids::TITLE), Some("Integral Calculator"));
    }

    #[tokio::test]
    async fn test_start_loads_packages_in_order() {
        let engine = MockEngine::new();
        let (c, _) = controller(engine.clone());
        c.start().await.unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::OpenSession,
                EngineCall::LoadPackage("sympy".into()),
                EngineCall::LoadPackage("numpy".into()),
            ]
        );
        assert!(c.is_ready());
        assert!(!c.is_busy());
        assert!(!c.page().is_disabled(ids::CALCULATE));
        assert!(!c.page().is_visible(ids::LOADING_OVERLAY));
    }

    #[tokio::test]
    async fn test_start_runs_once() {
        let engine = MockEngine::new();
        let (c, _) = controller(engine.clone());
        c.start().await.unwrap();
        c.start().await.unwrap();
        assert_eq!(engine.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_start_failure_keeps_trigger_disabled() {
        let engine = MockEngine::new().failing_package("numpy");
        let (c, _) = controller(engine);
        let err = c.start().await.unwrap_err();
        assert!(matches!(
            err,
            CalcError::Engine(EngineError::PackageLoad { .. })
        ));
        assert!(!c.is_ready());
        assert!(!c.is_busy());
        let page = c.page();
        assert!(page.is_disabled(ids::CALCULATE));
        assert!(!page.is_visible(ids::LOADING_OVERLAY));
        assert!(page
            .get_inner_html(ids::RESULT)
            .unwrap()
            .contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_trigger_before_ready_is_rejected() {
        let engine = MockEngine::new();
        let (c, _) = controller(engine.clone());
        assert_eq!(
            c.trigger().await,
            TriggerOutcome::Rejected(RejectReason::NotReady)
        );
        assert_eq!(engine.evaluate_count(), 0);
    }

    #[tokio::test]
    async fn test_trigger_integration() {
        let engine = MockEngine::new().with_reply(integral());
        let (c, charter) = controller(engine.clone());
        c.start().await.unwrap();
        c.dispatch(DomEvent::input(ids::INTEGRAND, "x**2")).await;
        c.dispatch(DomEvent::input(ids::LOWER_BOUND, "0")).await;
        c.dispatch(DomEvent::input(ids::UPPER_BOUND, "2")).await;

        let outcome = c.dispatch(DomEvent::click(ids::CALCULATE)).await;
        assert_eq!(outcome, Some(TriggerOutcome::Completed));
        assert!(c
            .page()
            .get_inner_html(ids::RESULT)
            .unwrap()
            .contains(r"\frac{8}{3}"));
        assert_eq!(charter.current_plot().unwrap().len(), 2);
        assert!(!c.is_busy());
        assert!(!c.page().is_disabled(ids::CALCULATE));

        match engine.calls().last() {
            Some(EngineCall::Evaluate(request)) => {
                assert_eq!(request.expression(), "x**2");
                assert_eq!(request.mode(), CalculationMode::Integration);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_trigger_rejected() {
        let engine = MockEngine::new().with_reply(derivative());
        let (c, _) = controller(engine.clone());
        c.start().await.unwrap();
        c.select_mode(CalculationMode::Differentiation);
        c.page_mut().type_into(ids::DERIVAND, "x**2");

        let (first, second) = tokio::join!(c.trigger(), c.trigger());
        assert_eq!(first, TriggerOutcome::Completed);
        assert_eq!(second, TriggerOutcome::Rejected(RejectReason::Busy));
        assert_eq!(engine.evaluate_count(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_engine() {
        let engine = MockEngine::new();
        let (c, charter) = controller(engine.clone());
        c.start().await.unwrap();
        c.page_mut().type_into(ids::INTEGRAND, "x");
        c.page_mut().type_into(ids::LOWER_BOUND, "abc");
        c.page_mut().type_into(ids::UPPER_BOUND, "1");

        assert_eq!(c.trigger().await, TriggerOutcome::Failed);
        assert_eq!(engine.evaluate_count(), 0);
        assert!(c
            .page()
            .get_inner_html(ids::RESULT)
            .unwrap()
            .contains("Something went wrong"));
        assert!(charter.current_plot().is_none());
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn test_engine_failure_then_recovery() {
        let engine = MockEngine::new()
            .with_failure("SympifyError: bad input")
            .with_reply(derivative());
        let (c, _) = controller(engine);
        c.start().await.unwrap();
        c.select_mode(CalculationMode::Differentiation);
        c.page_mut().type_into(ids::DERIVAND, "x**");

        assert_eq!(c.trigger().await, TriggerOutcome::Failed);
        assert!(!c.page().is_disabled(ids::CALCULATE));

        c.page_mut().type_into(ids::DERIVAND, "x**2");
        assert_eq!(c.trigger().await, TriggerOutcome::Completed);
        assert!(c
            .page()
            .get_inner_html(ids::RESULT)
            .unwrap()
            .contains("f'(x) = 2*x"));
    }

    #[tokio::test]
    async fn test_select_mode_clears_and_toggles() {
        let engine = MockEngine::new().with_reply(integral());
        let (c, charter) = controller(engine);
        c.start().await.unwrap();
        c.page_mut().type_into(ids::INTEGRAND, "x**2");
        c.page_mut().type_into(ids::LOWER_BOUND, "0");
        c.page_mut().type_into(ids::UPPER_BOUND, "2");
        c.trigger().await;

        c.dispatch(DomEvent::select_mode(CalculationMode::Differentiation))
            .await;
        assert_eq!(c.mode(), CalculationMode::Differentiation);
        {
            let page = c.page();
            assert_eq!(page.get_inner_html(ids::RESULT), Some(""));
            assert!(page.is_visible("derivationSection"));
            assert!(!page.is_visible("integrationSection"));
            assert!(page.is_checked("calcType-derivation"));
            assert!(!page.is_checked("calcType-integration"));
            assert_eq!(
                page.get_element_text(ids::TITLE),
                Some("Derivative Calculator")
            );
        }
        assert!(charter.current_plot().is_none());
    }

    #[tokio::test]
    async fn test_reselect_same_mode_clears() {
        let engine = MockEngine::new().with_reply(integral());
        let (c, _) = controller(engine);
        c.start().await.unwrap();
        c.page_mut().type_into(ids::INTEGRAND, "x**2");
        c.page_mut().type_into(ids::LOWER_BOUND, "0");
        c.page_mut().type_into(ids::UPPER_BOUND, "2");
        c.trigger().await;
        assert!(!c.page().get_inner_html(ids::RESULT).unwrap().is_empty());

        c.select_mode(CalculationMode::Integration);
        assert_eq!(c.page().get_inner_html(ids::RESULT), Some(""));
    }

    #[tokio::test]
    async fn test_mode_change_during_calculation_supersedes() {
        let engine = MockEngine::new().with_reply(derivative());
        let (c, charter) = controller(engine);
        c.start().await.unwrap();
        c.select_mode(CalculationMode::Differentiation);
        c.page_mut().type_into(ids::DERIVAND, "x**2");

        let switch = async {
            crate::ui::scheduler::yield_now().await;
            c.select_mode(CalculationMode::Integration);
        };
        let (outcome, ()) = tokio::join!(c.trigger(), switch);
        assert_eq!(outcome, TriggerOutcome::Superseded);
        assert_eq!(c.page().get_inner_html(ids::RESULT), Some(""));
        assert!(charter.current_plot().is_none());
        assert!(!c.is_busy());
    }

    /// Typesetter that stays pending until its gate opens
    #[derive(Debug, Clone, Default)]
    struct GatedTypesetter {
        open: Rc<Cell<bool>>,
    }

    #[async_trait(?Send)]
    impl Typesetter for GatedTypesetter {
        async fn typeset(&self, _region_id: &str) -> Result<(), RenderError> {
            while !self.open.get() {
                yield_now().await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mode_change_while_typesetting_skips_plot() {
        let typesetter = GatedTypesetter::default();
        let gate = typesetter.open.clone();
        let charter = RecordingCharter::new();
        let presenter = Presenter::new(typesetter, charter.clone(), Locale::En);
        let c = Controller::new(
            MockDom::calculator_page(),
            MockEngine::new().with_reply(derivative()),
            presenter,
            CalculatorConfig::default().with_paint_delay_ms(0),
        )
        .with_scheduler(ImmediateScheduler);
        c.start().await.unwrap();
        c.select_mode(CalculationMode::Differentiation);
        c.page_mut().type_into(ids::DERIVAND, "x**2");

        let switch = async {
            while !c
                .page()
                .get_inner_html(ids::RESULT)
                .is_some_and(|html| html.contains("f'(x)"))
            {
                yield_now().await;
            }
            c.select_mode(CalculationMode::Integration);
            gate.set(true);
        };
        let (outcome, ()) = tokio::join!(c.trigger(), switch);

        assert_eq!(outcome, TriggerOutcome::Superseded);
        assert_eq!(c.mode(), CalculationMode::Integration);
        assert_eq!(c.page().get_inner_html(ids::RESULT), Some(""));
        assert!(charter.current_plot().is_none());
        assert!(charter
            .calls()
            .iter()
            .all(|call| !matches!(call, ChartCall::Draw { .. })));
        assert!(!c.is_busy());
    }

    #[test]
    fn test_generation_bumps_on_every_selection() {
        let (c, _) = controller(MockEngine::new());
        let before = c.generation();
        c.select_mode(CalculationMode::Integration);
        c.select_mode(CalculationMode::Differentiation);
        assert_eq!(c.generation(), before + 2);
    }

    #[tokio::test]
    async fn test_unrelated_events_ignored() {
        let (c, _) = controller(MockEngine::new());
        assert_eq!(c.dispatch(DomEvent::click(ids::RESULT)).await, None);
        assert_eq!(c.dispatch(DomEvent::input(ids::INTEGRAND, "x")).await, None);
        assert_eq!(c.page().input_value(ids::INTEGRAND), "x");
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let state = RefCell::new(UiState::ready_for_tests());
        let page = RefCell::new(MockDom::calculator_page());
        {
            let _busy = BusyGuard::acquire(&state, &page, "Calculating...");
            assert!(state.borrow().loading.active);
            assert_eq!(
                page.borrow().get_element_text(ids::LOADING_INDICATOR),
                Some("Calculating...")
            );
        }
        assert!(!state.borrow().loading.active);
        assert!(!page.borrow().is_visible(ids::LOADING_OVERLAY));
        assert!(!page.borrow().is_disabled(ids::CALCULATE));
    }

    #[test]
    fn test_read_form() {
        let mut page = MockDom::calculator_page();
        page.type_into(ids::INTEGRAND, "sin(x)");
        page.type_into(ids::DERIVAND, "cos(x)");
        let form = read_form(&page);
        assert_eq!(form.integrand, "sin(x)");
        assert_eq!(form.derivand, "cos(x)");
        assert_eq!(form.lower_bound, "");
    }
}
