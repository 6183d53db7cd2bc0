//! Browser engine session: SymPy and NumPy on Pyodide
//!
//! `open_session` boots Pyodide and runs [`ENGINE_PROGRAM`] in a private
//! namespace; every later call goes through the program's
//! `symcalc_handle(payload)` with the same JSON envelope the native worker
//! uses.

use super::protocol::{ensure_mode, EngineCommand, EngineReply};
use super::{MathEngine, SamplingPlan, ENGINE_PROGRAM};
use crate::core::{CalculationRequest, CalculationResult, EngineError, EngineResult};
use async_trait::async_trait;
use js_sys::{Function, Object, Reflect};
use std::cell::RefCell;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = loadPyodide, catch)]
    async fn load_pyodide() -> Result<JsValue, JsValue>;

    #[derive(Debug, Clone)]
    type Pyodide;

    #[wasm_bindgen(method, catch, js_name = runPython)]
    fn run_python(this: &Pyodide, code: &str, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadPackage)]
    async fn load_package(this: &Pyodide, name: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn globals(this: &Pyodide) -> PyDict;

    #[derive(Debug, Clone)]
    type PyDict;

    #[wasm_bindgen(method, catch)]
    fn get(this: &PyDict, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn set(this: &PyDict, key: &str, value: &JsValue) -> Result<(), JsValue>;
}

/// Module name the program sees, so its worker loop stays off
const NAMESPACE_NAME: &str = "symcalc_engine";

#[derive(Debug, Clone)]
struct PyodideSession {
    pyodide: Pyodide,
    handler: Function,
}

/// Pyodide-backed [`MathEngine`]
#[derive(Debug, Default)]
pub struct PyodideEngine {
    session: RefCell<Option<PyodideSession>>,
}

impl PyodideEngine {
    /// Creates an engine; nothing is loaded until `open_session`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> EngineResult<PyodideSession> {
        self.session
            .borrow()
            .clone()
            .ok_or(EngineError::SessionUnavailable)
    }

    fn send(&self, command: &EngineCommand<'_>) -> EngineResult<EngineReply> {
        let session = self.session()?;
        let line = command.to_line()?;
        let reply = session
            .handler
            .call1(&JsValue::NULL, &JsValue::from_str(&line))
            .map_err(|e| EngineError::evaluation(js_message(&e)))?;
        let text = reply
            .as_string()
            .ok_or_else(|| EngineError::protocol("symcalc_handle returned a non-string"))?;
        EngineReply::parse(&text)
    }
}

fn install_program(pyodide: &Pyodide) -> Result<Function, JsValue> {
    let make_dict = pyodide.globals().get("dict")?.unchecked_into::<Function>();
    let namespace = make_dict.call0(&JsValue::NULL)?.unchecked_into::<PyDict>();
    namespace.set("__name__", &JsValue::from_str(NAMESPACE_NAME))?;

    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("globals"), &namespace)?;
    pyodide.run_python(ENGINE_PROGRAM, &options)?;

    let handler = namespace.get("symcalc_handle")?;
    if !handler.is_function() {
        return Err(JsValue::from_str("symcalc_handle is not callable"));
    }
    Ok(handler.unchecked_into())
}

/// Best-effort text of a thrown JS value
fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

#[async_trait(?Send)]
impl MathEngine for PyodideEngine {
    async fn open_session(&self) -> EngineResult<()> {
        info!("loading Pyodide");
        let pyodide = load_pyodide()
            .await
            .map_err(|e| EngineError::startup(js_message(&e)))?
            .unchecked_into::<Pyodide>();
        let handler =
            install_program(&pyodide).map_err(|e| EngineError::startup(js_message(&e)))?;
        *self.session.borrow_mut() = Some(PyodideSession { pyodide, handler });
        Ok(())
    }

    async fn load_package(&self, name: &str) -> EngineResult<()> {
        let session = self.session()?;
        debug!(package = name, "loading package");
        session
            .pyodide
            .load_package(name)
            .await
            .map_err(|e| EngineError::package_load(name, js_message(&e)))?;
        self.send(&EngineCommand::Load { package: name })?
            .into_ack()
            .map_err(|e| EngineError::package_load(name, e.to_string()))
    }

    async fn evaluate(
        &self,
        request: &CalculationRequest,
        plan: &SamplingPlan,
    ) -> EngineResult<CalculationResult> {
        debug!(mode = %request.mode(), "evaluating in Pyodide");
        let result = self
            .send(&EngineCommand::Evaluate { request, plan })?
            .into_result()?;
        ensure_mode(request, result)
    }

    fn name(&self) -> &str {
        "pyodide"
    }
}
