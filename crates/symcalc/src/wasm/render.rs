//! MathJax, Plotly and `setTimeout` bindings

use crate::ui::collab::{Charter, PlotSeries, PlotStyle, RenderError, Typesetter};
use crate::ui::scheduler::Scheduler;
use async_trait::async_trait;
use js_sys::{Array, Function, Promise};
use serde_json::{json, Value};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = MathJax, js_name = typesetPromise, catch)]
    fn typeset_promise(elements: &Array) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = Plotly, js_name = newPlot, catch)]
    fn new_plot(target: &str, data: &JsValue, layout: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = Plotly, catch)]
    fn purge(target: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = setTimeout)]
    fn set_timeout(handler: &Function, ms: i32) -> i32;
}

fn render_error(value: &JsValue) -> RenderError {
    RenderError::new(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// MathJax v3 `typesetPromise`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathJaxTypesetter;

#[async_trait(?Send)]
impl Typesetter for MathJaxTypesetter {
    async fn typeset(&self, region_id: &str) -> Result<(), RenderError> {
        let selector = JsValue::from_str(&format!("#{region_id}"));
        let promise = typeset_promise(&Array::of1(&selector)).map_err(|e| render_error(&e))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| render_error(&e))
    }
}

/// Plotly `newPlot` / `purge`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyCharter;

/// Plotly trace objects for `series`
pub fn plotly_traces(series: &[PlotSeries]) -> Value {
    Value::Array(
        series
            .iter()
            .map(|s| {
                let mut trace = json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": s.name,
                    "x": s.x,
                    "y": s.y,
                });
                if s.style == PlotStyle::FillToZero {
                    trace["fill"] = json!("tozeroy");
                }
                trace
            })
            .collect(),
    )
}

impl Charter for PlotlyCharter {
    fn draw(&self, target: &str, series: &[PlotSeries]) -> Result<(), RenderError> {
        let data = js_sys::JSON::parse(&plotly_traces(series).to_string())
            .map_err(|e| render_error(&e))?;
        let layout = js_sys::JSON::parse(r#"{"margin":{"t":24}}"#).map_err(|e| render_error(&e))?;
        // The returned promise only signals completion of the drawing
        new_plot(target, &data, &layout)
            .map(|_| ())
            .map_err(|e| render_error(&e))
    }

    fn clear(&self, target: &str) {
        let _ = purge(target);
    }
}

/// `setTimeout`-based paint pause
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

#[async_trait(?Send)]
impl Scheduler for BrowserScheduler {
    async fn yield_to_renderer(&self, delay: Duration) {
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve, _reject| {
            set_timeout(&resolve, ms);
        });
        let _ = JsFuture::from(promise).await;
    }
}
