//! Browser entry point
//!
//! Binds the controller to the real document, Pyodide, MathJax and Plotly,
//! then wires the mode radios and the calculate button.

mod page;
mod render;

pub use page::{BrowserPage, CONFIG_SCRIPT_ID};
pub use render::{plotly_traces, BrowserScheduler, MathJaxTypesetter, PlotlyCharter};

use crate::config::CalculatorConfig;
use crate::core::CalculationMode;
use crate::engine::pyodide::PyodideEngine;
use crate::ui::controller::Controller;
use crate::ui::dom::DomEvent;
use crate::ui::page::ids;
use crate::ui::presenter::Presenter;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use tracing::{error, info};
use web_sys::{Document, Event};

type BrowserController = Controller<BrowserPage>;

/// Initialize the calculator in the browser
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let page = BrowserPage::from_window()?;
    let document = page.document().clone();
    let config = match page.inline_config() {
        Some(text) => CalculatorConfig::from_json_str(&text)
            .map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => CalculatorConfig::default(),
    };
    // tracing events fall through to `log` when no subscriber is installed
    let level = config
        .verbosity
        .filter_directive()
        .parse()
        .unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"symcalc: logger already installed".into());
    }

    let presenter = Presenter::new(MathJaxTypesetter, PlotlyCharter, config.locale);
    let controller: Rc<BrowserController> = Rc::new(
        Controller::new(page, PyodideEngine::new(), presenter, config)
            .with_scheduler(BrowserScheduler),
    );

    for mode in CalculationMode::ALL {
        listen(&document, mode.selector_id(), "change", &controller, move || {
            DomEvent::select_mode(mode)
        })?;
    }
    listen(&document, ids::CALCULATE, "click", &controller, || {
        DomEvent::click(ids::CALCULATE)
    })?;

    spawn_local(async move {
        match controller.start().await {
            Ok(()) => info!("engine ready"),
            Err(e) => error!(error = %e, "startup failed"),
        }
    });
    Ok(())
}

/// Forwards `event_type` on element `id` to the controller
fn listen(
    document: &Document,
    id: &str,
    event_type: &str,
    controller: &Rc<BrowserController>,
    make_event: impl Fn() -> DomEvent + 'static,
) -> Result<(), JsValue> {
    let Some(target) = document.get_element_by_id(id) else {
        return Err(JsValue::from_str(&format!("missing element #{id}")));
    };
    let controller = Rc::clone(controller);
    let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let controller = Rc::clone(&controller);
        let event = make_event();
        spawn_local(async move {
            controller.handle_event(&event).await;
        });
    });
    target.add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())?;
    // Listeners live as long as the page
    callback.forget();
    Ok(())
}
