//! [`PageSurface`] over the real document

use crate::ui::page::PageSurface;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

/// Id of the optional inline JSON configuration block
pub const CONFIG_SCRIPT_ID: &str = "symcalc-config";

/// The calculator page in the browser
#[derive(Debug, Clone)]
pub struct BrowserPage {
    document: Document,
}

impl BrowserPage {
    /// Binds to the current window's document
    pub fn from_window() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self { document })
    }

    /// The underlying document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Text of the inline configuration block, if the page has one
    pub fn inline_config(&self) -> Option<String> {
        self.element(CONFIG_SCRIPT_ID)
            .and_then(|script| script.text_content())
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn input(&self, id: &str) -> Option<HtmlInputElement> {
        self.element(id)?.dyn_into().ok()
    }
}

impl PageSurface for BrowserPage {
    fn input_value(&self, id: &str) -> String {
        self.input(id).map(|e| e.value()).unwrap_or_default()
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        let Some(elem) = self.element(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) else {
            return;
        };
        let style = elem.style();
        let _ = if visible {
            style.remove_property("display").map(|_| ())
        } else {
            style.set_property("display", "none")
        };
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(elem) = self.element(id) {
            elem.set_inner_html(html);
        }
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(elem) = self.element(id) {
            elem.set_text_content(Some(text));
        }
    }

    fn set_disabled(&mut self, id: &str, disabled: bool) {
        if let Some(elem) = self.element(id) {
            let _ = if disabled {
                elem.set_attribute("disabled", "")
            } else {
                elem.remove_attribute("disabled")
            };
        }
    }

    fn set_checked(&mut self, id: &str, checked: bool) {
        if let Some(input) = self.input(id) {
            input.set_checked(checked);
        }
    }
}
