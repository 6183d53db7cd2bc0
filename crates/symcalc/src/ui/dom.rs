//! In-memory page for tests and headless runs
//!
//! Holds the same element IDs as `www/index.html`, so the controller cannot
//! tell it from the real page.

use super::page::{ids, PageSurface};
use crate::core::CalculationMode;
use std::collections::HashMap;

/// A DOM element
#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    /// Element ID
    pub id: String,
    /// Element tag name
    pub tag: String,
    /// Text content
    pub text_content: String,
    /// Inner markup, as last written
    pub inner_html: String,
    /// Element attributes
    pub attributes: HashMap<String, String>,
    /// CSS classes
    pub classes: Vec<String>,
    /// Whether element is visible
    pub visible: bool,
}

impl Default for DomElement {
    fn default() -> Self {
        Self::new("div")
    }
}

impl DomElement {
    /// Creates a new DOM element with the given tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            id: String::new(),
            tag: tag.to_string(),
            text_content: String::new(),
            inner_html: String::new(),
            attributes: HashMap::new(),
            classes: Vec::new(),
            visible: true,
        }
    }

    /// Creates an element with an ID
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets the text content
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text_content = text.to_string();
        self
    }

    /// Adds a class
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Sets an attribute
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets initial visibility
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Gets an attribute value
    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Whether a boolean attribute is present
    #[must_use]
    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Checks if element has a class
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn set_flag(&mut self, key: &str, on: bool) {
        if on {
            self.attributes.insert(key.to_string(), String::new());
        } else {
            self.attributes.remove(key);
        }
    }
}

/// Events the page can dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// Click on an element
    Click {
        /// The ID of the clicked element
        element_id: String,
    },
    /// Text typed into a field
    Input {
        /// The ID of the input element
        element_id: String,
        /// The new value entered
        value: String,
    },
    /// Radio button selection changed
    Change {
        /// The ID of the changed element
        element_id: String,
        /// The element's `value`
        value: String,
    },
}

impl DomEvent {
    /// Creates a click event
    #[must_use]
    pub fn click(element_id: &str) -> Self {
        Self::Click {
            element_id: element_id.to_string(),
        }
    }

    /// Creates an input event
    #[must_use]
    pub fn input(element_id: &str, value: &str) -> Self {
        Self::Input {
            element_id: element_id.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates a change event for the radio button of `mode`
    #[must_use]
    pub fn select_mode(mode: CalculationMode) -> Self {
        Self::Change {
            element_id: mode.selector_id().to_string(),
            value: mode.selector_value().to_string(),
        }
    }
}

/// Mock DOM for driving the controller without a browser.
///
/// The page is flat: every element lives once in the ID map, so there is no
/// tree to fall out of step with it.
#[derive(Debug)]
pub struct MockDom {
    /// Elements by ID
    elements: HashMap<String, DomElement>,
    /// Event history for verification
    event_history: Vec<DomEvent>,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Creates an empty mock DOM
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            event_history: Vec::new(),
        }
    }

    /// Creates the calculator page structure
    #[must_use]
    pub fn calculator_page() -> Self {
        let mut dom = Self::new();

        let title = DomElement::new("h1").with_id(ids::TITLE);

        let radio = |mode: CalculationMode| {
            DomElement::new("input")
                .with_id(mode.selector_id())
                .with_attr("type", "radio")
                .with_attr("name", ids::MODE_GROUP)
                .with_attr("value", mode.selector_value())
        };
        let integration_radio = radio(CalculationMode::Integration).with_attr("checked", "");
        let derivation_radio = radio(CalculationMode::Differentiation);

        let text_field = |id: &str, placeholder: &str| {
            DomElement::new("input")
                .with_id(id)
                .with_attr("type", "text")
                .with_attr("placeholder", placeholder)
                .with_attr("value", "")
        };
        let integrand = text_field(ids::INTEGRAND, "x**2");
        let lower = text_field(ids::LOWER_BOUND, "0");
        let upper = text_field(ids::UPPER_BOUND, "1");
        let derivand = text_field(ids::DERIVAND, "sin(x)");

        let integration_section =
            DomElement::new("section").with_id(CalculationMode::Integration.panel_id());
        let derivation_section = DomElement::new("section")
            .with_id(CalculationMode::Differentiation.panel_id())
            .hidden();

        let calculate = DomElement::new("button")
            .with_id(ids::CALCULATE)
            .with_text("Calculate")
            .with_attr("disabled", "");
        let result = DomElement::new("div")
            .with_id(ids::RESULT)
            .with_class("result-display");
        let plot = DomElement::new("div").with_id(ids::PLOT);

        let indicator = DomElement::new("div").with_id(ids::LOADING_INDICATOR);
        let overlay = DomElement::new("div")
            .with_id(ids::LOADING_OVERLAY)
            .with_class("overlay")
            .hidden();

        for element in [
            title,
            integration_radio,
            derivation_radio,
            integrand,
            lower,
            upper,
            derivand,
            integration_section,
            derivation_section,
            calculate,
            result,
            plot,
            indicator,
            overlay,
        ] {
            dom.register_element(element);
        }

        dom
    }

    /// Registers an element for ID lookup
    pub fn register_element(&mut self, element: DomElement) {
        if !element.id.is_empty() {
            self.elements.insert(element.id.clone(), element);
        }
    }

    /// Gets an element by ID
    #[must_use]
    pub fn get_element(&self, id: &str) -> Option<&DomElement> {
        self.elements.get(id)
    }

    /// Gets a mutable element by ID
    pub fn get_element_mut(&mut self, id: &str) -> Option<&mut DomElement> {
        self.elements.get_mut(id)
    }

    /// Applies an event's effect on the page and records it.
    ///
    /// Only the DOM side happens here; routing to the controller is the
    /// controller's job.
    pub fn dispatch_event(&mut self, event: DomEvent) {
        match &event {
            DomEvent::Input { element_id, value } => {
                if let Some(elem) = self.elements.get_mut(element_id) {
                    elem.attributes.insert("value".to_string(), value.clone());
                }
            }
            DomEvent::Change { element_id, .. } => {
                let group = self
                    .elements
                    .get(element_id)
                    .and_then(|e| e.get_attr("name"))
                    .map(str::to_string);
                if let Some(group) = group {
                    for elem in self.elements.values_mut() {
                        if elem.get_attr("name") == Some(group.as_str()) {
                            let checked = elem.id == *element_id;
                            elem.set_flag("checked", checked);
                        }
                    }
                }
            }
            DomEvent::Click { .. } => {}
        }
        self.event_history.push(event);
    }

    /// Gets the event history
    #[must_use]
    pub fn event_history(&self) -> &[DomEvent] {
        &self.event_history
    }

    /// Clears event history
    pub fn clear_event_history(&mut self) {
        self.event_history.clear();
    }

    /// Gets element text by ID
    #[must_use]
    pub fn get_element_text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text_content.as_str())
    }

    /// Gets element markup by ID
    #[must_use]
    pub fn get_inner_html(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.inner_html.as_str())
    }

    /// Whether the element exists and is visible
    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.visible)
    }

    /// Whether the element carries `disabled`
    #[must_use]
    pub fn is_disabled(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.has_attr("disabled"))
    }

    /// Whether the element carries `checked`
    #[must_use]
    pub fn is_checked(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.has_attr("checked"))
    }

    /// Types `value` into field `id`
    pub fn type_into(&mut self, id: &str, value: &str) {
        self.dispatch_event(DomEvent::input(id, value));
    }
}

impl PageSurface for MockDom {
    fn input_value(&self, id: &str) -> String {
        self.elements
            .get(id)
            .and_then(|e| e.get_attr("value"))
            .unwrap_or_default()
            .to_string()
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.visible = visible;
        }
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.inner_html = html.to_string();
            elem.text_content = html.to_string();
        }
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.text_content = text.to_string();
            elem.inner_html = text.to_string();
        }
    }

    fn set_disabled(&mut self, id: &str, disabled: bool) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.set_flag("disabled", disabled);
        }
    }

    fn set_checked(&mut self, id: &str, checked: bool) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.set_flag("checked", checked);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_element_builders() {
        let elem = DomElement::new("input")
            .with_id("f")
            .with_class("wide")
            .with_attr("type", "text")
            .with_text("hi");
        assert_eq!(elem.id, "f");
        assert!(elem.has_class("wide"));
        assert_eq!(elem.get_attr("type"), Some("text"));
        assert_eq!(elem.text_content, "hi");
        assert!(elem.visible);
        assert!(!elem.clone().hidden().visible);
    }

    #[test]
    fn test_dom_element_default() {
        assert_eq!(DomElement::default().tag, "div");
    }

    #[test]
    fn test_calculator_page_structure() {
        let dom = MockDom::calculator_page();
        for id in [
            ids::INTEGRAND,
            ids::LOWER_BOUND,
            ids::UPPER_BOUND,
            ids::DERIVAND,
            ids::CALCULATE,
            ids::RESULT,
            ids::PLOT,
            ids::TITLE,
            ids::LOADING_OVERLAY,
            ids::LOADING_INDICATOR,
            "integrationSection",
            "derivationSection",
            "calcType-integration",
            "calcType-derivation",
        ] {
            assert!(dom.get_element(id).is_some(), "missing #{id}");
        }
        assert!(dom.is_visible("integrationSection"));
        assert!(!dom.is_visible("derivationSection"));
        assert!(dom.is_disabled(ids::CALCULATE));
        assert!(dom.is_checked("calcType-integration"));
    }

    #[test]
    fn test_input_event_sets_value() {
        let mut dom = MockDom::calculator_page();
        dom.type_into(ids::INTEGRAND, "x**2");
        assert_eq!(dom.input_value(ids::INTEGRAND), "x**2");
        assert_eq!(dom.event_history().len(), 1);
    }

    #[test]
    fn test_input_value_missing_element() {
        let dom = MockDom::new();
        assert_eq!(dom.input_value("nope"), "");
    }

    #[test]
    fn test_change_event_checks_one_radio() {
        let mut dom = MockDom::calculator_page();
        dom.dispatch_event(DomEvent::select_mode(CalculationMode::Differentiation));
        assert!(dom.is_checked("calcType-derivation"));
        assert!(!dom.is_checked("calcType-integration"));
    }

    #[test]
    fn test_set_inner_html_replaces_content() {
        let mut dom = MockDom::calculator_page();
        dom.set_inner_html(ids::RESULT, "<p>one</p>");
        dom.set_inner_html(ids::RESULT, "<p>two</p>");
        assert_eq!(dom.get_inner_html(ids::RESULT), Some("<p>two</p>"));
    }

    #[test]
    fn test_page_updates_visible_through_lookup() {
        let mut dom = MockDom::calculator_page();
        dom.set_visible(ids::LOADING_OVERLAY, true);
        dom.set_text(ids::LOADING_INDICATOR, "Loading...");
        dom.set_inner_html(ids::RESULT, "<p>8/3</p>");

        assert!(dom.get_element(ids::LOADING_OVERLAY).unwrap().visible);
        assert_eq!(
            dom.get_element(ids::LOADING_INDICATOR).unwrap().text_content,
            "Loading..."
        );
        assert_eq!(dom.get_element(ids::RESULT).unwrap().inner_html, "<p>8/3</p>");
        assert_eq!(dom.get_inner_html(ids::RESULT), Some("<p>8/3</p>"));
    }

    #[test]
    fn test_set_text() {
        let mut dom = MockDom::calculator_page();
        dom.set_text(ids::TITLE, "Integral Calculator");
        assert_eq!(dom.get_element_text(ids::TITLE), Some("Integral Calculator"));
    }

    #[test]
    fn test_disabled_and_checked_flags() {
        let mut dom = MockDom::calculator_page();
        dom.set_disabled(ids::CALCULATE, false);
        assert!(!dom.is_disabled(ids::CALCULATE));
        dom.set_checked("calcType-derivation", true);
        assert!(dom.is_checked("calcType-derivation"));
    }

    #[test]
    fn test_register_element_without_id_ignored() {
        let mut dom = MockDom::new();
        dom.register_element(DomElement::new("span"));
        assert!(dom.get_element("").is_none());
    }

    #[test]
    fn test_clear_event_history() {
        let mut dom = MockDom::calculator_page();
        dom.dispatch_event(DomEvent::click(ids::CALCULATE));
        dom.clear_event_history();
        assert!(dom.event_history().is_empty());
    }

    #[test]
    fn test_get_element_mut() {
        let mut dom = MockDom::calculator_page();
        if let Some(elem) = dom.get_element_mut(ids::PLOT) {
            elem.classes.push("empty".into());
        }
        assert!(dom.get_element(ids::PLOT).unwrap().has_class("empty"));
    }
}
