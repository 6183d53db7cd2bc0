//! Page surface: the handful of DOM operations the controller needs
//!
//! Implemented by [`MockDom`](super::dom::MockDom) for tests and headless
//! runs, and by the web-sys page in the browser build.

/// Element ids shared by the mock page and `www/index.html`
pub mod ids {
    /// Integration expression field
    pub const INTEGRAND: &str = "function";
    /// Lower bound field
    pub const LOWER_BOUND: &str = "lowerBound";
    /// Upper bound field
    pub const UPPER_BOUND: &str = "upperBound";
    /// Differentiation expression field
    pub const DERIVAND: &str = "functionDeriv";
    /// Trigger button
    pub const CALCULATE: &str = "calculateButton";
    /// Result display region
    pub const RESULT: &str = "result";
    /// Plot region
    pub const PLOT: &str = "plot";
    /// Mode-dependent title
    pub const TITLE: &str = "title";
    /// Busy overlay
    pub const LOADING_OVERLAY: &str = "loadingOverlay";
    /// Busy overlay message
    pub const LOADING_INDICATOR: &str = "loadingIndicator";
    /// `name` shared by the mode radio buttons
    pub const MODE_GROUP: &str = "calcType";
}

/// DOM access used by the controller and presenter
pub trait PageSurface {
    /// Current value of an input field (empty if missing)
    fn input_value(&self, id: &str) -> String;

    /// Shows or hides an element
    fn set_visible(&mut self, id: &str, visible: bool);

    /// Replaces the markup inside an element
    fn set_inner_html(&mut self, id: &str, html: &str);

    /// Replaces the text inside an element
    fn set_text(&mut self, id: &str, text: &str);

    /// Enables or disables a control
    fn set_disabled(&mut self, id: &str, disabled: bool);

    /// Checks or unchecks a radio button
    fn set_checked(&mut self, id: &str, checked: bool);
}
