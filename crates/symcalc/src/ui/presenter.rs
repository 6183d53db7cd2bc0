//! Result presenter
//!
//! Writes the formatted result into the display region, has it typeset,
//! draws the plot, and releases the busy state last.

use super::collab::{Charter, PlotSeries, Typesetter};
use super::controller::BusyGuard;
use super::locale::Locale;
use super::page::{ids, PageSurface};
use crate::core::format::format_expression;
use crate::core::{CalcError, CalcResult, CalculationResult};
use std::cell::RefCell;
use tracing::{error, warn};

/// Turns engine output (or a failure) into page content
pub struct Presenter {
    typesetter: Box<dyn Typesetter>,
    charter: Box<dyn Charter>,
    locale: Locale,
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl Presenter {
    /// Creates a presenter over the two renderers
    pub fn new(
        typesetter: impl Typesetter + 'static,
        charter: impl Charter + 'static,
        locale: Locale,
    ) -> Self {
        Self {
            typesetter: Box::new(typesetter),
            charter: Box::new(charter),
            locale,
        }
    }

    /// Language used for labels
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Shows the outcome of one calculation, then releases `busy`.
    ///
    /// `is_current` is checked again after typesetting; once it returns
    /// false the plot is left alone. Returns whether the outcome was shown
    /// in full.
    pub async fn present<P: PageSurface>(
        &self,
        page: &RefCell<P>,
        outcome: CalcResult<CalculationResult>,
        busy: BusyGuard<'_, P>,
        is_current: impl Fn() -> bool,
    ) -> bool {
        let shown = match outcome {
            Ok(result) => self.show_result(page, &result, &is_current).await,
            Err(err) => {
                self.show_failure(page, &err);
                true
            }
        };
        drop(busy);
        shown
    }

    /// Empties the result and plot regions
    pub fn clear<P: PageSurface>(&self, page: &RefCell<P>) {
        page.borrow_mut().set_inner_html(ids::RESULT, "");
        self.charter.clear(ids::PLOT);
    }

    /// Replaces the result region with the generic error indicator
    pub fn show_failure<P: PageSurface>(&self, page: &RefCell<P>, err: &CalcError) {
        match err {
            CalcError::Validation(e) => warn!(error = %e, "input rejected"),
            CalcError::Engine(e) => error!(error = %e, "calculation failed"),
        }
        let html = format!(
            r#"<p class="error">{}</p>"#,
            escape_html(self.locale.error_indicator())
        );
        page.borrow_mut().set_inner_html(ids::RESULT, &html);
        self.charter.clear(ids::PLOT);
    }

    async fn show_result<P: PageSurface>(
        &self,
        page: &RefCell<P>,
        result: &CalculationResult,
        is_current: &impl Fn() -> bool,
    ) -> bool {
        let html = render_result_html(self.locale, result);
        page.borrow_mut().set_inner_html(ids::RESULT, &html);

        // Markup is in place; MathJax may finish later than this call
        if let Err(e) = self.typesetter.typeset(ids::RESULT).await {
            warn!(error = %e, "typesetting failed, showing raw markup");
        }

        // The page may have been cleared while typesetting
        if !is_current() {
            return false;
        }

        if !result.has_samples() {
            self.charter.clear(ids::PLOT);
            return true;
        }
        let series = plot_series(self.locale, result);
        if let Err(e) = self.charter.draw(ids::PLOT, &series) {
            warn!(error = %e, "plot failed");
            self.charter.clear(ids::PLOT);
        }
        true
    }
}

/// Markup for a successful result
#[must_use]
pub fn render_result_html(locale: Locale, result: &CalculationResult) -> String {
    match result {
        CalculationResult::Integration(r) => format!(
            "<p>{}: \\({}\\)</p>\n<p>{}: {}</p>",
            locale.result_label(),
            escape_html(&format_expression(&r.symbolic_value)),
            locale.approximation_label(),
            format_estimate(r.monte_carlo_estimate),
        ),
        CalculationResult::Differentiation(r) => format!(
            "<p>\\(f'(x) = {}\\)</p>",
            escape_html(&format_expression(&r.symbolic_value)),
        ),
    }
}

/// Series to draw for a successful result
#[must_use]
pub fn plot_series(locale: Locale, result: &CalculationResult) -> Vec<PlotSeries> {
    match result {
        CalculationResult::Integration(r) => {
            let mut series = vec![PlotSeries::line(
                "f(x)",
                r.sampled_x.clone(),
                r.sampled_y.clone(),
            )];
            let (lo, hi) = if r.lower_bound <= r.upper_bound {
                (r.lower_bound, r.upper_bound)
            } else {
                (r.upper_bound, r.lower_bound)
            };
            let (xs, ys): (Vec<f64>, Vec<f64>) = r
                .sampled_x
                .iter()
                .zip(&r.sampled_y)
                .filter(|(x, _)| (lo..=hi).contains(*x))
                .map(|(x, y)| (*x, *y))
                .unzip();
            if !xs.is_empty() {
                series.push(PlotSeries::fill_to_zero(locale.area_label(), xs, ys));
            }
            series
        }
        CalculationResult::Differentiation(r) => vec![
            PlotSeries::line("f(x)", r.sampled_x.clone(), r.sampled_y.clone()),
            PlotSeries::line(
                "f'(x)",
                r.sampled_x.clone(),
                r.sampled_derivative_y.clone(),
            ),
        ],
    }
}

/// Six decimals, trailing zeros trimmed
fn format_estimate(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let s = format!("{value:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
