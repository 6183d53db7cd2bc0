//! Typesetting and charting collaborators
//!
//! Both renderers are black boxes: MathJax re-renders the math markup in a
//! region, Plotly draws series into a region. The recording versions keep
//! what they were asked to do so tests can check it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Renderer failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Render failed: {message}")]
pub struct RenderError {
    /// Error message
    pub message: String,
}

impl RenderError {
    /// Create a render error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Re-renders delimited math markup in place
#[async_trait(?Send)]
pub trait Typesetter {
    /// Typesets everything inside the element `region_id`
    async fn typeset(&self, region_id: &str) -> Result<(), RenderError>;
}

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStyle {
    /// Plain line
    Line,
    /// Line with the area down to `y = 0` filled
    FillToZero,
}

/// One named (x, y) series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    /// Legend name
    pub name: String,
    /// Abscissae
    pub x: Vec<f64>,
    /// Ordinates, `NaN` for gaps
    pub y: Vec<f64>,
    /// Drawing style
    pub style: PlotStyle,
}

impl PlotSeries {
    /// A plain line
    #[must_use]
    pub fn line(name: &str, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            style: PlotStyle::Line,
        }
    }

    /// A line filled down to zero
    #[must_use]
    pub fn fill_to_zero(name: &str, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            style: PlotStyle::FillToZero,
        }
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    /// Whether the series has no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws 2-D plots, synchronously
pub trait Charter {
    /// Draws (or redraws) `series` into `target`
    fn draw(&self, target: &str, series: &[PlotSeries]) -> Result<(), RenderError>;

    /// Removes any plot from `target`
    fn clear(&self, target: &str);
}

/// Typesetter that records the regions it was asked to render
#[derive(Debug, Clone, Default)]
pub struct RecordingTypesetter {
    regions: Rc<RefCell<Vec<String>>>,
    failure: Option<String>,
}

impl RecordingTypesetter {
    /// Creates a recording typesetter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one that records, then fails every call
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            regions: Rc::default(),
            failure: Some(message.to_string()),
        }
    }

    /// Regions typeset so far
    #[must_use]
    pub fn regions(&self) -> Vec<String> {
        self.regions.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Typesetter for RecordingTypesetter {
    async fn typeset(&self, region_id: &str) -> Result<(), RenderError> {
        self.regions.borrow_mut().push(region_id.to_string());
        super::scheduler::yield_now().await;
        match &self.failure {
            Some(message) => Err(RenderError::new(message.clone())),
            None => Ok(()),
        }
    }
}

/// One call seen by a [`RecordingCharter`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChartCall {
    /// `draw(target, series)`
    Draw {
        /// Target region
        target: String,
        /// Series drawn
        series: Vec<PlotSeries>,
    },
    /// `clear(target)`
    Clear {
        /// Target region
        target: String,
    },
}

/// Charter that records what it was asked to draw
#[derive(Debug, Clone, Default)]
pub struct RecordingCharter {
    calls: Rc<RefCell<Vec<ChartCall>>>,
}

impl RecordingCharter {
    /// Creates a recording charter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far
    #[must_use]
    pub fn calls(&self) -> Vec<ChartCall> {
        self.calls.borrow().clone()
    }

    /// Series of the most recent `draw`, if the plot was not cleared since
    #[must_use]
    pub fn current_plot(&self) -> Option<Vec<PlotSeries>> {
        match self.calls.borrow().last() {
            Some(ChartCall::Draw { series, .. }) => Some(series.clone()),
            _ => None,
        }
    }
}

impl Charter for RecordingCharter {
    fn draw(&self, target: &str, series: &[PlotSeries]) -> Result<(), RenderError> {
        self.calls.borrow_mut().push(ChartCall::Draw {
            target: target.to_string(),
            series: series.to_vec(),
        });
        Ok(())
    }

    fn clear(&self, target: &str) {
        self.calls.borrow_mut().push(ChartCall::Clear {
            target: target.to_string(),
        });
    }
}
