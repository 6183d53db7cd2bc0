//! User-facing strings

use crate::core::CalculationMode;
use serde::{Deserialize, Serialize};

/// Page language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// German
    De,
}

impl Locale {
    /// Title shown above the active panel
    #[must_use]
    pub const fn title(self, mode: CalculationMode) -> &'static str {
        match (self, mode) {
            (Self::En, CalculationMode::Integration) => "Integral Calculator",
            (Self::En, CalculationMode::Differentiation) => "Derivative Calculator",
            (Self::De, CalculationMode::Integration) => "Integralrechner",
            (Self::De, CalculationMode::Differentiation) => "Ableitungsrechner",
        }
    }

    /// Overlay message while the engine starts
    #[must_use]
    pub const fn loading(self) -> &'static str {
        match self {
            Self::En => "Loading...",
            Self::De => "Wird geladen...",
        }
    }

    /// Overlay message while a calculation runs
    #[must_use]
    pub const fn calculating(self) -> &'static str {
        match self {
            Self::En => "Calculating...",
            Self::De => "Wird berechnet...",
        }
    }

    /// Label in front of the closed-form integral
    #[must_use]
    pub const fn result_label(self) -> &'static str {
        match self {
            Self::En => "Result",
            Self::De => "Ergebnis",
        }
    }

    /// Label in front of the Monte Carlo estimate
    #[must_use]
    pub const fn approximation_label(self) -> &'static str {
        match self {
            Self::En => "Approximation",
            Self::De => "Näherung",
        }
    }

    /// Generic error indicator
    #[must_use]
    pub const fn error_indicator(self) -> &'static str {
        match self {
            Self::En => "Something went wrong. Please check your input.",
            Self::De => "Etwas ist schiefgelaufen. Bitte Eingabe prüfen.",
        }
    }

    /// Legend entry for the filled integral region
    #[must_use]
    pub const fn area_label(self) -> &'static str {
        match self {
            Self::En => "Area",
            Self::De => "Fläche",
        }
    }
}
