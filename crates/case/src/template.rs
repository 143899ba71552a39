use std::fmt;

use serde::{Deserialize, Serialize};
use varda_core::State;

use crate::Series;

/// Built-in observer behaviors, applied each time a variable is updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Template {
    /// Logs the latest value.
    #[default]
    ValuePrinter,

    /// Logs every value stored so far.
    ValueSeriePrinter,

    /// Logs the mean of the latest value.
    ValueMean,

    /// Logs the L2 norm of the latest value.
    ValueNorm,
}

impl Template {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ValuePrinter => "ValuePrinter",
            Self::ValueSeriePrinter => "ValueSeriePrinter",
            Self::ValueMean => "ValueMean",
            Self::ValueNorm => "ValueNorm",
        }
    }

    /// Renders the message for the current state of `series`.
    ///
    /// Returns `None` while the series is empty.
    #[must_use]
    pub fn render(self, info: &str, series: &Series) -> Option<String> {
        let last = series.last()?;
        let body = match self {
            Self::ValuePrinter => format_vector(last),
            Self::ValueSeriePrinter => {
                let values: Vec<String> = series.iter().map(format_vector).collect();
                format!("[{}]", values.join(", "))
            }
            Self::ValueMean => {
                let mean = if last.is_empty() { f64::NAN } else { last.mean() };
                mean.to_string()
            }
            Self::ValueNorm => last.norm().to_string(),
        };
        Some(format!("{info}{body}"))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats a vector as a bracketed, comma-separated list.
pub(crate) fn format_vector(value: &State) -> String {
    let items: Vec<String> = value.iter().map(f64::to_string).collect();
    format!("[{}]", items.join(", "))
}
