//! Parameter Grid Expander
//!
//! Turns a list of temperatures and a list of top-p values into the
//! cartesian product of [`ParameterCombination`]s, temperature-major:
//!
//! ```rust
//! use sampling_lab::grid::{expand, ParameterCombination};
//!
//! let grid = expand(&[0.1, 0.9], &[0.5]);
//! assert_eq!(
//!     grid,
//!     vec![ParameterCombination::new(0.1, 0.5), ParameterCombination::new(0.9, 0.5)]
//! );
//! ```

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Accepted temperature values.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Accepted nucleus-sampling (top-p) values.
pub const TOP_P_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// One `(temperature, top_p)` pair driving a single generation task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterCombination {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus-sampling cutoff
    pub top_p: f64,
}

impl ParameterCombination {
    /// Create a combination.
    #[must_use]
    pub const fn new(temperature: f64, top_p: f64) -> Self {
        Self { temperature, top_p }
    }
}

impl fmt::Display for ParameterCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temperature={} top_p={}", self.temperature, self.top_p)
    }
}

/// Cartesian product, outer loop over temperatures.
///
/// Callers guarantee both inputs are non-empty. Repeated values are kept,
/// so duplicate inputs produce duplicate combinations.
#[must_use]
pub fn expand(temperatures: &[f64], top_ps: &[f64]) -> Vec<ParameterCombination> {
    temperatures
        .iter()
        .flat_map(|&t| top_ps.iter().map(move |&p| ParameterCombination::new(t, p)))
        .collect()
}

/// Parse a comma-separated list of values, silently dropping entries that
/// do not parse, are not finite, or fall outside `range`.
///
/// ```rust
/// use sampling_lab::grid::{parse_values, TOP_P_RANGE};
///
/// assert_eq!(parse_values("0.5, abc, 1.5, 0.9", TOP_P_RANGE), vec![0.5, 0.9]);
/// ```
#[must_use]
pub fn parse_values(input: &str, range: RangeInclusive<f64>) -> Vec<f64> {
    input
        .split(',')
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && range.contains(v))
        .collect()
}
