use crate::error::ModelError;
use std::sync::{Arc, LazyLock};

/// Upper bound of the default tanh sampling domain
pub const DEFAULT_TANH_X_MAX: f32 = 2.5;

/// Number of samples in the default tanh lookup table (step 0.1 over [0, 2.5])
pub const DEFAULT_TANH_SAMPLES: usize = 26;

/// Output value for inputs beyond the tabulated domain
const SATURATION_VALUE: f32 = 1.0;

static DEFAULT_TABLE: LazyLock<Arc<ActivationTable>> = LazyLock::new(|| {
    Arc::new(ActivationTable::linspace(
        DEFAULT_TANH_X_MAX,
        DEFAULT_TANH_SAMPLES,
    ))
});

/// Returns the process-wide default tanh lookup table.
///
/// The table is built on first use and shared read-only afterwards.
///
/// # Returns
///
/// - `Arc<ActivationTable>` - Shared handle to the table with 26 samples over \[0, 2.5\]
pub fn default_table() -> Arc<ActivationTable> {
    Arc::clone(&DEFAULT_TABLE)
}

/// Piecewise-linear approximation of the hyperbolic tangent.
///
/// Only the positive half of tanh is tabulated. Negative inputs reuse it through
/// the odd symmetry `tanh(-x) = -tanh(x)`, and inputs beyond the last sample
/// saturate at 1.0 instead of evaluating a transcendental function. The sigmoid
/// used by the LSTM gates is derived from the same table, so both
/// nonlinearities share one approximation.
///
/// The number of samples bounds the interpolation error; it is a trade-off
/// between accuracy and the size of the table exported to the target.
///
/// # Fields
///
/// - `samples` - `(x, tanh(x))` pairs ordered by strictly increasing x, starting at 0
///
/// # Example
/// ```rust
/// use lumen_lstm::activation::ActivationTable;
///
/// let table = ActivationTable::new(2.5, 26).unwrap();
/// assert!((table.tanh(0.5) - 0.5f32.tanh()).abs() < 1e-2);
/// assert_eq!(table.tanh(-0.5), -table.tanh(0.5));
/// assert_eq!(table.tanh(10.0), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationTable {
    samples: Vec<(f32, f32)>,
}

impl ActivationTable {
    /// Creates a table sampling tanh at evenly spaced points over `[0, x_max]`.
    ///
    /// # Parameters
    ///
    /// - `x_max` - Upper bound of the sampled domain, must be positive and finite
    /// - `samples` - Number of sample points including both ends, must be at least 2
    ///
    /// # Returns
    ///
    /// - `Result<Self, ModelError>` - The new table
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `x_max` is not positive and finite or `samples < 2`
    pub fn new(x_max: f32, samples: usize) -> Result<Self, ModelError> {
        if !(x_max > 0.0 && x_max.is_finite()) {
            return Err(ModelError::InputValidationError(format!(
                "x_max must be positive and finite, got {}",
                x_max
            )));
        }
        if samples < 2 {
            return Err(ModelError::InputValidationError(format!(
                "activation table needs at least 2 samples, got {}",
                samples
            )));
        }
        Ok(Self::linspace(x_max, samples))
    }

    /// Creates a table from explicit `(x, y)` pairs.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If there are fewer than 2 samples, the first x is not 0,
    ///   x is not strictly increasing, or any value is not finite
    pub fn from_samples(samples: Vec<(f32, f32)>) -> Result<Self, ModelError> {
        if samples.len() < 2 {
            return Err(ModelError::InputValidationError(format!(
                "activation table needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        if samples[0].0 != 0.0 {
            return Err(ModelError::InputValidationError(format!(
                "activation table must start at x = 0, got {}",
                samples[0].0
            )));
        }
        if samples
            .iter()
            .any(|&(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ModelError::InputValidationError(
                "activation table contains NaN or infinite values".to_string(),
            ));
        }
        if let Some(i) = samples.windows(2).position(|w| w[1].0 <= w[0].0) {
            return Err(ModelError::InputValidationError(format!(
                "activation table x values must be strictly increasing (index {})",
                i + 1
            )));
        }
        Ok(Self { samples })
    }

    // Mirrors numpy.linspace: x_i = i * step computed in f64, last sample pinned to x_max.
    fn linspace(x_max: f32, samples: usize) -> Self {
        let step = x_max as f64 / (samples - 1) as f64;
        let samples = (0..samples)
            .map(|i| {
                let x = if i == samples - 1 {
                    x_max as f64
                } else {
                    i as f64 * step
                };
                (x as f32, x.tanh() as f32)
            })
            .collect();
        Self { samples }
    }

    /// Returns the `(x, y)` sample pairs ordered by increasing x
    pub fn samples(&self) -> &[(f32, f32)] {
        &self.samples
    }

    /// Returns the number of samples in the table
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false, a table holds at least two samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the largest tabulated x value
    pub fn x_max(&self) -> f32 {
        self.samples[self.samples.len() - 1].0
    }

    /// Returns the widest gap between two neighbouring x samples.
    ///
    /// Half of this value bounds the interpolation error inside the domain.
    pub fn max_step(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|w| w[1].0 - w[0].0)
            .fold(0.0, f32::max)
    }

    /// Approximates `tanh(x)`.
    ///
    /// # Parameters
    ///
    /// - `x` - Input value
    ///
    /// # Returns
    ///
    /// * `f32` - Linear interpolation between the two bracketing samples of `|x|`, with the sign
    ///   of `x` restored; `±1.0` when `|x|` lies beyond the table
    pub fn tanh(&self, x: f32) -> f32 {
        if x.is_nan() {
            return x;
        }
        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let abs_x = x.abs();

        let last = self.samples.len() - 1;
        if abs_x > self.samples[last].0 {
            return sign * SATURATION_VALUE;
        }

        // first sample strictly greater than abs_x; samples[0].0 == 0 so upper >= 1
        let upper = self.samples.partition_point(|&(sx, _)| sx <= abs_x);
        if upper > last {
            return sign * self.samples[last].1;
        }

        let (x0, y0) = self.samples[upper - 1];
        let (x1, y1) = self.samples[upper];
        sign * (y0 + (y1 - y0) * (abs_x - x0) / (x1 - x0))
    }

    /// Approximates the logistic sigmoid as `(1 + tanh(x / 2)) / 2`.
    pub fn sigmoid(&self, x: f32) -> f32 {
        (1.0 + self.tanh(x / 2.0)) / 2.0
    }
}

impl Default for ActivationTable {
    fn default() -> Self {
        Self::linspace(DEFAULT_TANH_X_MAX, DEFAULT_TANH_SAMPLES)
    }
}
