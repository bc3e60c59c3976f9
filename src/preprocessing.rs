use crate::classifier::LSTMClassifier;
use crate::error::ModelError;
use crate::layer::argmax;
use log::debug;
use ndarray::Array2;
use std::collections::VecDeque;

/// Scaling bounds and windowing parameters the model was trained with.
///
/// # Fields
///
/// - `val_min` - Raw reading mapped to 0
/// - `val_max` - Raw reading mapped to 1
/// - `feature_width` - Number of sub-sampled readings in one inference window
/// - `step_size` - Stride between two sub-sampled readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessingParams {
    val_min: f32,
    val_max: f32,
    feature_width: usize,
    step_size: usize,
}

impl PreprocessingParams {
    /// Creates the parameters after validating them.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If a bound is not finite, `val_max <= val_min`,
    ///   `feature_width` or `step_size` is 0, or their product overflows `usize`
    pub fn new(
        val_min: f32,
        val_max: f32,
        feature_width: usize,
        step_size: usize,
    ) -> Result<Self, ModelError> {
        if !(val_min.is_finite() && val_max.is_finite()) {
            return Err(ModelError::InputValidationError(format!(
                "scaling bounds must be finite, got val_min={} val_max={}",
                val_min, val_max
            )));
        }
        if val_max <= val_min {
            return Err(ModelError::InputValidationError(format!(
                "val_max must be greater than val_min, got val_min={} val_max={}",
                val_min, val_max
            )));
        }
        checked_window_width(feature_width, step_size)?;
        Ok(Self {
            val_min,
            val_max,
            feature_width,
            step_size,
        })
    }

    pub fn val_min(&self) -> f32 {
        self.val_min
    }

    pub fn val_max(&self) -> f32 {
        self.val_max
    }

    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    /// Number of raw readings spanned by one window (`feature_width * step_size`)
    pub fn window_width(&self) -> usize {
        self.feature_width * self.step_size
    }

    /// Maps a raw reading into the training range: `(value - val_min) / (val_max - val_min)`.
    pub fn scale(&self, value: f32) -> f32 {
        (value - self.val_min) / (self.val_max - self.val_min)
    }
}

/// Returns `feature_width * step_size` when both are non-zero and the product fits in `usize`
fn checked_window_width(feature_width: usize, step_size: usize) -> Result<usize, ModelError> {
    if feature_width == 0 || step_size == 0 {
        return Err(ModelError::InputValidationError(format!(
            "feature_width and step_size must be greater than 0, got {} and {}",
            feature_width, step_size
        )));
    }
    feature_width.checked_mul(step_size).ok_or_else(|| {
        ModelError::InputValidationError(format!(
            "window of {} values {} apart does not fit in memory",
            feature_width, step_size
        ))
    })
}

/// Cuts a time series into overlapping inference windows.
///
/// Window `i` holds `data[i], data[i + step_size], ...` (`feature_width` values);
/// consecutive windows start one reading apart.
///
/// # Parameters
///
/// - `data` - Time series in sampling order
/// - `feature_width` - Values per window
/// - `step_size` - Stride between values inside a window
///
/// # Returns
///
/// - `Result<Array2<f32>, ModelError>` - Windows with shape (n_windows, feature_width); no rows
///   if `data` is shorter than `feature_width * step_size`
///
/// # Errors
///
/// - `ModelError::InputValidationError` - If `feature_width` or `step_size` is 0, or their
///   product overflows `usize`
pub fn timeseries_windows(
    data: &[f32],
    feature_width: usize,
    step_size: usize,
) -> Result<Array2<f32>, ModelError> {
    let width = checked_window_width(feature_width, step_size)?;
    let n_windows = (data.len() + 1).saturating_sub(width);

    Ok(Array2::from_shape_fn((n_windows, feature_width), |(i, k)| {
        data[i + k * step_size]
    }))
}

/// Streaming classifier for one sensor, fed one raw reading at a time.
///
/// Keeps the last `feature_width * step_size` scaled readings. Once the buffer is
/// full, every pushed reading triggers a whole-window prediction over every
/// `step_size`-th buffered reading, ending with the newest one.
///
/// # Example
/// ```rust
/// use lumen_lstm::prelude::*;
/// use ndarray::{Array1, Array2};
///
/// let cell = LSTMCell::from_combined(
///     Array2::from_elem((1, 8), 0.1),
///     Array2::from_elem((2, 8), 0.1),
///     Array1::zeros(8),
/// ).unwrap();
/// let dense = Dense::new(Array2::from_shape_vec((2, 2), vec![1.0, -1.0, 1.0, -1.0]).unwrap(), Array1::zeros(2)).unwrap();
/// let preprocessing = PreprocessingParams::new(0.0, 100.0, 3, 2).unwrap();
/// let parameters = ModelParameters::new(cell, dense, preprocessing).unwrap();
///
/// let mut windowed = WindowedClassifier::new(LSTMClassifier::new(parameters)).unwrap();
/// for reading in [10.0, 20.0, 30.0, 40.0, 50.0] {
///     assert_eq!(windowed.push(reading).unwrap(), None);
/// }
/// assert_eq!(windowed.push(60.0).unwrap(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct WindowedClassifier {
    classifier: LSTMClassifier,
    buffer: VecDeque<f32>,
}

impl WindowedClassifier {
    /// Wraps a classifier whose cell takes one reading per step.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If the classifier's input dimension is not 1, or
    ///   a window of readings cannot be buffered
    pub fn new(classifier: LSTMClassifier) -> Result<Self, ModelError> {
        let input_dim = classifier.parameters().input_dim();
        if input_dim != 1 {
            return Err(ModelError::InputValidationError(format!(
                "windowed classification needs input_dim 1, got {}",
                input_dim
            )));
        }
        let width = classifier.parameters().preprocessing().window_width();
        let mut buffer = VecDeque::new();
        buffer.try_reserve_exact(width).map_err(|e| {
            ModelError::InputValidationError(format!(
                "cannot buffer a window of {} readings: {}",
                width, e
            ))
        })?;
        debug!("windowed classifier over {} readings", width);
        Ok(Self { classifier, buffer })
    }

    /// Adds a raw reading and classifies the current window.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` - While fewer than `feature_width * step_size` readings have been pushed
    /// - `Ok(Some(class))` - The arg-max class of the current window
    ///
    /// # Errors
    ///
    /// - `ModelError::ProcessingError` - If every logit is NaN
    pub fn push(&mut self, raw: f32) -> Result<Option<usize>, ModelError> {
        let preprocessing = *self.classifier.parameters().preprocessing();
        let width = preprocessing.window_width();
        let step = preprocessing.step_size();

        if self.buffer.len() == width {
            self.buffer.pop_front();
        }
        self.buffer.push_back(preprocessing.scale(raw));
        if self.buffer.len() < width {
            return Ok(None);
        }

        let series: Vec<f32> = self
            .buffer
            .iter()
            .skip(step - 1)
            .step_by(step)
            .cloned()
            .collect();
        let logits = self.classifier.predict_series(&series)?;
        argmax(logits.view()).map(Some).ok_or_else(|| {
            ModelError::ProcessingError("classification head produced only NaN logits".to_string())
        })
    }

    /// Number of readings currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drops every buffered reading and resets the recurrent state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.classifier.reset_state();
    }

    /// Returns the wrapped classifier
    pub fn classifier(&self) -> &LSTMClassifier {
        &self.classifier
    }
}
