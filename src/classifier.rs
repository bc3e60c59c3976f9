use crate::activation::{ActivationTable, default_table};
use crate::error::{IoError, ModelError};
use crate::export::HeaderExporter;
use crate::layer::{EngineState, argmax};
use crate::parameter::ModelParameters;
use log::warn;
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::sync::Arc;

/// LSTM sequence classifier running entirely on lookup-table activations.
///
/// Holds an immutable parameter set, the shared activation table and the only
/// mutable part, the recurrent [`EngineState`]. Two prediction modes are offered:
///
/// - [`predict`](Self::predict) resets the state and consumes a whole window
/// - [`contiguous_predict`](Self::contiguous_predict) advances the current state by one
///   sample, for streaming inference where the state persists between calls
///
/// Every independent stream needs its own classifier; clones share the activation
/// table but own their state.
///
/// # Fields
///
/// - `parameters` - Trained cell, head and preprocessing parameters
/// - `activation` - Lookup table providing tanh and sigmoid
/// - `state` - Cell state and hidden state
///
/// # Example
/// ```rust
/// use lumen_lstm::prelude::*;
/// use ndarray::{Array1, Array2, array};
///
/// let cell = LSTMCell::from_combined(
///     Array2::from_elem((1, 8), 0.1),
///     Array2::from_elem((2, 8), 0.1),
///     Array1::zeros(8),
/// ).unwrap();
/// let dense = Dense::new(array![[1.0], [1.0]], array![0.0]).unwrap();
/// let preprocessing = PreprocessingParams::new(0.0, 1000.0, 2, 1).unwrap();
/// let parameters = ModelParameters::new(cell, dense, preprocessing).unwrap();
///
/// let mut classifier = LSTMClassifier::new(parameters);
/// let whole = classifier.predict_series(&[1.0, 1.0]).unwrap();
///
/// classifier.reset_state();
/// classifier.contiguous_predict(array![1.0].view()).unwrap();
/// let streamed = classifier.contiguous_predict(array![1.0].view()).unwrap();
/// assert_eq!(whole, streamed);
/// ```
#[derive(Debug, Clone)]
pub struct LSTMClassifier {
    parameters: ModelParameters,
    activation: Arc<ActivationTable>,
    state: EngineState,
}

impl LSTMClassifier {
    /// Creates a classifier using the default activation table (26 samples over \[0, 2.5\]).
    pub fn new(parameters: ModelParameters) -> Self {
        Self::with_activation_table(parameters, default_table())
    }

    /// Creates a classifier using a custom activation table.
    pub fn with_activation_table(
        parameters: ModelParameters,
        activation: Arc<ActivationTable>,
    ) -> Self {
        let state = EngineState::zeros(parameters.units());
        Self {
            parameters,
            activation,
            state,
        }
    }

    /// Returns the trained parameters
    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    /// Returns the activation table
    pub fn activation_table(&self) -> &ActivationTable {
        &self.activation
    }

    /// Returns the current recurrent state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Sets the cell state and hidden state back to zero
    pub fn reset_state(&mut self) {
        self.state.reset();
    }

    /// Advances the recurrent state by one timestep without evaluating the head.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `x_t` does not have `input_dim` components
    pub fn step(&mut self, x_t: ArrayView1<f32>) -> Result<(), ModelError> {
        self.parameters
            .cell()
            .step(&mut self.state, x_t, &self.activation)
    }

    /// Evaluates the classification head on the current hidden state.
    pub fn logits(&self) -> Array1<f32> {
        self.parameters.dense().forward(self.state.hidden_state.view())
    }

    /// Classifies a whole sequence starting from a zero state.
    ///
    /// An empty sequence is not an error: the head is evaluated on the zero hidden
    /// state, which yields the dense bias.
    ///
    /// # Parameters
    ///
    /// - `sequence` - Time steps as rows, shape (timesteps, input_dim), applied in row order
    ///
    /// # Returns
    ///
    /// - `Result<Array1<f32>, ModelError>` - Logits with shape (num_classes)
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If a row does not have `input_dim` components
    pub fn predict(&mut self, sequence: ArrayView2<f32>) -> Result<Array1<f32>, ModelError> {
        self.reset_state();
        if sequence.nrows() == 0 {
            warn!("predict called with an empty sequence, returning the zero-state output");
        }
        for x_t in sequence.rows() {
            self.step(x_t)?;
        }
        Ok(self.logits())
    }

    /// Classifies a sequence of scalar readings, one per timestep.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If the cell does not take exactly one input feature
    pub fn predict_series(&mut self, series: &[f32]) -> Result<Array1<f32>, ModelError> {
        let input_dim = self.parameters.input_dim();
        if input_dim != 1 {
            return Err(ModelError::InputValidationError(format!(
                "scalar series need input_dim 1, cell expects {}",
                input_dim
            )));
        }
        let sequence = ArrayView2::from_shape((series.len(), 1), series)
            .map_err(|e| ModelError::ProcessingError(e.to_string()))?;
        self.predict(sequence)
    }

    /// Advances the current state by one sample and evaluates the head.
    ///
    /// The state is not reset, so calls must follow the order in which the
    /// samples were taken.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `x_t` does not have `input_dim` components
    pub fn contiguous_predict(&mut self, x_t: ArrayView1<f32>) -> Result<Array1<f32>, ModelError> {
        self.step(x_t)?;
        Ok(self.logits())
    }

    /// Predicts a whole sequence and returns the index of the largest logit.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(class))` - The predicted class
    /// - `Ok(None)` - If every logit is NaN
    pub fn classify(&mut self, sequence: ArrayView2<f32>) -> Result<Option<usize>, ModelError> {
        let logits = self.predict(sequence)?;
        Ok(argmax(logits.view()))
    }

    /// Writes every parameter, the activation table and the preprocessing constants
    /// as a C header to `path`.
    ///
    /// # Errors
    ///
    /// - `IoError::StdIoError` - If the file cannot be created or written
    pub fn export_model(&self, path: &str) -> Result<(), IoError> {
        HeaderExporter::new(&self.parameters, &self.activation).write_to_path(path)
    }
}
