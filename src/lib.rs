//! LSTM inference for microcontroller targets without a machine-learning runtime.
//!
//! Trained Keras-style LSTM and dense weights are loaded from a keyed parameter
//! store, evaluated with a lookup-table approximation of tanh and sigmoid, and
//! exported as a self-contained C header for the firmware build.

/// Error types shared by every module
pub mod error;

pub use error::{IoError, ModelError};

/// Module `activation` provides the piecewise-linear tanh approximation.
///
/// A small table of `(x, tanh(x))` samples over a bounded positive domain is
/// interpolated linearly; the sign is restored through odd symmetry and inputs
/// beyond the table saturate. The LSTM sigmoid is derived from the same table
/// as `(1 + tanh(x / 2)) / 2`.
///
/// # Example
/// ```rust
/// use lumen_lstm::activation::default_table;
///
/// let table = default_table();
/// assert_eq!(table.len(), 26);
/// assert_eq!(table.sigmoid(0.0), 0.5);
/// ```
pub mod activation;

/// Layers of the classifier: the four-gate LSTM cell and the dense head.
///
/// # Core Types
/// - **Gate**: kernel, recurrent kernel and bias of one gate
/// - **LSTMCell**: four gates in the order input, forget, cell, output, and the single-step update
/// - **EngineState**: cell state and hidden state
/// - **Dense**: affine classification head, with `argmax` to pick a class
pub mod layer;

/// Module `parameter` loads trained tensors from a keyed store.
///
/// The combined LSTM kernel, recurrent kernel and bias hold the four gates side by
/// side in the order input, forget, cell, output; loading splits them into
/// [`layer::Gate`]s and checks every shape against the unit count.
///
/// # Example
/// ```rust,no_run
/// use lumen_lstm::parameter::{LayerNames, load_parameters_from_path};
///
/// let parameters = load_parameters_from_path("model.json", &LayerNames::default()).unwrap();
/// println!("{} units", parameters.units());
/// ```
pub mod parameter;

/// Scaling, windowing and the streaming windowed classifier used on the target
pub mod preprocessing;

/// Module `classifier` drives the cell and head over input sequences.
///
/// [`classifier::LSTMClassifier::predict`] resets the state and consumes a whole
/// window; [`classifier::LSTMClassifier::contiguous_predict`] advances the state
/// by a single sample and keeps it for the next call.
pub mod classifier;

/// C header export of a configured classifier
pub mod export;

/// A convenience module that re-exports the most commonly used types of this crate.
///
/// # Examples
/// ```rust
/// use lumen_lstm::prelude::*;
/// ```
pub mod prelude;

#[cfg(test)]
mod test;
