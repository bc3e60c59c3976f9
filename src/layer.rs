use crate::activation::ActivationTable;
use crate::error::ModelError;
use ndarray::{Array1, Array2, ArrayView1, s};

/// Fully connected classification head
pub mod dense;
/// Gate structure shared by the four LSTM gates
pub mod gate;
/// Input validation functions for layer construction
mod input_validation_function;
/// LSTM cell parameters and the single-step state update
pub mod lstm_cell;

pub use dense::*;
pub use gate::*;
pub use lstm_cell::*;

use input_validation_function::*;
