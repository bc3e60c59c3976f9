use super::*;

/// Trained parameters of a single LSTM gate.
///
/// # Fields
///
/// - `kernel` - Weight matrix for input connections with shape (input_dim, units)
/// - `recurrent_kernel` - Weight matrix for recurrent connections with shape (units, units)
/// - `bias` - Bias vector with shape (units)
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    kernel: Array2<f32>,
    recurrent_kernel: Array2<f32>,
    bias: Array1<f32>,
}

impl Gate {
    /// Creates a gate from trained parameters after checking that their shapes agree.
    ///
    /// # Parameters
    ///
    /// - `kernel` - Input weights with shape (input_dim, units)
    /// - `recurrent_kernel` - Recurrent weights with shape (units, units)
    /// - `bias` - Bias with shape (units)
    ///
    /// # Returns
    ///
    /// - `Result<Self, ModelError>` - The gate
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If a dimension is 0, the shapes are inconsistent with
    ///   `units = bias.len()`, or a value is not finite
    pub fn new(
        kernel: Array2<f32>,
        recurrent_kernel: Array2<f32>,
        bias: Array1<f32>,
    ) -> Result<Self, ModelError> {
        let units = bias.len();
        let input_dim = kernel.nrows();
        validate_dimension_greater_than_zero(units, "units")?;
        validate_dimension_greater_than_zero(input_dim, "input_dim")?;
        validate_shape(kernel.shape(), &[input_dim, units], "kernel")?;
        validate_shape(recurrent_kernel.shape(), &[units, units], "recurrent_kernel")?;
        validate_finite(kernel.iter(), "kernel")?;
        validate_finite(recurrent_kernel.iter(), "recurrent_kernel")?;
        validate_finite(bias.iter(), "bias")?;

        Ok(Self {
            kernel,
            recurrent_kernel,
            bias,
        })
    }

    /// Returns the number of input features the gate expects
    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    /// Returns the number of units of the gate
    pub fn units(&self) -> usize {
        self.bias.len()
    }

    /// Returns the input weights with shape (input_dim, units)
    pub fn kernel(&self) -> &Array2<f32> {
        &self.kernel
    }

    /// Returns the recurrent weights with shape (units, units)
    pub fn recurrent_kernel(&self) -> &Array2<f32> {
        &self.recurrent_kernel
    }

    /// Returns the bias with shape (units)
    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }
}

/// Computes gate value: x_t @ kernel + h_prev @ recurrent_kernel + bias
///
/// # Parameters
///
/// - `gate` - Gate parameters used for the computation
/// - `x_t` - Input at the current timestep with shape (input_dim)
/// - `h_prev` - Previous hidden state with shape (units)
///
/// # Returns
///
/// - `Array1<f32>` - Pre-activation gate values with shape (units)
///
/// # Panics
///
/// - If vector and matrix dimensions are incompatible for multiplication
#[inline]
pub fn compute_gate_value(gate: &Gate, x_t: ArrayView1<f32>, h_prev: ArrayView1<f32>) -> Array1<f32> {
    x_t.dot(&gate.kernel) + h_prev.dot(&gate.recurrent_kernel) + &gate.bias
}
