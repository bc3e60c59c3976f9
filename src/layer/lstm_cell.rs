use super::*;

/// Number of gates packed side by side in a combined LSTM kernel
pub const GATE_COUNT: usize = 4;

/// Recurrent state of an LSTM cell.
///
/// A freshly created or reset state is all zeros. Each call to [`LSTMCell::step`]
/// replaces both vectors.
///
/// # Fields
///
/// - `cell_state` - Long-term memory C_t with shape (units)
/// - `hidden_state` - Short-term memory and cell output h_t with shape (units)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub cell_state: Array1<f32>,
    pub hidden_state: Array1<f32>,
}

impl EngineState {
    /// Creates an all-zero state for a cell with `units` units
    pub fn zeros(units: usize) -> Self {
        Self {
            cell_state: Array1::zeros(units),
            hidden_state: Array1::zeros(units),
        }
    }

    /// Sets both state vectors back to zero
    pub fn reset(&mut self) {
        self.cell_state.fill(0.0);
        self.hidden_state.fill(0.0);
    }

    /// Returns true if both state vectors are all zero
    pub fn is_reset(&self) -> bool {
        self.cell_state.iter().all(|&v| v == 0.0) && self.hidden_state.iter().all(|&v| v == 0.0)
    }

    /// Returns the number of units the state was created for
    pub fn units(&self) -> usize {
        self.hidden_state.len()
    }
}

/// Trained parameters of one LSTM cell, split into its four gates.
///
/// For each timestep t, with σ approximated by the lookup table:
/// 1. f_t = σ(x_t · W_f + h_{t-1} · U_f + b_f)  (Forget gate)
/// 2. i_t = σ(x_t · W_i + h_{t-1} · U_i + b_i)  (Input gate)
/// 3. o_t = σ(x_t · W_o + h_{t-1} · U_o + b_o)  (Output gate)
/// 4. g_t = tanh(x_t · W_c + h_{t-1} · U_c + b_c)  (Candidate)
/// 5. C_t = f_t ⊙ C_{t-1} + i_t ⊙ g_t  (Cell state update)
/// 6. h_t = o_t ⊙ tanh(C_t)  (Hidden state update)
///
/// # Fields
///
/// - `input_gate` - Gate controlling what new information to store in cell state
/// - `forget_gate` - Gate controlling what information to discard from cell state
/// - `cell_gate` - Gate proposing new candidate values for cell state
/// - `output_gate` - Gate controlling what to output from cell state
#[derive(Debug, Clone, PartialEq)]
pub struct LSTMCell {
    input_gate: Gate,
    forget_gate: Gate,
    cell_gate: Gate,
    output_gate: Gate,
}

impl LSTMCell {
    /// Creates a cell from four gates given in the order input, forget, cell, output.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the gates do not share the same input dimension and unit count
    pub fn new(
        input_gate: Gate,
        forget_gate: Gate,
        cell_gate: Gate,
        output_gate: Gate,
    ) -> Result<Self, ModelError> {
        let input_dim = input_gate.input_dim();
        let units = input_gate.units();
        for (gate, name) in [
            (&forget_gate, "forget gate"),
            (&cell_gate, "cell gate"),
            (&output_gate, "output gate"),
        ] {
            if gate.input_dim() != input_dim || gate.units() != units {
                return Err(ModelError::LoadError(format!(
                    "{} has input_dim {} and units {}, input gate has input_dim {} and units {}",
                    name,
                    gate.input_dim(),
                    gate.units(),
                    input_dim,
                    units
                )));
            }
        }

        Ok(Self {
            input_gate,
            forget_gate,
            cell_gate,
            output_gate,
        })
    }

    /// Creates a cell from the combined tensors of a trained Keras-style LSTM layer.
    ///
    /// The combined tensors hold the four gates side by side along their last axis,
    /// in the order input, forget, cell (candidate), output. Each gate gets one
    /// contiguous block of `units` columns.
    ///
    /// # Parameters
    ///
    /// - `kernel` - Combined input kernel with shape (input_dim, 4 * units)
    /// - `recurrent_kernel` - Combined recurrent kernel with shape (units, 4 * units)
    /// - `bias` - Combined bias with shape (4 * units)
    ///
    /// # Returns
    ///
    /// - `Result<Self, ModelError>` - The cell with its four gates split out
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the bias length is not a non-zero multiple of 4, or either
    ///   kernel is inconsistent with the unit count derived from it
    pub fn from_combined(
        kernel: Array2<f32>,
        recurrent_kernel: Array2<f32>,
        bias: Array1<f32>,
    ) -> Result<Self, ModelError> {
        if bias.is_empty() || bias.len() % GATE_COUNT != 0 {
            return Err(ModelError::LoadError(format!(
                "combined bias length must be a non-zero multiple of {}, got {}",
                GATE_COUNT,
                bias.len()
            )));
        }
        let units = bias.len() / GATE_COUNT;
        let input_dim = kernel.nrows();
        validate_dimension_greater_than_zero(input_dim, "input_dim")?;
        validate_shape(kernel.shape(), &[input_dim, GATE_COUNT * units], "combined kernel")?;
        validate_shape(
            recurrent_kernel.shape(),
            &[units, GATE_COUNT * units],
            "combined recurrent_kernel",
        )?;

        let split = |index: usize| -> Result<Gate, ModelError> {
            let columns = index * units..(index + 1) * units;
            Gate::new(
                kernel.slice(s![.., columns.clone()]).to_owned(),
                recurrent_kernel.slice(s![.., columns.clone()]).to_owned(),
                bias.slice(s![columns]).to_owned(),
            )
        };

        Self::new(split(0)?, split(1)?, split(2)?, split(3)?)
    }

    /// Returns the number of input features per timestep
    pub fn input_dim(&self) -> usize {
        self.input_gate.input_dim()
    }

    /// Returns the number of LSTM units
    pub fn units(&self) -> usize {
        self.input_gate.units()
    }

    /// Returns the input gate parameters
    pub fn input_gate(&self) -> &Gate {
        &self.input_gate
    }

    /// Returns the forget gate parameters
    pub fn forget_gate(&self) -> &Gate {
        &self.forget_gate
    }

    /// Returns the cell (candidate) gate parameters
    pub fn cell_gate(&self) -> &Gate {
        &self.cell_gate
    }

    /// Returns the output gate parameters
    pub fn output_gate(&self) -> &Gate {
        &self.output_gate
    }

    /// Advances `state` by one timestep.
    ///
    /// # Parameters
    ///
    /// - `state` - Recurrent state, replaced by the updated cell and hidden state
    /// - `x_t` - Input at the current timestep with shape (input_dim)
    /// - `table` - Lookup table providing tanh and sigmoid
    ///
    /// # Returns
    ///
    /// - `Result<(), ModelError>` - Ok once the state has been updated
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `x_t` does not have `input_dim` components or the
    ///   state was created for a different unit count; `state` is left untouched
    pub fn step(
        &self,
        state: &mut EngineState,
        x_t: ArrayView1<f32>,
        table: &ActivationTable,
    ) -> Result<(), ModelError> {
        if x_t.len() != self.input_dim() {
            return Err(ModelError::InputValidationError(format!(
                "input has {} features, cell expects {}",
                x_t.len(),
                self.input_dim()
            )));
        }
        if state.units() != self.units() {
            return Err(ModelError::InputValidationError(format!(
                "state has {} units, cell has {}",
                state.units(),
                self.units()
            )));
        }

        let h_prev = state.hidden_state.view();
        let f_t = compute_gate_value(&self.forget_gate, x_t, h_prev).mapv(|v| table.sigmoid(v));
        let i_t = compute_gate_value(&self.input_gate, x_t, h_prev).mapv(|v| table.sigmoid(v));
        let o_t = compute_gate_value(&self.output_gate, x_t, h_prev).mapv(|v| table.sigmoid(v));
        let g_t = compute_gate_value(&self.cell_gate, x_t, h_prev).mapv(|v| table.tanh(v));

        // c_t = f_t * c_prev + i_t * g_t
        let c_t = &f_t * &state.cell_state + &i_t * &g_t;
        // h_t = o_t * tanh(c_t)
        let h_t = &o_t * &c_t.mapv(|v| table.tanh(v));

        state.cell_state = c_t;
        state.hidden_state = h_t;
        Ok(())
    }
}
