use super::*;

/// Dense classification head applied to the final LSTM hidden state.
///
/// Computes `logits = hidden · kernel + bias` without an activation. Soft-max is
/// not applied since only the ordering of the logits decides the class.
///
/// # Fields
///
/// - `kernel` - Weight matrix with shape (units, num_classes)
/// - `bias` - Bias vector with shape (num_classes)
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    kernel: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    /// Creates the head from trained parameters.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If a dimension is 0, the bias length does not match the kernel
    ///   column count, or a value is not finite
    pub fn new(kernel: Array2<f32>, bias: Array1<f32>) -> Result<Self, ModelError> {
        validate_dimension_greater_than_zero(kernel.nrows(), "dense input_dim")?;
        validate_dimension_greater_than_zero(bias.len(), "dense output_dim")?;
        validate_shape(kernel.shape(), &[kernel.nrows(), bias.len()], "dense kernel")?;
        validate_finite(kernel.iter(), "dense kernel")?;
        validate_finite(bias.iter(), "dense bias")?;
        Ok(Self { kernel, bias })
    }

    /// Returns the input dimension of the layer
    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    /// Returns the number of classes (output dimension)
    pub fn output_dim(&self) -> usize {
        self.bias.len()
    }

    /// Returns a reference to the weight matrix with shape (units, num_classes)
    pub fn kernel(&self) -> &Array2<f32> {
        &self.kernel
    }

    /// Returns a reference to the bias vector with shape (num_classes)
    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Computes the logits for a hidden state.
    ///
    /// # Panics
    ///
    /// - If `hidden` does not have `input_dim` components
    pub fn forward(&self, hidden: ArrayView1<f32>) -> Array1<f32> {
        hidden.dot(&self.kernel) + &self.bias
    }
}

/// Returns the index of the largest logit.
///
/// Ties resolve to the lowest index; NaN values are never selected.
///
/// # Returns
///
/// * `Option<usize>` - The class index, or `None` if `logits` is empty or all NaN
pub fn argmax(logits: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in logits.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if v <= best_value => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
