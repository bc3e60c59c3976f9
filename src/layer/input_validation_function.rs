use super::*;

/// Validates that a dimension value is greater than 0
///
/// # Parameters
///
/// - `value` - The dimension value to validate
/// - `name` - The name of the dimension for error messages
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError::LoadError)` if validation fails
pub(super) fn validate_dimension_greater_than_zero(
    value: usize,
    name: &str,
) -> Result<(), ModelError> {
    if value == 0 {
        return Err(ModelError::LoadError(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Validates that a parameter array has the expected shape
///
/// # Parameters
///
/// - `actual` - Shape of the parameter as loaded
/// - `expected` - Shape derived from the other parameters
/// - `name` - The name of the parameter for error messages
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError::LoadError)` if the shapes differ
pub(super) fn validate_shape(
    actual: &[usize],
    expected: &[usize],
    name: &str,
) -> Result<(), ModelError> {
    if actual != expected {
        return Err(ModelError::LoadError(format!(
            "{} has shape {:?}, expected {:?}",
            name, actual, expected
        )));
    }
    Ok(())
}

/// Validates that all parameter values are finite
pub(super) fn validate_finite<'a>(
    values: impl IntoIterator<Item = &'a f32>,
    name: &str,
) -> Result<(), ModelError> {
    if values.into_iter().any(|v| !v.is_finite()) {
        return Err(ModelError::LoadError(format!(
            "{} contains NaN or infinite values",
            name
        )));
    }
    Ok(())
}
