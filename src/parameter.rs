use crate::error::{IoError, ModelError};
use crate::layer::{Dense, GATE_COUNT, LSTMCell};
use crate::preprocessing::PreprocessingParams;
use log::{debug, info};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Default layer key of the LSTM cell, the group path it has in a Keras HDF5 checkpoint
pub const DEFAULT_RECURRENT_LAYER: &str = "lstm/lstm/lstm_cell";
/// Default layer key of the dense head, the group path it has in a Keras HDF5 checkpoint
pub const DEFAULT_DENSE_LAYER: &str = "dense/dense";

/// A tensor as stored in a parameter source.
///
/// Matrices are row-major nested vectors.
///
/// # Variants
///
/// - `Scalar` - A single value
/// - `Vector` - A 1-D tensor
/// - `Matrix` - A 2-D tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTensor {
    Scalar(f32),
    Vector(Vec<f32>),
    Matrix(Vec<Vec<f32>>),
}

impl StoredTensor {
    /// Converts the tensor into a 1-D array.
    ///
    /// A scalar becomes a vector of length 1, as do the one-element datasets of an HDF5 checkpoint.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the tensor is a matrix
    pub fn to_array1(&self, name: &str) -> Result<Array1<f32>, ModelError> {
        match self {
            StoredTensor::Scalar(v) => Ok(Array1::from_elem(1, *v)),
            StoredTensor::Vector(v) => Ok(Array1::from_vec(v.clone())),
            StoredTensor::Matrix(_) => Err(ModelError::LoadError(format!(
                "{} must be a vector, found a matrix",
                name
            ))),
        }
    }

    /// Converts the tensor into a 2-D array.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the tensor is not a matrix or its rows differ in length
    pub fn to_array2(&self, name: &str) -> Result<Array2<f32>, ModelError> {
        let rows = match self {
            StoredTensor::Matrix(rows) => rows,
            _ => {
                return Err(ModelError::LoadError(format!(
                    "{} must be a matrix",
                    name
                )));
            }
        };
        let n_rows = rows.len();
        let n_cols = if n_rows > 0 { rows[0].len() } else { 0 };
        if let Some(i) = rows.iter().position(|row| row.len() != n_cols) {
            return Err(ModelError::LoadError(format!(
                "{} is ragged: row {} has {} values, row 0 has {}",
                name,
                i,
                rows[i].len(),
                n_cols
            )));
        }
        let flat: Vec<f32> = rows.iter().flat_map(|row| row.iter().cloned()).collect();
        Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| ModelError::LoadError(format!("{}: {}", name, e)))
    }

    /// Returns the single value of a scalar or one-element vector.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the tensor holds more or less than one value
    pub fn to_scalar(&self, name: &str) -> Result<f32, ModelError> {
        match self {
            StoredTensor::Scalar(v) => Ok(*v),
            StoredTensor::Vector(v) if v.len() == 1 => Ok(v[0]),
            _ => Err(ModelError::LoadError(format!(
                "{} must hold exactly one value",
                name
            ))),
        }
    }

    /// Returns the single value of a scalar or one-element vector as a count.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the tensor holds more or less than one value, or the
    ///   value is not a non-negative whole number that fits in `u32`
    pub fn to_count(&self, name: &str) -> Result<usize, ModelError> {
        let value = self.to_scalar(name)?;
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f32 {
            return Err(ModelError::LoadError(format!(
                "{} must be a non-negative whole number, got {}",
                name, value
            )));
        }
        Ok(value as usize)
    }
}

impl From<&Array1<f32>> for StoredTensor {
    fn from(array: &Array1<f32>) -> Self {
        StoredTensor::Vector(array.to_vec())
    }
}

impl From<&Array2<f32>> for StoredTensor {
    fn from(array: &Array2<f32>) -> Self {
        StoredTensor::Matrix(array.outer_iter().map(|row| row.to_vec()).collect())
    }
}

/// Keys under which the trained tensors are found in a parameter source.
///
/// The default layer keys are the checkpoint group paths. The default tensor keys are
/// the checkpoint dataset names without their `:0` suffix (`kernel:0` becomes `kernel`);
/// a store that keeps the suffix is read by overriding the tensor keys.
///
/// # Fields
///
/// - `recurrent_layer` - Layer key of the LSTM cell
/// - `dense_layer` - Layer key of the dense head
/// - `kernel` - Tensor key of the input kernels
/// - `recurrent_kernel` - Tensor key of the combined recurrent kernel
/// - `bias` - Tensor key of the biases
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNames {
    pub recurrent_layer: String,
    pub dense_layer: String,
    pub kernel: String,
    pub recurrent_kernel: String,
    pub bias: String,
}

impl Default for LayerNames {
    fn default() -> Self {
        Self {
            recurrent_layer: DEFAULT_RECURRENT_LAYER.to_string(),
            dense_layer: DEFAULT_DENSE_LAYER.to_string(),
            kernel: "kernel".to_string(),
            recurrent_kernel: "recurrent_kernel".to_string(),
            bias: "bias".to_string(),
        }
    }
}

/// A keyed store of trained tensors produced by the training pipeline.
pub trait ParameterSource {
    /// Looks up the tensor `name` of layer `layer`.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the layer or tensor does not exist
    fn tensor(&self, layer: &str, name: &str) -> Result<StoredTensor, ModelError>;

    /// Returns the scaling bounds and windowing parameters stored with the model.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the values are missing or invalid
    fn preprocessing(&self) -> Result<PreprocessingParams, ModelError>;
}

/// Scaling bounds as stored next to the trained weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub val_min: StoredTensor,
    pub val_max: StoredTensor,
}

/// Windowing parameters as stored next to the trained weights.
///
/// Like the scaling bounds, each count may be stored as a bare number or as a
/// one-element dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub feature_width: StoredTensor,
    pub step_size: StoredTensor,
}

/// JSON-backed parameter source.
///
/// Mirrors the layout of a Keras HDF5 checkpoint: tensors grouped by layer key,
/// plus the scaling and windowing parameters the model was trained with.
///
/// # Fields
///
/// - `layers` - Tensors keyed by layer name, then by tensor name
/// - `scaling_params` - Bounds used to scale raw readings into \[0, 1\]
/// - `window_params` - Feature width and step size of one inference window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStore {
    pub layers: BTreeMap<String, BTreeMap<String, StoredTensor>>,
    pub scaling_params: ScalingParams,
    pub window_params: WindowParams,
}

impl ParameterStore {
    /// Builds a store holding the given parameters in combined Keras layout.
    ///
    /// The four gates are concatenated again in the order input, forget, cell, output,
    /// so that `load_parameters(&ParameterStore::from_parameters(p, n), n)` reproduces `p`.
    pub fn from_parameters(parameters: &ModelParameters, names: &LayerNames) -> Self {
        let cell = parameters.cell();
        let gates = [
            cell.input_gate(),
            cell.forget_gate(),
            cell.cell_gate(),
            cell.output_gate(),
        ];
        let (input_dim, units) = (cell.input_dim(), cell.units());
        let mut kernel = Array2::<f32>::zeros((input_dim, GATE_COUNT * units));
        let mut recurrent_kernel = Array2::<f32>::zeros((units, GATE_COUNT * units));
        let mut bias = Array1::<f32>::zeros(GATE_COUNT * units);
        for (i, gate) in gates.iter().enumerate() {
            let columns = i * units..(i + 1) * units;
            kernel
                .slice_mut(s![.., columns.clone()])
                .assign(gate.kernel());
            recurrent_kernel
                .slice_mut(s![.., columns.clone()])
                .assign(gate.recurrent_kernel());
            bias.slice_mut(s![columns]).assign(gate.bias());
        }

        let mut recurrent = BTreeMap::new();
        recurrent.insert(names.kernel.clone(), StoredTensor::from(&kernel));
        recurrent.insert(
            names.recurrent_kernel.clone(),
            StoredTensor::from(&recurrent_kernel),
        );
        recurrent.insert(names.bias.clone(), StoredTensor::from(&bias));

        let mut dense = BTreeMap::new();
        dense.insert(
            names.kernel.clone(),
            StoredTensor::from(parameters.dense().kernel()),
        );
        dense.insert(
            names.bias.clone(),
            StoredTensor::from(parameters.dense().bias()),
        );

        let mut layers = BTreeMap::new();
        layers.insert(names.recurrent_layer.clone(), recurrent);
        layers.insert(names.dense_layer.clone(), dense);

        let preprocessing = parameters.preprocessing();
        Self {
            layers,
            scaling_params: ScalingParams {
                val_min: StoredTensor::Scalar(preprocessing.val_min()),
                val_max: StoredTensor::Scalar(preprocessing.val_max()),
            },
            window_params: WindowParams {
                feature_width: StoredTensor::Scalar(preprocessing.feature_width() as f32),
                step_size: StoredTensor::Scalar(preprocessing.step_size() as f32),
            },
        }
    }

    /// Saves the store to a JSON file at the specified path.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Store successfully saved to file
    /// - `Err(IoError::StdIoError)` - File creation or write operation failed
    /// - `Err(IoError::JsonError)` - Serialization to JSON failed
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let file = File::create(path).map_err(IoError::StdIoError)?;
        let mut writer = BufWriter::new(file);

        to_writer_pretty(&mut writer, self).map_err(IoError::JsonError)?;

        writer.flush().map_err(IoError::StdIoError)?;
        info!("saved parameter store to {}", path);
        Ok(())
    }

    /// Loads a store from a JSON file.
    ///
    /// # Returns
    ///
    /// - `Ok(ParameterStore)` - The deserialized store
    /// - `Err(IoError::StdIoError)` - File not found or read operation failed
    /// - `Err(IoError::JsonError)` - Deserialization from JSON failed
    pub fn load_from_path(path: &str) -> Result<Self, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        let store: ParameterStore = from_reader(reader).map_err(IoError::JsonError)?;
        info!(
            "loaded parameter store from {} ({} layers)",
            path,
            store.layers.len()
        );
        Ok(store)
    }
}

impl ParameterSource for ParameterStore {
    fn tensor(&self, layer: &str, name: &str) -> Result<StoredTensor, ModelError> {
        let tensors = self
            .layers
            .get(layer)
            .ok_or_else(|| ModelError::LoadError(format!("layer '{}' not found", layer)))?;
        tensors.get(name).cloned().ok_or_else(|| {
            ModelError::LoadError(format!("tensor '{}' not found in layer '{}'", name, layer))
        })
    }

    fn preprocessing(&self) -> Result<PreprocessingParams, ModelError> {
        let val_min = self.scaling_params.val_min.to_scalar("val_min")?;
        let val_max = self.scaling_params.val_max.to_scalar("val_max")?;
        let feature_width = self.window_params.feature_width.to_count("feature_width")?;
        let step_size = self.window_params.step_size.to_count("step_size")?;
        PreprocessingParams::new(val_min, val_max, feature_width, step_size)
            .map_err(|e| ModelError::LoadError(e.to_string()))
    }
}

/// Complete, validated parameter set of one LSTM classifier.
///
/// Built atomically by [`load_parameters`] (or [`ModelParameters::new`]) and
/// read-only afterwards. The fields are private so that every instance has
/// passed the cross-layer shape check.
///
/// # Fields
///
/// - `cell` - LSTM cell with its four gates
/// - `dense` - Classification head
/// - `preprocessing` - Scaling bounds and windowing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    cell: LSTMCell,
    dense: Dense,
    preprocessing: PreprocessingParams,
}

impl ModelParameters {
    /// Bundles a cell, a head and preprocessing parameters.
    ///
    /// # Errors
    ///
    /// - `ModelError::LoadError` - If the head input dimension differs from the cell unit count
    pub fn new(
        cell: LSTMCell,
        dense: Dense,
        preprocessing: PreprocessingParams,
    ) -> Result<Self, ModelError> {
        if dense.input_dim() != cell.units() {
            return Err(ModelError::LoadError(format!(
                "dense kernel has {} rows, LSTM has {} units",
                dense.input_dim(),
                cell.units()
            )));
        }
        Ok(Self {
            cell,
            dense,
            preprocessing,
        })
    }

    /// Returns the LSTM cell
    pub fn cell(&self) -> &LSTMCell {
        &self.cell
    }

    /// Returns the classification head
    pub fn dense(&self) -> &Dense {
        &self.dense
    }

    /// Returns the scaling bounds and windowing parameters
    pub fn preprocessing(&self) -> &PreprocessingParams {
        &self.preprocessing
    }

    /// Returns the number of input features per timestep
    pub fn input_dim(&self) -> usize {
        self.cell.input_dim()
    }

    /// Returns the number of LSTM units
    pub fn units(&self) -> usize {
        self.cell.units()
    }

    /// Returns the number of output classes
    pub fn output_dim(&self) -> usize {
        self.dense.output_dim()
    }
}

/// Reads the trained tensors of one LSTM layer and one dense layer from `source`.
///
/// The combined LSTM tensors are split into four gates in the order
/// input, forget, cell, output.
///
/// # Parameters
///
/// - `source` - Keyed parameter store
/// - `names` - Layer and tensor keys to read
///
/// # Returns
///
/// - `Result<ModelParameters, ModelError>` - The complete parameter set
///
/// # Errors
///
/// - `ModelError::LoadError` - If a tensor is missing, has the wrong rank, or any shape is
///   inconsistent with the unit count derived from the combined bias
pub fn load_parameters(
    source: &impl ParameterSource,
    names: &LayerNames,
) -> Result<ModelParameters, ModelError> {
    let recurrent = names.recurrent_layer.as_str();
    let kernel = source
        .tensor(recurrent, &names.kernel)?
        .to_array2("lstm kernel")?;
    let recurrent_kernel = source
        .tensor(recurrent, &names.recurrent_kernel)?
        .to_array2("lstm recurrent_kernel")?;
    let bias = source
        .tensor(recurrent, &names.bias)?
        .to_array1("lstm bias")?;
    let cell = LSTMCell::from_combined(kernel, recurrent_kernel, bias)?;

    let dense_layer = names.dense_layer.as_str();
    let dense_kernel = source
        .tensor(dense_layer, &names.kernel)?
        .to_array2("dense kernel")?;
    let dense_bias = source
        .tensor(dense_layer, &names.bias)?
        .to_array1("dense bias")?;
    let dense = Dense::new(dense_kernel, dense_bias)?;

    let preprocessing = source.preprocessing()?;
    let parameters = ModelParameters::new(cell, dense, preprocessing)?;
    debug!(
        "loaded LSTM parameters: input_dim={}, units={}, classes={}",
        parameters.input_dim(),
        parameters.units(),
        parameters.output_dim()
    );
    Ok(parameters)
}

/// Loads a JSON parameter store from `path` and reads the model parameters from it.
///
/// # Errors
///
/// - `IoError::StdIoError` / `IoError::JsonError` - If the file cannot be read or parsed
/// - `IoError::ModelError` - If the parameters are missing or inconsistent
pub fn load_parameters_from_path(
    path: &str,
    names: &LayerNames,
) -> Result<ModelParameters, IoError> {
    let store = ParameterStore::load_from_path(path)?;
    load_parameters(&store, names).map_err(IoError::ModelError)
}
