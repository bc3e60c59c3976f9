pub use crate::activation::{ActivationTable, default_table};
pub use crate::classifier::LSTMClassifier;
pub use crate::error::{IoError, ModelError};
pub use crate::export::HeaderExporter;
pub use crate::layer::{Dense, EngineState, Gate, LSTMCell, argmax};
pub use crate::parameter::{
    LayerNames, ModelParameters, ParameterSource, ParameterStore, StoredTensor, load_parameters,
    load_parameters_from_path,
};
pub use crate::preprocessing::{PreprocessingParams, WindowedClassifier, timeseries_windows};
