use std::fs::File;
use std::io::BufReader;

/// Error types that can occur while building or running the inference engine
///
/// # Variants
///
/// - `InputValidationError` - indicates the input data provided does not meet the expected shape or value rules
/// - `LoadError` - indicates a trained parameter is missing, malformed, or inconsistent with the other tensors
/// - `ProcessingError` - indicates that there is something wrong while processing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InputValidationError(String),
    LoadError(String),
    ProcessingError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InputValidationError(msg) => write!(f, "Input validation error: {}", msg),
            ModelError::LoadError(msg) => write!(f, "Parameter load error: {}", msg),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Input/Output error types that can occur during parameter loading and header export
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors of the parameter store
/// - `ModelError` - Wraps a load error detected after the file itself was read successfully
#[derive(Debug)]
pub enum IoError {
    StdIoError(std::io::Error),
    JsonError(serde_json::Error),
    ModelError(ModelError),
}

impl IoError {
    pub fn load_in_buf_reader(path: &str) -> Result<BufReader<File>, IoError> {
        let file = File::open(path).map_err(IoError::StdIoError)?;
        Ok(BufReader::new(file))
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::StdIoError(e) => write!(f, "IO error: {}", e),
            IoError::JsonError(e) => write!(f, "JSON error: {}", e),
            IoError::ModelError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::StdIoError(e) => Some(e),
            IoError::JsonError(e) => Some(e),
            IoError::ModelError(e) => Some(e),
        }
    }
}
