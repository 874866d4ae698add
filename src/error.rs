use std::fs::File;
use std::io::BufReader;

/// Error types that can occur during model operations
///
/// # Variants
///
/// - `ShapeMismatch` - A matrix or vector length is inconsistent with the declared layer widths
/// - `InputValidationError` - The input data or hyperparameters do not meet the expected format or validation rules
/// - `PreconditionViolation` - The caller broke a contract of the engine, e.g. a training vector without its bias unit
/// - `ProcessingError` - Something went wrong while processing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    ShapeMismatch(String),
    InputValidationError(String),
    PreconditionViolation(String),
    ProcessingError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            ModelError::InputValidationError(msg) => write!(f, "Input validation error: {}", msg),
            ModelError::PreconditionViolation(msg) => write!(f, "Precondition violated: {}", msg),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

/// Implements the standard error trait for ModelError
impl std::error::Error for ModelError {}

/// Input/Output error types that can occur while reading or writing arrays and model files
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors of model snapshots
/// - `UnknownFormat` - The file extension does not name one of the supported array formats
/// - `NoData` - A file that had to contain data was missing, empty, or declared zero rows
/// - `MalformedData` - The payload is structurally broken (truncated rows, unequal row widths)
/// - `ParseError` - A text element could not be decoded
/// - `Model` - The data was read but is inconsistent with the model it should build
#[derive(Debug)]
pub enum IoError {
    StdIoError(std::io::Error),
    JsonError(serde_json::Error),
    UnknownFormat(String),
    NoData(String),
    MalformedData(String),
    ParseError(String),
    Model(ModelError),
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
            IoError::UnknownFormat(ext) => write!(f, "Unknown array format \"{}\"", ext),
            IoError::NoData(path) => write!(f, "Invalid or non-existent data in \"{}\"", path),
            IoError::MalformedData(msg) => write!(f, "Malformed data: {}", msg),
            IoError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IoError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::StdIoError(e) => Some(e),
            IoError::JsonError(e) => Some(e),
            IoError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::StdIoError(e)
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::JsonError(e)
    }
}

impl From<ModelError> for IoError {
    fn from(e: ModelError) -> Self {
        IoError::Model(e)
    }
}
