use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Model related errors
    InvalidTopology(String),
    DimensionMismatch(String),

    // Training related errors
    InvalidTrainingConfig(String),

    // File operations
    IoError(std::io::Error),
    SerializationError(Box<bincode::ErrorKind>),
    CsvError(csv::Error),

    // Text extraction
    InvalidImage(String),
    EmptyExtraction,
    ExtractionFailed(String),

    // Remote execution
    UnsupportedLanguage(String),
    MissingApiKey,
    ServiceUnavailable(String),
    ServiceTimeout,
    ServiceError { status: u16, detail: String },
    Transport(reqwest::Error),

    Other(String),
}

impl NNError {
    /// HTTP status a front end should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            NNError::InvalidImage(_)
            | NNError::EmptyExtraction
            | NNError::UnsupportedLanguage(_) => 400,
            NNError::ServiceUnavailable(_) => 503,
            NNError::ServiceTimeout => 504,
            NNError::ServiceError { status, .. } => *status,
            _ => 500,
        }
    }
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::InvalidTopology(msg) => write!(f, "Invalid topology: {}", msg),
            NNError::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {}", msg),
            NNError::InvalidTrainingConfig(msg) => write!(f, "Invalid training configuration: {}", msg),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            NNError::CsvError(err) => write!(f, "CSV error: {}", err),
            NNError::InvalidImage(msg) => write!(f, "{}", msg),
            NNError::EmptyExtraction => write!(f, "No text could be extracted from the image"),
            NNError::ExtractionFailed(msg) => write!(f, "OCR processing failed: {}", msg),
            NNError::UnsupportedLanguage(lang) => write!(f, "Unsupported language: {}", lang),
            NNError::MissingApiKey => write!(f, "Judge0 API key not configured"),
            NNError::ServiceUnavailable(msg) => write!(f, "Judge0 API is not available: {}", msg),
            NNError::ServiceTimeout => write!(f, "Code execution timed out"),
            NNError::ServiceError { status, detail } => {
                write!(f, "Judge0 API error ({}): {}", status, detail)
            }
            NNError::Transport(err) => write!(f, "Error communicating with Judge0 API: {}", err),
            NNError::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<Box<bincode::ErrorKind>> for NNError {
    fn from(err: Box<bincode::ErrorKind>) -> NNError {
        NNError::SerializationError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::CsvError(err)
    }
}

impl From<reqwest::Error> for NNError {
    fn from(err: reqwest::Error) -> NNError {
        if err.is_timeout() {
            NNError::ServiceTimeout
        } else if err.is_connect() {
            NNError::ServiceUnavailable(err.to_string())
        } else {
            NNError::Transport(err)
        }
    }
}

impl Error for NNError {}

pub type Result<T> = std::result::Result<T, NNError>;
