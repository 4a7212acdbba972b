use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("Resume identifier {0} not found in the input table")]
    ResumeIdNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Malformed dataset line {line}: {reason}")]
    MalformedDataset { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
