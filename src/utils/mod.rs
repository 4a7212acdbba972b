pub mod config;
pub mod errors;

pub use config::{
    AcquisitionConfig, ApiConfig, AppConfig, ColumnsConfig, DriverConfig, LoggingConfig,
    PathsConfig, PromptConfig,
};
pub use errors::{Result, TranslatorError};
