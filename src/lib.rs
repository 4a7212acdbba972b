pub mod acquire;
pub mod csv_processor;
pub mod state;
pub mod translation;
pub mod utils;

pub use acquire::{acquire, AcquisitionReport};
pub use csv_processor::{CheckpointSink, CsvStreamReader, OutputRow, SourceRow, TableSchema};
pub use state::{RunMode, RunPlan, RunSelector};
pub use translation::{
    execute_plan, run_translation, BatchDriver, GeminiClient, Outcome, RunReport, RunStatus,
    TranslationBackend,
};
pub use utils::{AppConfig, Result, TranslatorError};
