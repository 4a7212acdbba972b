pub mod client;
pub mod driver;
pub mod outcome;
pub mod prompt;

pub use client::{classify_response, GeminiClient, SafetySetting, TranslationBackend};
pub use driver::{BatchDriver, RunReport, RunStatus};
pub use outcome::{Outcome, OutcomeKind};
pub use prompt::PromptBuilder;

use crate::csv_processor::{CheckpointSink, CsvStreamReader};
use crate::state::{RunMode, RunPlan, RunSelector};
use crate::utils::{AppConfig, Result};
use std::time::Duration;

/// Loads the input table, plans the run for `mode` and drives it against the
/// configured API. `timeout` overrides `api.timeout_seconds` when given.
pub async fn run_translation(
    config: &AppConfig,
    mode: RunMode,
    timeout: Option<Duration>,
) -> Result<RunReport> {
    let api_key = config.api.api_key()?;

    let input = CsvStreamReader::new(&config.paths.input_csv).read_source_table(&config.columns)?;
    let timeout = timeout.unwrap_or_else(|| config.api.timeout());
    let plan = RunSelector::new(&config.paths, &config.columns).plan(mode, input, timeout)?;

    let client = GeminiClient::new(&config.api, api_key, plan.timeout)?;
    tracing::info!(endpoint = %client.endpoint(), "Using translation endpoint");

    execute_plan(config, &plan, client).await
}

/// Drives an already planned run through `backend`, appending to the plan's
/// output table.
pub async fn execute_plan<B: TranslationBackend>(
    config: &AppConfig,
    plan: &RunPlan,
    backend: B,
) -> Result<RunReport> {
    let driver = BatchDriver::new(
        backend,
        PromptBuilder::new(config.prompt.template.clone()),
        config.driver.batch_width,
        config.driver.batch_delay(),
    );
    let mut sink = CheckpointSink::new(&plan.output_path, config.columns.outcome.clone());

    driver.run(&plan.rows, &mut sink).await
}
