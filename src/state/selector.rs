//! Chooses which input rows a run processes and where their results go.

use crate::csv_processor::{
    has_content, write_snapshot, CsvStreamReader, OutputRow, SourceRow, SourceTable, TableSchema,
};
use crate::utils::{ColumnsConfig, PathsConfig, Result, TranslatorError};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Translate the whole input table.
    Fresh,
    /// Continue from the last row of the translated table.
    Resume,
    /// Retry blocked and failed rows into a new table that keeps prior
    /// successes.
    Patch,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Fresh => write!(f, "fresh"),
            RunMode::Resume => write!(f, "resume"),
            RunMode::Patch => write!(f, "patch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub mode: RunMode,
    pub rows: Vec<SourceRow>,
    pub output_path: PathBuf,
    pub timeout: Duration,
    /// Input rows left out of this run.
    pub skipped: usize,
    /// Rows carried into the patch table unchanged.
    pub preserved: usize,
}

pub struct RunSelector<'a> {
    paths: &'a PathsConfig,
    columns: &'a ColumnsConfig,
}

impl<'a> RunSelector<'a> {
    pub fn new(paths: &'a PathsConfig, columns: &'a ColumnsConfig) -> Self {
        Self { paths, columns }
    }

    pub fn plan(&self, mode: RunMode, input: SourceTable, timeout: Duration) -> Result<RunPlan> {
        let total = input.len();
        let plan = match mode {
            RunMode::Fresh => self.fresh(input, timeout),
            RunMode::Resume => self.resume(input, timeout)?,
            RunMode::Patch => self.patch(input, timeout)?,
        };

        info!(
            mode = %plan.mode,
            rows = plan.rows.len(),
            skipped = plan.skipped,
            preserved = plan.preserved,
            input_rows = total,
            output = %plan.output_path.display(),
            timeout_secs = plan.timeout.as_secs(),
            "Run planned"
        );

        Ok(plan)
    }

    fn fresh(&self, input: SourceTable, timeout: Duration) -> RunPlan {
        RunPlan {
            mode: RunMode::Fresh,
            rows: input.rows,
            output_path: self.paths.translated_csv.clone(),
            timeout,
            skipped: 0,
            preserved: 0,
        }
    }

    fn resume(&self, input: SourceTable, timeout: Duration) -> Result<RunPlan> {
        let cursor =
            checkpoint_cursor(&self.paths.translated_csv, self.columns, &input.schema)?;
        let Some(last_id) = cursor else {
            warn!(
                path = %self.paths.translated_csv.display(),
                "Nothing to resume from, starting a fresh run"
            );
            return Ok(self.fresh(input, timeout));
        };

        let offset = resume_offset(&input, &last_id)?;
        info!(message_id = %last_id, position = offset, "Resuming after checkpoint");

        let rows = input.rows.into_iter().skip(offset).collect();
        Ok(RunPlan {
            mode: RunMode::Resume,
            rows,
            output_path: self.paths.translated_csv.clone(),
            timeout,
            skipped: offset,
            preserved: 0,
        })
    }

    fn patch(&self, input: SourceTable, timeout: Duration) -> Result<RunPlan> {
        let translated =
            CsvStreamReader::new(&self.paths.translated_csv).read_output_table(self.columns)?;
        ensure_same_columns(&translated.schema, &input.schema, &self.paths.translated_csv)?;

        let (successful, failed_ids) = partition_outcomes(translated.rows);
        let preserved = write_snapshot(
            &self.paths.patched_csv,
            &translated.schema,
            &translated.outcome_column,
            &successful,
        )?;

        let total = input.len();
        let rows = select_failed(input, &failed_ids);

        Ok(RunPlan {
            mode: RunMode::Patch,
            skipped: total - rows.len(),
            rows,
            output_path: self.paths.patched_csv.clone(),
            timeout: timeout * 2,
            preserved,
        })
    }
}

/// Identifier of the last row in an output table, if it has any rows.
///
/// The table must carry the same source columns as `input`, otherwise rows
/// appended on resume would not line up with its header.
pub fn checkpoint_cursor(
    path: &Path,
    columns: &ColumnsConfig,
    input: &TableSchema,
) -> Result<Option<String>> {
    if !has_content(path) {
        return Ok(None);
    }
    let table = CsvStreamReader::new(path).read_output_table(columns)?;
    ensure_same_columns(&table.schema, input, path)?;
    Ok(table.last_id().map(str::to_string))
}

/// Input position to restart from. The checkpointed row itself is included,
/// so it is translated again and appears twice in the output.
pub fn resume_offset(input: &SourceTable, last_id: &str) -> Result<usize> {
    input
        .position_of(last_id)
        .ok_or_else(|| TranslatorError::ResumeIdNotFound(last_id.to_string()))
}

/// Splits output rows into the successful ones, kept in order, and the
/// identifiers that still need a translation.
pub fn partition_outcomes(rows: Vec<OutputRow>) -> (Vec<OutputRow>, HashSet<String>) {
    let mut successful = Vec::new();
    let mut failed = HashSet::new();

    for row in rows {
        if row.outcome.is_successful() {
            successful.push(row);
        } else {
            failed.insert(row.id().to_string());
        }
    }

    // An id retried successfully by a later resume is already done.
    for row in &successful {
        failed.remove(row.id());
    }

    (successful, failed)
}

/// Input rows whose identifiers are in `failed`, in input order, once each.
pub fn select_failed(input: SourceTable, failed: &HashSet<String>) -> Vec<SourceRow> {
    let mut seen = HashSet::new();
    input
        .rows
        .into_iter()
        .filter(|row| failed.contains(row.id()) && seen.insert(row.id().to_string()))
        .collect()
}

fn ensure_same_columns(output: &TableSchema, input: &TableSchema, path: &Path) -> Result<()> {
    if output.columns() != input.columns() {
        return Err(TranslatorError::ConfigError(format!(
            "{} has columns {:?}, input table has {:?}",
            path.display(),
            output.columns(),
            input.columns()
        )));
    }
    Ok(())
}
