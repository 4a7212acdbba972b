use crate::csv_processor::{CheckpointSink, RowBatcher, SourceRow};
use crate::state::Progress;
use crate::translation::client::TranslationBackend;
use crate::translation::outcome::{Outcome, OutcomeKind};
use crate::translation::prompt::PromptBuilder;
use crate::utils::Result;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Every request of a full batch failed. The batch was not checkpointed.
    Aborted { batch: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub batch_sizes: Vec<usize>,
    pub rows_checkpointed: usize,
    pub translated: usize,
    pub blocked: usize,
    pub absent: usize,
}

impl RunReport {
    fn new() -> Self {
        Self {
            status: RunStatus::Completed,
            batch_sizes: Vec::new(),
            rows_checkpointed: 0,
            translated: 0,
            blocked: 0,
            absent: 0,
        }
    }

    pub fn batches_dispatched(&self) -> usize {
        self.batch_sizes.len()
    }

    fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Translated => self.translated += 1,
            OutcomeKind::Blocked => self.blocked += 1,
            OutcomeKind::Absent => self.absent += 1,
        }
    }
}

/// Translates rows in fixed-width batches and checkpoints each batch before
/// dispatching the next.
pub struct BatchDriver<B> {
    backend: B,
    prompts: PromptBuilder,
    batcher: RowBatcher,
    batch_delay: Duration,
}

impl<B: TranslationBackend> BatchDriver<B> {
    pub fn new(backend: B, prompts: PromptBuilder, batch_width: usize, batch_delay: Duration) -> Self {
        Self {
            backend,
            prompts,
            batcher: RowBatcher::new(batch_width),
            batch_delay,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn run(&self, rows: &[SourceRow], sink: &mut CheckpointSink) -> Result<RunReport> {
        let width = self.batcher.width();
        let mut report = RunReport::new();
        let mut progress = Progress::new(rows.len());

        for range in self.batcher.calculate_batches(rows.len()) {
            if range.index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let batch = &rows[range.start_row..range.end_row];
            report.batch_sizes.push(batch.len());
            let outcomes = self.dispatch(batch).await;

            // The failure threshold equals the batch width, so only a full
            // batch can trip it.
            if range.is_full(width) && outcomes.iter().all(Outcome::is_absent) {
                error!(
                    batch = range.index,
                    failed = outcomes.len(),
                    first_message_id = %batch[0].id(),
                    "{} failed requests in a row, aborting run",
                    width
                );
                report.status = RunStatus::Aborted { batch: range.index };
                return Ok(report);
            }

            for (row, outcome) in batch.iter().zip(&outcomes) {
                sink.append(row, outcome)?;
                report.record(outcome.kind());
            }
            report.rows_checkpointed += batch.len();
            progress.advance(batch.len());

            info!(
                batch = range.index,
                translated = report.translated,
                blocked = report.blocked,
                absent = report.absent,
                "Translating: {}",
                progress
            );
        }

        info!(
            batches = report.batches_dispatched(),
            rows = report.rows_checkpointed,
            translated = report.translated,
            blocked = report.blocked,
            absent = report.absent,
            output = %sink.path().display(),
            "Translation run finished"
        );

        Ok(report)
    }

    /// Sends one request per row concurrently; outcomes come back in row order.
    async fn dispatch(&self, batch: &[SourceRow]) -> Vec<Outcome> {
        let backend = &self.backend;
        stream::iter(batch)
            .map(|row| {
                let prompt = self.prompts.build(row.text());
                async move { backend.translate(&prompt).await }
            })
            .buffered(batch.len().max(1))
            .collect()
            .await
    }
}
