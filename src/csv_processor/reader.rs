use crate::csv_processor::record::{OutputRow, SourceRow, TableSchema};
use crate::translation::Outcome;
use crate::utils::{ColumnsConfig, Result, TranslatorError};
use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The input table held in memory, in file order.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub schema: Arc<TableSchema>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first row with the given identifier.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }
}

/// A previously written output table.
#[derive(Debug, Clone)]
pub struct OutputTable {
    pub schema: Arc<TableSchema>,
    pub outcome_column: String,
    pub rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifier of the last checkpointed row.
    pub fn last_id(&self) -> Option<&str> {
        self.rows.last().map(OutputRow::id)
    }
}

pub struct CsvStreamReader {
    path: PathBuf,
}

impl CsvStreamReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<csv::Reader<File>> {
        if !self.path.exists() {
            return Err(TranslatorError::FileNotFound(
                self.path.display().to_string(),
            ));
        }
        let file = File::open(&self.path)?;
        Ok(csv::ReaderBuilder::new().has_headers(true).from_reader(file))
    }

    fn header_names(reader: &mut csv::Reader<File>) -> Result<Vec<String>> {
        Ok(reader.headers()?.iter().map(|s| s.to_string()).collect())
    }

    pub fn read_source_table(&self, columns: &ColumnsConfig) -> Result<SourceTable> {
        let mut reader = self.open()?;
        let headers = Self::header_names(&mut reader)?;
        let schema = Arc::new(TableSchema::new(
            headers,
            columns,
            &self.path.display().to_string(),
        )?);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(SourceRow::new(schema.clone(), record_to_vec(&record))?);
        }

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "Loaded source table");

        Ok(SourceTable { schema, rows })
    }

    /// Reads an output table, splitting the outcome column off every record.
    pub fn read_output_table(&self, columns: &ColumnsConfig) -> Result<OutputTable> {
        let mut reader = self.open()?;
        let mut headers = Self::header_names(&mut reader)?;

        let outcome_index = headers
            .iter()
            .position(|h| h == &columns.outcome)
            .ok_or_else(|| TranslatorError::MissingColumn {
                column: columns.outcome.clone(),
                table: self.path.display().to_string(),
            })?;
        headers.remove(outcome_index);

        let schema = Arc::new(TableSchema::new(
            headers,
            columns,
            &self.path.display().to_string(),
        )?);

        let mut rows = Vec::new();
        for result in reader.records() {
            let mut values = record_to_vec(&result?);
            if outcome_index >= values.len() {
                return Err(TranslatorError::ConfigError(format!(
                    "{}: record is missing the {} column",
                    self.path.display(),
                    columns.outcome
                )));
            }
            let outcome = Outcome::from_cell(&values.remove(outcome_index));
            rows.push(OutputRow::new(SourceRow::new(schema.clone(), values)?, outcome));
        }

        Ok(OutputTable {
            schema,
            outcome_column: columns.outcome.clone(),
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn record_to_vec(record: &StringRecord) -> Vec<String> {
    record.iter().map(|s| s.to_string()).collect()
}

/// True when the file exists and holds at least one byte.
pub fn has_content(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
