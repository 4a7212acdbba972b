use crate::translation::Outcome;
use crate::utils::{ColumnsConfig, Result, TranslatorError};
use std::sync::Arc;

/// Column layout of a source table with the identifier and text columns
/// resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
    id_index: usize,
    text_index: usize,
}

impl TableSchema {
    pub fn new(columns: Vec<String>, names: &ColumnsConfig, table: &str) -> Result<Self> {
        let position = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| TranslatorError::MissingColumn {
                    column: name.to_string(),
                    table: table.to_string(),
                })
        };

        let id_index = position(&names.id)?;
        let text_index = position(&names.text)?;

        Ok(Self {
            columns,
            id_index,
            text_index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Header of the output table: every source column followed by the
    /// outcome column.
    pub fn output_header(&self, outcome_column: &str) -> Vec<String> {
        let mut header = self.columns.clone();
        header.push(outcome_column.to_string());
        header
    }
}

/// One input message. Immutable; written back to the output table verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    schema: Arc<TableSchema>,
    values: Vec<String>,
}

impl SourceRow {
    pub fn new(schema: Arc<TableSchema>, values: Vec<String>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(TranslatorError::ConfigError(format!(
                "row has {} fields, header has {}",
                values.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, values })
    }

    pub fn id(&self) -> &str {
        &self.values[self.schema.id_index]
    }

    pub fn text(&self) -> &str {
        &self.values[self.schema.text_index]
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .index_of(column)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Pairs of (column, value) in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// A row of the output table: the source fields plus the recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub source: SourceRow,
    pub outcome: Outcome,
}

impl OutputRow {
    pub fn new(source: SourceRow, outcome: Outcome) -> Self {
        Self { source, outcome }
    }

    pub fn id(&self) -> &str {
        self.source.id()
    }

    pub fn to_record(&self) -> Vec<String> {
        let mut record = self.source.values.clone();
        record.push(self.outcome.to_cell());
        record
    }
}
