use crate::csv_processor::reader::has_content;
use crate::csv_processor::record::{OutputRow, SourceRow, TableSchema};
use crate::translation::Outcome;
use crate::utils::Result;
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

fn csv_writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(inner)
}

/// Append-only sink for translation results.
///
/// The file is opened and closed for every row, so whatever was appended
/// before a crash stays on disk. The header is written on the first append
/// to a missing or empty file.
pub struct CheckpointSink {
    path: PathBuf,
    outcome_column: String,
}

impl CheckpointSink {
    pub fn new(path: impl Into<PathBuf>, outcome_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            outcome_column: outcome_column.into(),
        }
    }

    pub fn append(&mut self, row: &SourceRow, outcome: &Outcome) -> Result<()> {
        let needs_header = !has_content(&self.path);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv_writer(file);

        if needs_header {
            writer.write_record(row.schema().output_header(&self.outcome_column))?;
        }

        let mut record: Vec<&str> = row.values().iter().map(String::as_str).collect();
        let cell = outcome.to_cell();
        record.push(&cell);
        writer.write_record(&record)?;
        writer.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes a complete output table, replacing any existing file.
pub fn write_snapshot(
    path: &Path,
    schema: &TableSchema,
    outcome_column: &str,
    rows: &[OutputRow],
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv_writer(File::create(path)?);
    writer.write_record(schema.output_header(outcome_column))?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_processor::CsvStreamReader;
    use crate::utils::ColumnsConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn row(schema: &Arc<TableSchema>, id: &str, text: &str, rank: &str) -> SourceRow {
        SourceRow::new(schema.clone(), vec![id.into(), text.into(), rank.into()]).unwrap()
    }

    fn schema() -> Arc<TableSchema> {
        Arc::new(
            TableSchema::new(
                vec!["message_id".into(), "text".into(), "rank".into()],
                &ColumnsConfig::default(),
                "test",
            )
            .unwrap(),
        )
    }

    #[test]
    fn header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("translated.csv");
        let schema = schema();

        let mut sink = CheckpointSink::new(&path, "hungarian_translation");
        sink.append(&row(&schema, "m1", "Hi", "1"), &Outcome::Translated("Szia".into()))
            .unwrap();
        sink.append(&row(&schema, "m2", "Bye", ""), &Outcome::Absent)
            .unwrap();

        // A second sink on the same file continues without a new header.
        let mut resumed = CheckpointSink::new(&path, "hungarian_translation");
        resumed
            .append(&row(&schema, "m3", "No", "2"), &Outcome::Blocked(None))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("message_id").count(), 1);
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn appended_rows_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translated.csv");
        let schema = schema();
        let source = row(&schema, "m1", "Hello, \"quoted\"\nand multi-line", "0.5");
        let outcome = Outcome::Translated("Helló, \"idézett\"".into());

        CheckpointSink::new(&path, "hungarian_translation")
            .append(&source, &outcome)
            .unwrap();

        let table = CsvStreamReader::new(&path)
            .read_output_table(&ColumnsConfig::default())
            .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].source.values(), source.values());
        assert_eq!(table.rows[0].outcome, outcome);
    }

    #[test]
    fn non_numeric_fields_are_quoted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translated.csv");
        let schema = schema();

        CheckpointSink::new(&path, "hungarian_translation")
            .append(&row(&schema, "m1", "Hi", "3"), &Outcome::Translated("Szia".into()))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("\"m1\",\"Hi\",3,\"Szia\""));
    }

    #[test]
    fn snapshot_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patched.csv");
        std::fs::write(&path, "stale content\n").unwrap();
        let schema = schema();

        let rows = vec![
            OutputRow::new(row(&schema, "m1", "Hi", "1"), Outcome::Translated("Szia".into())),
            OutputRow::new(row(&schema, "m2", "Yo", "1"), Outcome::Translated("Csá".into())),
        ];
        assert_eq!(write_snapshot(&path, &schema, "hungarian_translation", &rows).unwrap(), 2);

        let table = CsvStreamReader::new(&path)
            .read_output_table(&ColumnsConfig::default())
            .unwrap();
        assert_eq!(table.rows, rows);
    }
}
