pub mod batcher;
pub mod reader;
pub mod record;
pub mod writer;

pub use batcher::{BatchRange, RowBatcher};
pub use reader::{has_content, CsvStreamReader, OutputTable, SourceTable};
pub use record::{OutputRow, SourceRow, TableSchema};
pub use writer::{write_snapshot, CheckpointSink};
