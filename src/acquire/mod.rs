//! Fetches the oasst1 message export and writes the single-language input table.

use crate::utils::{AcquisitionConfig, AppConfig, Result, TranslatorError};
use csv::{QuoteStyle, WriterBuilder};
use flate2::read::GzDecoder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub messages_read: usize,
    pub messages_kept: usize,
    pub downloaded: bool,
}

/// Downloads the raw export unless it is already cached, then filters it
/// into `paths.input_csv`.
pub async fn acquire(config: &AppConfig) -> Result<AcquisitionReport> {
    std::fs::create_dir_all(&config.paths.data_dir)?;

    let downloaded = if config.paths.raw_dataset.exists() {
        info!(path = %config.paths.raw_dataset.display(), "Using cached dataset");
        false
    } else {
        download(&config.acquisition.dataset_url, &config.paths.raw_dataset).await?;
        true
    };

    let mut report = filter_dataset(
        &config.paths.raw_dataset,
        &config.paths.input_csv,
        &config.acquisition,
    )?;
    report.downloaded = downloaded;

    info!(
        read = report.messages_read,
        kept = report.messages_kept,
        language = %config.acquisition.language,
        output = %config.paths.input_csv.display(),
        "Dataset prepared"
    );

    Ok(report)
}

async fn download(url: &str, dest: &Path) -> Result<()> {
    info!(url = %url, "Downloading dataset");

    let response = reqwest::get(url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    // Written under a temporary name so an interrupted download is not
    // mistaken for a cached one.
    let partial = dest.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, dest).await?;

    info!(path = %dest.display(), bytes = bytes.len(), "Dataset downloaded");
    Ok(())
}

/// Streams a gzipped JSON-lines export and keeps messages in the configured
/// language.
pub fn filter_dataset(
    raw: &Path,
    output: &Path,
    config: &AcquisitionConfig,
) -> Result<AcquisitionReport> {
    if !raw.exists() {
        return Err(TranslatorError::FileNotFound(raw.display().to_string()));
    }

    let reader = BufReader::new(GzDecoder::new(File::open(raw)?));
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_path(output)?;
    writer.write_record(&config.columns)?;

    let mut report = AcquisitionReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let message: JsonValue =
            serde_json::from_str(&line).map_err(|e| TranslatorError::MalformedDataset {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        let Some(fields) = message.as_object() else {
            return Err(TranslatorError::MalformedDataset {
                line: idx + 1,
                reason: "expected a JSON object".to_string(),
            });
        };

        report.messages_read += 1;
        if fields.get("lang").and_then(JsonValue::as_str) != Some(config.language.as_str()) {
            continue;
        }

        let record: Vec<String> = config
            .columns
            .iter()
            .map(|column| fields.get(column).map(cell_value).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
        report.messages_kept += 1;
    }

    writer.flush()?;
    Ok(report)
}

fn cell_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}
