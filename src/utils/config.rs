use crate::utils::errors::{Result, TranslatorError};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub api: ApiConfig,
    pub driver: DriverConfig,
    pub columns: ColumnsConfig,
    pub prompt: PromptConfig,
    pub acquisition: AcquisitionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub input_csv: PathBuf,
    pub translated_csv: PathBuf,
    pub patched_csv: PathBuf,
    pub raw_dataset: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub http_error_cooldown_seconds: u64,
    pub harm_categories: Vec<String>,
    pub block_threshold: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Requests in flight per batch. Also the number of consecutive failures
    /// that aborts a run.
    pub batch_width: usize,
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub id: String,
    pub text: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Must contain a `{text}` placeholder.
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub dataset_url: String,
    pub language: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            input_csv: data_dir.join("oasst1-en.csv"),
            translated_csv: data_dir.join("oasst1-en-hu.csv"),
            patched_csv: data_dir.join("oasst1-en-hu-patched.csv"),
            raw_dataset: data_dir.join("oasst1-ready.messages.jsonl.gz"),
            data_dir,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
                .to_string(),
            api_key_env: "GOOGLE_AI_API_KEY".to_string(),
            timeout_seconds: 15,
            http_error_cooldown_seconds: 10,
            harm_categories: vec![
                "HARM_CATEGORY_HATE_SPEECH".to_string(),
                "HARM_CATEGORY_SEXUALLY_EXPLICIT".to_string(),
                "HARM_CATEGORY_DANGEROUS_CONTENT".to_string(),
                "HARM_CATEGORY_HARASSMENT".to_string(),
            ],
            block_threshold: "BLOCK_NONE".to_string(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            batch_width: 5,
            batch_delay_ms: 200,
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            id: "message_id".to_string(),
            text: "text".to_string(),
            outcome: "hungarian_translation".to_string(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            dataset_url: "https://huggingface.co/datasets/OpenAssistant/oasst1/resolve/main/2023-04-12_oasst_ready.messages.jsonl.gz"
                .to_string(),
            language: "en".to_string(),
            columns: [
                "message_id",
                "parent_id",
                "user_id",
                "created_date",
                "text",
                "role",
                "lang",
                "review_count",
                "review_result",
                "deleted",
                "rank",
                "synthetic",
                "model_name",
                "detoxify",
                "message_tree_id",
                "tree_state",
                "emojis",
                "labels",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

const DEFAULT_PROMPT_TEMPLATE: &str = "You are an expert English to Hungarian translator. \
Translate the chat message below from English to Hungarian, keeping its meaning and style. \
Leave abbreviations and references to English names and entities as they are.
### Example
English: Antitrust enforcement agencies like the FTC or DOJ could investigate employers that are abusing their market power.
Hungarian: Az FTC vagy a DOJ nevű antitröszt-hatóságok vizsgálhatják azokat a munkáltatókat, akik visszaélnek a piaci hatalmukkal.
### Task
English: {text}
Hungarian:";

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslatorError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TranslatorError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise. An existing but invalid
    /// file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.driver.batch_width == 0 {
            return Err(TranslatorError::ConfigError(
                "driver.batch_width must be at least 1".to_string(),
            ));
        }
        if !self.prompt.template.contains("{text}") {
            return Err(TranslatorError::ConfigError(
                "prompt.template must contain a {text} placeholder".to_string(),
            ));
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn http_error_cooldown(&self) -> Duration {
        Duration::from_secs(self.http_error_cooldown_seconds)
    }

    pub fn api_key(&self) -> Result<SecretString> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
            _ => Err(TranslatorError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

impl DriverConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
