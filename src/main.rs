use clap::{Parser, Subcommand};
use oasst_translator::{acquire, run_translation, AppConfig, RunMode, RunStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Translate the oasst1 conversations from English to Hungarian")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the dataset and write the English messages table
    Acquire,
    /// Translate the messages table, checkpointing every row
    Translate {
        /// Continue from where the last translation left off
        #[arg(long = "continue", conflicts_with = "patch_failed")]
        resume: bool,

        /// Retry failed and blocked translations into a patched table
        #[arg(long)]
        patch_failed: bool,

        /// Timeout for the requests in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(Some(&cli.config))?;
    init_tracing(&config);
    tracing::info!(config = %cli.config.display(), "Loaded configuration");

    match cli.command {
        Command::Acquire => {
            acquire(&config).await?;
        }
        Command::Translate {
            resume,
            patch_failed,
            timeout,
        } => {
            let mode = if patch_failed {
                RunMode::Patch
            } else if resume {
                RunMode::Resume
            } else {
                RunMode::Fresh
            };

            let report = run_translation(&config, mode, timeout.map(Duration::from_secs)).await?;
            if let RunStatus::Aborted { batch } = report.status {
                tracing::error!(
                    batch,
                    checkpointed = report.rows_checkpointed,
                    "Run aborted; rerun with --continue once the API recovers"
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
