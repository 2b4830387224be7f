use anyhow::Context;
use clap::Parser;
use news_digest::config::DEFAULT_CONFIG_PATH;
use news_digest::{AlertHook, AppConfig, DigestPipeline, Env, LogAlertHook, PipelineServices, RunError, RunReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Daily news digest: fetch feeds, summarize the top stories, email them.
#[derive(Parser, Debug)]
#[command(name = "news-digest", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write the email to a file instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Dry-run output file (defaults to email.output_path from the config)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let run_id = Uuid::new_v4();

    let code = match run(cli, run_id).await {
        Ok(report) => {
            info!(status = ?report.status, exit_code = report.exit_code(), "Daily digest run completed");
            report.exit_code()
        }
        Err(e) => match e.downcast_ref::<RunError>() {
            Some(run_error) => {
                LogAlertHook.alert(run_id, run_error);
                run_error.exit_code()
            }
            None => {
                tracing::error!(%run_id, "Daily digest run failed: {:#}", e);
                1
            }
        },
    };

    std::process::exit(code);
}

async fn run(cli: Cli, run_id: Uuid) -> anyhow::Result<RunReport> {
    info!(%run_id, config = %cli.config.display(), "Starting daily digest");

    let config = AppConfig::load(&cli.config)
        .map_err(RunError::from)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let env = Env::from_env().map_err(RunError::from)?;

    let services = PipelineServices::production(&config, &env).map_err(RunError::from)?;
    let mut pipeline = DigestPipeline::new(config, services).with_run_id(run_id);
    if let Some(output) = cli.output {
        pipeline = pipeline.with_output_path(output);
    }

    Ok(pipeline.run(cli.dry_run).await?)
}
