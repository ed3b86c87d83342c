use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crm_reporter::config::{CliConfig, FileConfig};
use crm_reporter::{AppConfig, JobKind, JobResult, Reporter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(version, about = "Periodic reporting jobs for the CRM GraphQL backend")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// GraphQL endpoint of the CRM backend.
    #[clap(long, env = "CRM_GRAPHQL_URL")]
    pub graphql_url: Option<String>,

    /// Directory holding the job log files.
    #[clap(long, env = "CRM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a liveness line to the heartbeat log.
    Heartbeat,

    /// Restock products below the low-stock threshold.
    LowStock {
        /// Units added to each low-stock product. Defaults to the configured value.
        #[clap(long)]
        increment: Option<u32>,
    },

    /// Append customer, order and revenue totals to the report log.
    Report,

    /// Append reminders for orders placed within the lookback window.
    Reminders {
        /// Window size in days. Defaults to the configured value.
        #[clap(long)]
        lookback_days: Option<u32>,
    },

    /// Print crontab lines for running every job on its schedule.
    Crontab,
}

fn subcommand_for(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Heartbeat => "heartbeat",
        JobKind::LowStock => "low-stock",
        JobKind::WeeklyReport => "report",
        JobKind::OrderReminders => "reminders",
    }
}

fn print_crontab(binary: &str) {
    for kind in JobKind::ALL {
        match kind.schedule().to_cron() {
            Some(expr) => println!(
                "{} {} {}  # {}",
                expr,
                binary,
                subcommand_for(kind),
                kind.description()
            ),
            None => println!("# {}: schedule {:?} has no crontab form", kind, kind.schedule()),
        }
    }
}

fn print_result(result: &JobResult) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    match cli_args.command {
        Command::Crontab => {
            let binary = std::env::args()
                .next()
                .unwrap_or_else(|| "crm-reporter".to_string());
            print_crontab(&binary);
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let cli_config = CliConfig {
                graphql_url: cli_args.graphql_url,
                log_dir: cli_args.log_dir,
            };
            let config = load_config(&cli_config, cli_args.config.as_deref())?;
            let result = run_job(command, &config).await?;
            print_result(&result)
        }
    }
}

fn load_config(cli_config: &CliConfig, path: Option<&Path>) -> Result<AppConfig> {
    let file_config = match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    AppConfig::resolve(cli_config, file_config).context("Invalid configuration")
}

async fn run_job(command: Command, config: &AppConfig) -> Result<JobResult> {
    info!("Using CRM backend at {}", config.graphql_url);
    let reporter = Reporter::new(config)?;

    let result = match command {
        Command::Heartbeat => reporter.run_heartbeat().await,
        Command::LowStock { increment } => {
            reporter
                .run_low_stock_replenishment(increment.unwrap_or(config.low_stock_increment))
                .await
        }
        Command::Report => reporter.run_weekly_report().await,
        Command::Reminders { lookback_days } => {
            reporter
                .run_order_reminders(lookback_days.unwrap_or(config.reminder_lookback_days))
                .await
        }
        Command::Crontab => anyhow::bail!("crontab is not a job"),
    };
    Ok(result)
}
