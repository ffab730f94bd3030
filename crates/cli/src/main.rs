use crate::{
    conn::{ConnectionPinger, PostgresConnectionPinger},
    error::CliError,
    logging::Logging,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{
    error::AdapterError,
    sql::{base::adapter::SqlAdapter, postgres::adapter::PgAdapter},
};
use engine_config::{env::EnvManager, settings::PipelineSettings};
use engine_core::context::pipeline::PipelineContext;
use engine_runtime::execution::{executor, scheduler::CycleScheduler, tables::table_status};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

mod commands;
mod conn;
mod error;
mod logging;
mod output;
mod shutdown;

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser)]
#[command(name = "wbetl", version = "0.1.0", about = "World Bank open data ingestion pipeline")]
struct Cli {
    #[arg(long, global = true, help = "JSON config file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Env file path; defaults to .env when present")]
    env_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let env = load_env(cli.env_file.as_deref())?;
    let logging = Logging::init(&env, cli.json_logs);
    let settings = PipelineSettings::load(cli.config.as_deref(), &env)?;
    logging.apply_level(&settings.log_level);

    match cli.command {
        Commands::Run { max_cycles } => {
            let ctx = PipelineContext::connect(settings).await?;
            let coordinator = ShutdownCoordinator::new(CancellationToken::new());
            coordinator.register_handlers();

            let mut scheduler = CycleScheduler::new(ctx, coordinator.cancel_token());
            if let Some(n) = max_cycles {
                scheduler = scheduler.with_max_cycles(n);
            }
            let summary = scheduler.run().await;
            info!(cycles = summary.cycles, aborted = summary.aborted, "Exiting");

            if coordinator.is_shutdown_requested() {
                std::process::exit(ExitCode::ShutdownRequested.as_i32());
            }
        }
        Commands::Once { output } => {
            let ctx = PipelineContext::connect(settings).await?;
            let report = executor::run_cycle(&ctx).await?;
            match output {
                Some(path) => output::write_json(&report, &path).await?,
                None => output::print_cycle_summary(&report),
            }
        }
        Commands::ShowConfig => {
            output::print_json(&settings.redacted())?;
        }
        Commands::CheckTables { json } => {
            let store = PgAdapter::connect(&settings.database_url)
                .await
                .map_err(AdapterError::from)?;
            let statuses = table_status(&store, &settings.table_mappings()).await?;
            if json {
                output::print_json(&statuses)?;
            } else {
                output::print_table_status(&statuses);
            }
        }
        Commands::TestConn { conn_str } => {
            let conn_str = conn_str.unwrap_or(settings.database_url);
            PostgresConnectionPinger { conn_str }.ping().await?;
        }
    }

    Ok(())
}

/// Process env plus the env file; an explicit file must exist.
fn load_env(env_file: Option<&Path>) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::new();
    match env_file {
        Some(path) => env.load_from_file(path)?,
        None if Path::new(DEFAULT_ENV_FILE).exists() => env.load_from_file(DEFAULT_ENV_FILE)?,
        None => {}
    }
    Ok(env)
}
