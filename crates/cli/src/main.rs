use crate::{
    commands::{Commands, CopyArgs},
    conn::{ConnectionPinger, MongoConnectionPinger, connect_with_retry, redact},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::mongo::MongoStore;
use engine_config::settings::{TransferSettings, TransferSettingsBuilder};
use engine_core::{context::job::CollectionPair, event_bus::EventBus};
use engine_runtime::TransferEngine;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "doccopy",
    version,
    about = "Copy MongoDB collections between databases"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only progress and the summary
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(e) => {
            error!(error = %e, "doccopy failed");
            eprintln!("Error: {e}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Copy(args) => copy(args).await,
        Commands::Ping {
            uri,
            connect_attempts,
        } => {
            MongoConnectionPinger {
                uri: uri.clone(),
                attempts: connect_attempts,
            }
            .ping()
            .await?;
            println!("Connection to {} OK", redact(&uri));
            Ok(ExitCode::Success)
        }
    }
}

async fn copy(args: CopyArgs) -> Result<ExitCode, CliError> {
    let settings = load_settings(&args)?;
    info!(?settings, "Loaded transfer settings");

    if args.source == args.target && args.source_db == args.target_db() {
        return Err(CliError::SameSourceAndTarget);
    }

    let source = connect_with_retry(&args.source, &args.source_db, args.connect_attempts).await?;
    let target = connect_with_retry(&args.target, args.target_db(), args.connect_attempts).await?;

    let names = select_collections(&source, &args.collections).await?;
    if names.is_empty() {
        warn!(database = %args.source_db, "Source database has no collections");
    }

    if !args.yes && !names.is_empty() && !confirm(&names, target.database_name()).await? {
        info!("Transfer aborted by user");
        return Ok(ExitCode::Success);
    }

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let bus = EventBus::new();
    let (_, events) = bus.subscribe(settings.event_buffer()).await;
    let renderer = output::spawn_renderer(events);

    let pairs = names
        .iter()
        .map(|name| {
            CollectionPair::new(
                name.as_str(),
                Arc::new(source.collection(name)),
                Arc::new(target.collection(name)),
            )
        })
        .collect();

    let engine = TransferEngine::new(&settings)
        .with_sink(Arc::new(bus.clone()))
        .with_cancellation(shutdown.cancel_token());
    let result = engine.run(pairs).await;

    // closing every sender lets the renderer drain and exit
    bus.clear().await;
    renderer.await?;

    let summary = result?;
    output::print_summary(&summary);
    if let Some(path) = &args.report {
        output::write_report(&summary, path).await?;
        info!(path = %path, "Wrote run report");
    }

    if shutdown.is_shutdown_requested() && !summary.cancelled {
        info!("Shutdown requested after every job had finished");
    }
    Ok(ExitCode::for_summary(&summary))
}

/// System env, then the optional .env file, then command-line flags.
fn load_settings(args: &CopyArgs) -> Result<TransferSettings, CliError> {
    let mut env = EnvManager::from_system();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }

    let mut overrides = TransferSettingsBuilder::new();
    if let Some(page_size) = args.page_size {
        overrides = overrides.page_size(page_size);
    }

    Ok(TransferSettingsBuilder::from_env_map(env.all())?
        .merge(overrides)
        .build()?)
}

/// Every user collection by default; otherwise the requested ones, which
/// must all exist.
async fn select_collections(
    source: &MongoStore,
    requested: &[String],
) -> Result<Vec<String>, CliError> {
    let available = source.collection_names().await?;
    pick_collections(available, requested)
}

fn pick_collections(available: Vec<String>, requested: &[String]) -> Result<Vec<String>, CliError> {
    if requested.is_empty() {
        return Ok(available);
    }

    let mut selected = Vec::with_capacity(requested.len());
    for name in requested.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !available.iter().any(|a| a == name) {
            return Err(CliError::UnknownCollection(name.to_string()));
        }
        if !selected.iter().any(|s: &String| s == name) {
            selected.push(name.to_string());
        }
    }
    Ok(selected)
}

async fn confirm(names: &[String], target_db: &str) -> Result<bool, CliError> {
    let prompt = format!(
        "Replace {} collection(s) in target database '{}' ({})?",
        names.len(),
        target_db,
        names.join(", ")
    );

    let answer = tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
    })
    .await??;
    Ok(answer)
}
