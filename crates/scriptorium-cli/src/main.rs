//! Scriptorium command line
//!
//! Exit status: `0` when the chain resolved completely, `1` when it broke
//! part-way (or no key was found), `2` on setup errors.

mod catalog;
mod config;
mod telemetry;

use anyhow::Context;
use catalog::CatalogSession;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::Settings;
use scriptorium_core::{
    discover_chain, ArtifactRef, ChainReport, ChainResolver, ItemStatus, Session,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const EXIT_INCOMPLETE: u8 = 1;
const EXIT_SETUP: u8 = 2;

fn cli() -> Command {
    let catalog = Arg::new("catalog")
        .long("catalog")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Catalog manifest (JSON)");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Settings file (TOML)");

    Command::new("scriptorium")
        .version(scriptorium_core::VERSION)
        .about("Resolve a chain of locked manuscripts")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Discover, order and unlock every manuscript in a catalog")
                .arg(catalog.clone())
                .arg(config.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("order")
                .about("Print the chain order of a catalog")
                .arg(catalog)
                .arg(config.clone()),
        )
        .subcommand(
            Command::new("extract")
                .about("Recover the access key from one document")
                .arg(
                    Arg::new("artifact")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("PDF to read"),
                )
                .arg(config),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let matches = cli().get_matches();
    telemetry::init(matches.get_flag("log-json"));

    let outcome = match matches.subcommand() {
        Some(("resolve", args)) => resolve(args).await,
        Some(("order", args)) => order(args).await,
        Some(("extract", args)) => extract(args).await,
        _ => unreachable!("clap requires a subcommand"),
    };

    outcome.unwrap_or_else(|e| {
        tracing::error!(error = %format!("{e:#}"), "Setup failed");
        eprintln!("error: {e:#}");
        ExitCode::from(EXIT_SETUP)
    })
}

fn config_path(args: &ArgMatches) -> Option<&Path> {
    args.get_one::<PathBuf>("config").map(PathBuf::as_path)
}

fn catalog_path(args: &ArgMatches) -> anyhow::Result<&Path> {
    args.get_one::<PathBuf>("catalog")
        .map(PathBuf::as_path)
        .context("--catalog is required")
}

async fn resolve(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(config_path(args))?;
    let session = Arc::new(CatalogSession::open(catalog_path(args)?, &settings.downloads_dir).await?);
    let report = resolve_and_close(session, &settings).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_INCOMPLETE)
    })
}

/// Run the chain, then release the session whatever the outcome
async fn resolve_and_close(
    session: Arc<CatalogSession>,
    settings: &Settings,
) -> anyhow::Result<ChainReport> {
    let outcome = run_chain(Arc::clone(&session), settings).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close session");
    }
    outcome
}

async fn run_chain(session: Arc<CatalogSession>, settings: &Settings) -> anyhow::Result<ChainReport> {
    let keys = Arc::new(settings.key_extractor()?);
    let challenge = Arc::new(settings.challenge_resolver()?);
    let groups = settings.chain.layout.groups();

    let items = discover_chain(session.as_ref(), session.as_ref(), &groups).await?;
    tracing::info!(items = items.len(), "Chain discovered");

    let resolver = ChainResolver::new(session.clone(), session, keys, challenge)
        .with_config(settings.chain);
    Ok(resolver.resolve(items).await?)
}

fn print_report(report: &ChainReport) {
    println!("run {}", report.run_id);
    for (item, outcome) in report.items.iter().zip(&report.outcomes) {
        let status = match &outcome.status {
            ItemStatus::Resolved => "ok".to_string(),
            ItemStatus::Failed { reason } => format!("failed: {reason}"),
        };
        let key = item.unlock_key.as_deref().unwrap_or("-");
        println!(
            "  {:>6}  {:<32} {:<16} key {:<12} {}",
            item.ordering_label, item.title, outcome.strategy, key, status
        );
    }
    match report.first_failure() {
        None => println!("resolved {} of {}", report.resolved_count(), report.items.len()),
        Some(broken) => println!(
            "resolved {} of {}; chain broke at `{}`",
            report.resolved_count(),
            report.items.len(),
            broken.title
        ),
    }
}

async fn order(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(config_path(args))?;
    let session = CatalogSession::open(catalog_path(args)?, &settings.downloads_dir).await?;

    let outcome = discover_chain(&session, &session, &settings.chain.layout.groups()).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close session");
    }

    for item in outcome? {
        println!("{}\t{}\t{}", item.ordering_key, item.title, item.group);
    }
    Ok(ExitCode::SUCCESS)
}

async fn extract(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(config_path(args))?;
    let artifact = args
        .get_one::<PathBuf>("artifact")
        .context("artifact path is required")?;
    let extractor = settings.key_extractor()?;

    match extractor.extract(&ArtifactRef::new(artifact)).await {
        Ok(key) => {
            println!("{key}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(artifact = %artifact.display(), error = %e, "No key recovered");
            Ok(ExitCode::from(EXIT_INCOMPLETE))
        }
    }
}
