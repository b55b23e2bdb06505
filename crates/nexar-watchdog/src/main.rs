use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use nexar_backend::RestBackend;
use nexar_store::{FileStore, IntegritySnapshot, IntegrityStore};
use nexar_watchdog::{SnapshotFile, Watchdog, WatchdogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("nexar-watchdog")
        .version(nexar_watchdog::VERSION)
        .about("Nexar attribution watchdog")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value("nexar.toml")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Configuration file; defaults apply when it does not exist"),
        )
        .subcommand(Command::new("run").about("Run the boot and recurring checks until Ctrl-C"))
        .subcommand(Command::new("check").about("Run one check and wait for its consequences"))
        .subcommand(
            Command::new("status").about("Show persisted integrity state").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(Command::new("reset").about("Clear integrity state and re-enable every feature"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<WatchdogConfig> {
    let path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .context("missing --config")?;
    if path.exists() {
        return WatchdogConfig::load(&path).with_context(|| format!("loading {}", path.display()));
    }
    info!(path = %path.display(), "no config file, using defaults");
    Ok(WatchdogConfig::default().with_env_overrides())
}

fn open_store(config: &WatchdogConfig) -> anyhow::Result<Arc<FileStore>> {
    let file = FileStore::open(&config.state_path)
        .with_context(|| format!("opening state {}", config.state_path.display()))?;
    Ok(Arc::new(file))
}

fn build_watchdog(config: &WatchdogConfig) -> anyhow::Result<Watchdog> {
    let backend = Arc::new(RestBackend::new(config.backend.clone())?);
    let watchdog = Watchdog::builder()
        .config(config)
        .store(open_store(config)?)
        .settings_source(backend.clone())
        .log_sink(backend)
        .inspector(Arc::new(SnapshotFile::new(&config.page_path)))
        .build()?;
    Ok(watchdog)
}

fn print_status(snapshot: &IntegritySnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    println!("Integrity: {}", if snapshot.integrity_failed { "FAILED" } else { "intact" });
    if snapshot.disabled.is_empty() {
        println!("Disabled features: none");
    } else {
        let disabled: Vec<&str> = snapshot.disabled.iter().map(|feature| feature.as_str()).collect();
        println!("Disabled features: {}", disabled.join(", "));
    }
    if let Some(code) = &snapshot.system_error {
        println!("System error: {code}");
    }
    if let Some(code) = &snapshot.unknown_error {
        println!("Unknown error: {code}");
    }
    if snapshot.data_validation_failed {
        println!("Data validation: FAILED");
    }
    Ok(())
}

async fn execute(matches: ArgMatches) -> anyhow::Result<ExitCode> {
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("run", _)) => {
            let watchdog = build_watchdog(&config)?;
            let handles = watchdog.start();
            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
            info!("shutting down");
            handles.abort();
            watchdog.settle().await;
            Ok(ExitCode::SUCCESS)
        }
        Some(("check", _)) => {
            let watchdog = build_watchdog(&config)?;
            let outcome = watchdog.verifier().check().await;
            let code = match &outcome {
                Ok(()) => {
                    println!("Attribution intact");
                    ExitCode::SUCCESS
                }
                Err(kind) => {
                    let diagnostic = watchdog.report(kind.clone());
                    println!("Attribution check failed: {kind} [ERR-{diagnostic}]");
                    ExitCode::FAILURE
                }
            };
            watchdog.settle().await;
            Ok(code)
        }
        Some(("status", args)) => {
            let store = IntegrityStore::new(open_store(&config)?);
            print_status(&store.snapshot()?, args.get_flag("json"))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("reset", _)) => {
            let store = IntegrityStore::new(open_store(&config)?);
            let cleared = store.reset()?;
            println!("Integrity state cleared ({cleared} feature flags removed)");
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match execute(cli().get_matches()).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}
