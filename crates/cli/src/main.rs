mod doctor_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    secrecy::Secret,
    sessmux_broker::{
        AcquireSettings, CredentialAcquirer, RefreshScheduler, SchedulerConfig, SessionStore,
    },
    sessmux_browser::{CdpDriver, Driver, DriverConfig},
    sessmux_config::{Severity, SessmuxConfig},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "sessmux", about = "Shared session broker for a single upstream account")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, global = true, env = "SESSMUX_CONFIG")]
    config: Option<PathBuf>,

    /// Account identity override (email or username).
    #[arg(long, global = true, env = "SESSMUX_IDENTITY")]
    identity: Option<String>,

    /// Account secret override.
    #[arg(long, global = true, env = "SESSMUX_SECRET", hide_env_values = true)]
    secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the broker: acquire at startup, then keep the session fresh
    /// (default when no subcommand is provided).
    Run,
    /// Acquire once, report the outcome, and exit.
    Acquire,
    /// Config validation and environment audit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// CLI/env credential overrides beat the config file.
fn apply_overrides(config: &mut SessmuxConfig, cli: &Cli) {
    if let Some(ref identity) = cli.identity {
        config.account.identity = Some(identity.clone());
    }
    if let Some(ref secret) = cli.secret {
        config.account.secret = Some(Secret::new(secret.clone()));
    }
}

/// Log every diagnostic, then refuse to proceed on errors.
fn check_config(config: &SessmuxConfig) -> anyhow::Result<()> {
    let report = sessmux_config::validate(config);
    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
        }
    }
    if report.has_errors() {
        anyhow::bail!("configuration is invalid; run `sessmux doctor` for details");
    }
    Ok(())
}

fn build_acquirer(config: &SessmuxConfig) -> Arc<CredentialAcquirer> {
    let driver: Arc<dyn Driver> = Arc::new(CdpDriver::new(DriverConfig::from(&config.browser)));
    Arc::new(CredentialAcquirer::new(
        driver,
        AcquireSettings::from_config(config),
    ))
}

async fn run_broker(config: SessmuxConfig) -> anyhow::Result<()> {
    check_config(&config)?;

    let store = Arc::new(SessionStore::new());
    let scheduler = RefreshScheduler::new(
        Arc::clone(&store),
        build_acquirer(&config),
        SchedulerConfig::from(&config.session),
    );
    scheduler.start().await;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    // Any in-flight acquisition is abandoned; the process is exiting anyway.
    scheduler.stop().await;
    Ok(())
}

async fn acquire_once(config: SessmuxConfig) -> anyhow::Result<()> {
    check_config(&config)?;

    match build_acquirer(&config).acquire().await {
        Ok(snapshot) => {
            // Cookie names only; values never reach stdout.
            println!("acquired {} session cookie(s):", snapshot.cookies().len());
            for cookie in snapshot.cookies() {
                println!("  {}", cookie.name);
            }
            println!("expires at (epoch ms): {}", snapshot.expires_at_ms());
            Ok(())
        },
        Err(err) => anyhow::bail!("acquisition failed: {err}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "sessmux starting");

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(sessmux_config::find_or_default_config_path);
    let mut config = match cli.config {
        Some(ref path) => sessmux_config::load_config(path)?,
        None => sessmux_config::discover_and_load(),
    };
    apply_overrides(&mut config, &cli);

    match cli.command {
        None | Some(Commands::Run) => run_broker(config).await,
        Some(Commands::Acquire) => acquire_once(config).await,
        Some(Commands::Doctor) => doctor_commands::run(&config, &config_path),
    }
}
