//! autodeploy - pull, build and publish the projects that are due
//!
//! Without arguments the tool only reports: it writes a
//! `PendingDeployment.html` listing the due projects and opens it. With the
//! single argument `DEPLOY` (any case) it deploys every due project, clears
//! their signals and sends one notification naming the deployed projects.
//!
//! ## Exit codes
//!
//! - `0`: the batch ran, even if individual projects failed
//! - `1`: a prerequisite (settings, database credentials) could not be resolved
//! - `2`: unrecognized mode argument

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};

use autodeploy_core::notify::TELEGRAM_TOKEN_ENV;
use autodeploy_core::{
    init_tracing, open_report, render_pending_html, write_pending_report, AppConfig,
    BatchCoordinator, ConfigProjectSource, DeployContext, EligibilityBackend, EligibilitySource,
    LogNotifier, MarkerFileSignal, Notifier, ProjectSource, QueuedFlagSignal, StoreProjectSource,
    TelegramNotifier, TokioProcessRunner, TracingSink,
};
use autodeploy_state::{ProjectStore, SurrealProjectStore};

#[derive(Parser)]
#[command(name = "autodeploy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deploy queued projects from their git branches", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Settings document
    #[arg(long, env = "AUTODEPLOY_CONFIG", default_value = "autodeploy.json")]
    config: PathBuf,

    /// Write the pending report without opening it
    #[arg(long)]
    no_open: bool,

    /// `DEPLOY` to deploy; omit to only report pending projects
    mode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Report,
    Deploy,
}

fn parse_mode(arg: Option<&str>) -> Option<Mode> {
    match arg {
        None => Some(Mode::Report),
        Some(a) if a.trim().eq_ignore_ascii_case("deploy") => Some(Mode::Deploy),
        Some(_) => None,
    }
}

/// Log a command-line error and pick the exit code. Help and version
/// requests are not errors.
fn usage_exit_code(err: &clap::Error) -> u8 {
    if !err.use_stderr() {
        let _ = err.print();
        return 0;
    }
    error!(critical = true, kind = ?err.kind(), "Invalid arguments: {}", err.to_string().trim());
    2
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            init_tracing(false, Level::INFO);
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let Some(mode) = parse_mode(cli.mode.as_deref()) else {
        error!(
            critical = true,
            argument = cli.mode.as_deref().unwrap_or_default(),
            "Invalid argument; expected DEPLOY or nothing"
        );
        return ExitCode::from(2);
    };

    match run(&cli, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(critical = true, error = %format!("{e:#}"), "autodeploy aborted");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, mode: Mode) -> Result<()> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;

    let (source, signal): (Box<dyn ProjectSource>, Arc<dyn EligibilitySource>) =
        match config.eligibility {
            EligibilityBackend::MarkerFile => (
                Box::new(ConfigProjectSource::new(config.projects.clone())),
                Arc::new(MarkerFileSignal::new(&config.marker_file)),
            ),
            EligibilityBackend::QueuedFlag => {
                let store: Arc<dyn ProjectStore> = Arc::new(
                    SurrealProjectStore::from_env()
                        .await
                        .context("Failed to connect to deployment queue database")?,
                );
                (
                    Box::new(StoreProjectSource::new(store.clone())),
                    Arc::new(QueuedFlagSignal::new(store)),
                )
            }
        };

    let declared = source.load().await.context("Failed to load projects")?;
    info!(
        projects = declared.len(),
        backend = config.eligibility.name(),
        "Loaded project declarations"
    );

    let ctx = DeployContext::from_config(
        &config,
        Arc::new(TokioProcessRunner),
        Arc::new(TracingSink),
    );
    let coordinator = BatchCoordinator::new(ctx, signal, notifier(&config)?);

    match mode {
        Mode::Report => {
            let pending = coordinator.report(declared).await;
            let html = render_pending_html(&pending.eligible);
            let path = write_pending_report(&config.report.output_dir, &html)?;
            if config.report.open && !cli.no_open {
                open_report(&path);
            }
        }
        Mode::Deploy => {
            let result = coordinator.deploy(declared).await;
            if cli.json {
                info!(result = %serde_json::to_string(&result)?, "Batch result");
            }
        }
    }
    Ok(())
}

fn notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    let Some(settings) = &config.notify.telegram else {
        return Ok(Arc::new(LogNotifier));
    };
    match TelegramNotifier::from_settings(settings)? {
        Some(telegram) => Ok(Arc::new(telegram)),
        None => {
            info!("{} not set; notifications go to the log", TELEGRAM_TOKEN_ENV);
            Ok(Arc::new(LogNotifier))
        }
    }
}
