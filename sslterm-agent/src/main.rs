// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  sslterm-agent: certificate reconciliation hook
//
//  One invocation per event-bus hook. Reads the hook context,
//  runs the reconciler to a settled state, prints outbound
//  messages as JSON lines and persists the flags.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod app;
mod context;
mod outbox;

use clap::Parser;
use context::HookContext;
use sslterm_core::config::LogFormat;
use sslterm_core::{AgentConfig, SslTermError};
use sslterm_observability::MetricsCollector;
use sslterm_store::StateFile;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, info_span};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "sslterm-agent",
    version,
    about = "Requests TLS certificates from an SSL-termination proxy for a workload's upstreams"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/sslterm/sslterm.yaml")]
    config: PathBuf,

    /// Hook context (YAML or JSON); `-` reads stdin
    #[arg(long, default_value = "-")]
    context: String,

    /// Overrides agent.state_file from the config
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config before tracing: the log format lives in the config file.
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sslterm-agent: {e:#}");
            return exit_code(&e);
        }
    };

    init_tracing(&cli.log_level, config.observability.log_format);

    let run_id = Uuid::new_v4();
    let span = info_span!("hook", run_id = %run_id);
    let _guard = span.enter();

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "hook failed");
            exit_code(&e)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AgentConfig> {
    if cli.config.exists() {
        AgentConfig::load(&cli.config)
    } else {
        let config = AgentConfig::default();
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries the outbound messages; logs go to stderr.
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn run(cli: &Cli, config: &AgentConfig) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.agent.source,
        app = %config.agent.app_name,
        "sslterm-agent starting"
    );

    let context = HookContext::read(&cli.context)?;
    if let Some(event) = &context.event {
        info!(event = %event, "handling hook");
    }

    let state_path = cli
        .state_file
        .clone()
        .unwrap_or_else(|| config.agent.state_file.clone());
    let store = StateFile::new(state_path);
    info!(state_file = %store.path().display(), "using state file");
    let metrics = MetricsCollector::new(config.observability.metrics.enabled)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run_hook(config, &context, &store, &metrics, &mut out)?;
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let code = err
        .downcast_ref::<SslTermError>()
        .map(SslTermError::exit_code)
        .unwrap_or(1);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
