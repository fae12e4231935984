//! rpk-agent - command line front-end
//!
//! Wires configuration, the payload builder, the usage reporter and the admin
//! client together:
//! - `license info` prints the cluster license (text or JSON)
//! - `maintenance enable|disable <node-id>` toggles per-node maintenance mode
//! - `report metrics|environment` sends an opt-in usage report

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rpk_agent::format::{self, LicenseOutcome, OutputFormat};
use rpk_agent::payload::{environment_override_from_env, EnvironmentPayload, PayloadBuilder};
use rpk_agent::{system, AdminClient, AgentConfig, CancellationToken, UsageReporter};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rpk-agent",
    version,
    about = "Usage reporting and admin queries for Redpanda nodes"
)]
struct Cli {
    /// Config file (defaults to $RPK_AGENT_CONFIG, then the OS config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// License information
    #[command(subcommand)]
    License(LicenseCommand),
    /// Per-node maintenance mode
    #[command(subcommand)]
    Maintenance(MaintenanceCommand),
    /// Opt-in usage reporting
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Debug, Subcommand)]
enum LicenseCommand {
    /// Retrieve license information
    Info {
        #[arg(long, value_enum, default_value_t = CliOutputFormat::Text)]
        format: CliOutputFormat,
    },
}

#[derive(Debug, Subcommand)]
enum MaintenanceCommand {
    /// Enable maintenance mode for a node
    Enable {
        #[arg(allow_negative_numbers = true)]
        node_id: String,
    },
    /// Disable maintenance mode for a node
    Disable {
        #[arg(allow_negative_numbers = true)]
        node_id: String,
    },
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// Send free memory, free disk and CPU load
    Metrics {
        /// Collector base URL (overrides the config)
        #[arg(long)]
        url: Option<String>,
    },
    /// Send hardware/OS facts plus check and tuner results
    Environment {
        #[arg(long)]
        url: Option<String>,
        /// JSON file holding the checks/tuners payload
        #[arg(long)]
        payload: Option<PathBuf>,
        #[arg(long, default_value = "")]
        cloud_vendor: String,
        #[arg(long, default_value = "")]
        vm_type: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(value: CliOutputFormat) -> Self {
        match value {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Print to stderr and exit 1
fn die(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

/// Parse a user-supplied node id, rejecting negatives before any request
fn parse_node_id(raw: &str) -> std::result::Result<u32, String> {
    let node_id: i64 = raw
        .parse()
        .map_err(|e| format!("could not parse node id: {raw}: {e}"))?;
    if node_id < 0 {
        return Err(format!("invalid node id: {node_id}"));
    }
    u32::try_from(node_id).map_err(|e| format!("could not parse node id: {raw}: {e}"))
}

async fn license_info(
    config: &AgentConfig,
    output: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = AdminClient::new(config.admin_config())
        .context("unable to initialize admin client")?;
    let license = client
        .license_info(cancel)
        .await
        .context("unable to retrieve license info")?;

    match format::render_license_info(&license, output, Utc::now())
        .context("unable to print license information")?
    {
        LicenseOutcome::Report(view) => {
            println!("{}", view.body.trim_end());
            if let Some(warning) = view.warning {
                eprintln!("{warning}");
            }
            Ok(())
        }
        LicenseOutcome::Missing { message } => die(message),
    }
}

async fn maintenance(
    config: &AgentConfig,
    raw_node_id: &str,
    enabled: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let node_id = parse_node_id(raw_node_id).unwrap_or_else(|msg| die(msg));

    let client = AdminClient::new(config.admin_config())
        .context("unable to initialize admin client")?;
    let result = client.set_maintenance_mode(cancel, node_id, enabled).await;

    let outcome = format::maintenance_outcome(node_id, enabled, &result);
    if !outcome.is_success() {
        die(outcome.message());
    }
    println!("{}", outcome.message());
    Ok(())
}

async fn report(
    config: &AgentConfig,
    command: ReportCommand,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut reporting = config.reporting_config();
    let url_override = match &command {
        ReportCommand::Metrics { url } | ReportCommand::Environment { url, .. } => url.clone(),
    };
    if let Some(url) = url_override {
        reporting.url = url;
    }

    if !reporting.enable_usage_stats {
        info!("usage stats are disabled (rpk.enable_usage_stats = false); nothing sent");
        return Ok(());
    }

    let reporter = UsageReporter::new(reporting).context("unable to initialize reporter")?;
    let environment = environment_override_from_env();
    let builder = PayloadBuilder::new(config.identity()).with_environment(environment.clone());
    let sample = system::sample().await;
    debug!(?sample, "sampled local system");

    match command {
        ReportCommand::Metrics { .. } => {
            let metrics = builder.metrics(
                sample.free_memory_mb,
                sample.free_space_mb,
                sample.cpu_percentage,
            );
            reporter
                .send_metrics(&metrics, cancel)
                .await
                .context("error sending metrics")?;
        }
        ReportCommand::Environment {
            payload,
            cloud_vendor,
            vm_type,
            ..
        } => {
            let payload: EnvironmentPayload = match payload {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("unable to read payload {}", path.display()))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("invalid payload {}", path.display()))?
                }
                None => EnvironmentPayload::default(),
            };
            let facts =
                sample.into_environment_facts(cloud_vendor, vm_type, config.node.version.clone());
            let snapshot = builder.environment(facts, payload);
            reporter
                .send_environment(snapshot, environment.as_deref(), cancel)
                .await
                .context("error sending environment")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rpk_agent=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref())
        .await
        .context("unable to load config")?;

    // Ctrl-C aborts whatever request is in flight
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::License(LicenseCommand::Info { format }) => {
            license_info(&config, format.into(), &cancel).await
        }
        Command::Maintenance(MaintenanceCommand::Enable { node_id }) => {
            maintenance(&config, &node_id, true, &cancel).await
        }
        Command::Maintenance(MaintenanceCommand::Disable { node_id }) => {
            maintenance(&config, &node_id, false, &cancel).await
        }
        Command::Report(command) => report(&config, command, &cancel).await,
    }
}
