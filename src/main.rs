//! oVirt Inventory Collector
//!
//! Runs one collection against the configured engine and prints the per-VM
//! report as a JSON array on stdout. Logs go to stderr. Any failure aborts
//! the run with a non-zero exit code and no report.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ovirt_inventory::{
    collect, write_report, CollectorConfig, OvirtClient, PasswordSource, ReportFormat, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// oVirt Inventory Collector - per-VM memory, status and disk tier report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file; flags and environment override its values
    #[arg(long, env = "OVIRT_CONFIG")]
    config: Option<PathBuf>,

    /// Engine host, e.g. engine.example.org or https://engine.example.org
    #[arg(long, env = "OVIRT_HOST")]
    host: Option<String>,

    /// REST API path on the engine
    #[arg(long, env = "OVIRT_BASE_PATH")]
    base_path: Option<String>,

    /// Account name
    #[arg(long, env = "OVIRT_USER")]
    username: Option<String>,

    /// Name of the environment variable holding the password
    #[arg(long, env = "OVIRT_PASSWORD_ENV", conflicts_with = "password_file")]
    password_env: Option<String>,

    /// File holding the password
    #[arg(long, env = "OVIRT_PASSWORD_FILE")]
    password_file: Option<PathBuf>,

    /// Directory of PEM trust anchors for the engine certificate
    #[arg(long, env = "OVIRT_CA_DIR")]
    ca_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "OVIRT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Indent the JSON report
    #[arg(long, env = "OVIRT_PRETTY")]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// Build the collector config: file (or defaults), then flags
    fn collector_config(&self) -> Result<CollectorConfig> {
        let mut config = match &self.config {
            Some(path) => CollectorConfig::from_yaml_file(path)?,
            None => CollectorConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(var) = &self.password_env {
            config.password_source = PasswordSource::Env { var: var.clone() };
        }
        if let Some(path) = &self.password_file {
            config.password_source = PasswordSource::File { path: path.clone() };
        }
        if let Some(dir) = &self.ca_dir {
            config.trust_anchor_dir = Some(dir.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    fn report_format(&self) -> ReportFormat {
        if self.pretty {
            ReportFormat::Pretty
        } else {
            ReportFormat::Compact
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    if let Err(e) = run(&args).await {
        error!(kind = %e.kind(), "Inventory collection failed: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = args.collector_config()?;

    info!("Starting oVirt inventory collection");
    info!("  Version: {}", ovirt_inventory::VERSION);
    info!("  Engine API: {}", config.api_url());
    info!("  User: {}", config.username);
    if let Some(dir) = &config.trust_anchor_dir {
        info!("  Trust anchors: {}", dir.display());
    }

    let client = OvirtClient::connect(&config).await?;
    let records = collect(&client).await?;

    write_report(&records, args.report_format(), std::io::stdout().lock())?;

    info!("Report written for {} VMs", records.len());
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("rustls=warn".parse().unwrap());

    // stdout carries the report; logs always go to stderr.
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
