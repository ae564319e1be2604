mod collectors;
mod config;
mod runner;
mod state;
mod tools;

use clap::Parser;
use collectors::checks::build_client;
use config::{Config, ConfigError};
use runner::HealthRunner;
use std::env::VarError;
use std::io::{self, Write};
use std::process::ExitCode;
use sysinfo::{System, SystemExt};
use tools::SystemTools;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Checks host resources, containers and the homelab's services once, then exits
/// with 0 when every service is up and 1 otherwise.
///
/// Set SSH_PORT to override the port of the SSH check.
#[derive(Parser, Debug)]
#[command(name = "homelab-health")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let _cli = Cli::parse();

    let Some(cfg) = load_config(|key| std::env::var(key), &mut io::stdout()) else {
        return ExitCode::from(1);
    };
    info!(
        ssh_port = cfg.ssh_port,
        services = cfg.services.len(),
        tcp_timeout = %humantime::format_duration(cfg.tcp_timeout),
        http_timeout = %humantime::format_duration(cfg.http_timeout),
        "starting homelab health check"
    );

    let tools = SystemTools::from_config(&cfg);
    let runner = HealthRunner::new(&cfg, &tools, build_client());
    let mut system = System::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match runner.run(&mut system, &mut out).await {
        Ok(report) => ExitCode::from(report.exit_status()),
        Err(err) => {
            error!(error = %err, "failed to write report");
            ExitCode::from(1)
        }
    }
}

/// Reads the configuration, printing the fatal message when it is invalid.
fn load_config<F>(lookup: F, out: &mut impl Write) -> Option<Config>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match Config::from_lookup(lookup) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            match &err {
                ConfigError::InvalidSshPort { value } => {
                    error!(value = %value, "invalid configuration")
                }
                ConfigError::Validation(_) => error!(error = %err, "invalid configuration"),
            }
            let _ = writeln!(out, "❌ Error: {err}.");
            None
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
