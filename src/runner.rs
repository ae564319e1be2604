use crate::collectors::checks::run_check;
use crate::collectors::{containers, system};
use crate::config::Config;
use crate::state::{CheckResult, RunReport};
use crate::tools::HostTools;
use reqwest::Client;
use std::io::{self, Write};
use sysinfo::System;
use tracing::info;

const NAME_WIDTH: usize = 20;
const RULE_WIDTH: usize = 40;

/// One pass over resources, containers and the service table. Checks run one after another.
pub struct HealthRunner<'a> {
    cfg: &'a Config,
    tools: &'a dyn HostTools,
    client: Client,
}

impl<'a> HealthRunner<'a> {
    pub fn new(cfg: &'a Config, tools: &'a dyn HostTools, client: Client) -> Self {
        Self { cfg, tools, client }
    }

    pub async fn run(&self, system: &mut System, out: &mut impl Write) -> io::Result<RunReport> {
        writeln!(out, "\n🏥 STARTING HOMELAB HEALTH CHECK 🏥")?;

        print_header(out, "System Resources")?;
        let resources = system::report(system, self.tools, out)?;

        let runtime = containers::runtime_label(&self.cfg.container_runtime);
        print_header(out, &format!("{runtime} Containers"))?;
        containers::list(self.tools, &self.cfg.container_runtime, out)?;

        print_header(out, "Service Availability")?;
        let mut checks = Vec::with_capacity(self.cfg.services.len());
        for spec in &self.cfg.services {
            let result = run_check(&self.client, self.cfg, spec).await;
            write_check_line(out, &result)?;
            checks.push(result);
        }

        let report = RunReport { resources, checks };
        write_summary(out, &report)?;
        info!(
            services = report.checks.len(),
            down = report.down().count(),
            probe_ms = report.checks.iter().map(|c| c.latency_ms).sum::<u64>(),
            temperature = report.resources.temperature.as_deref().unwrap_or("n/a"),
            "health check finished"
        );
        Ok(report)
    }
}

fn print_header(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "\n🔹 {title}")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

fn write_check_line(out: &mut impl Write, result: &CheckResult) -> io::Result<()> {
    let name = &result.spec.name;
    if result.up() {
        writeln!(out, "✅ {name:<NAME_WIDTH$.NAME_WIDTH$} UP")
    } else {
        writeln!(
            out,
            "❌ {name:<NAME_WIDTH$.NAME_WIDTH$} DOWN ({})",
            result.spec.target()
        )
    }
}

fn write_summary(out: &mut impl Write, report: &RunReport) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
    if report.all_up() {
        writeln!(out, "🚀 All systems operational!")
    } else {
        writeln!(out, "⚠️  Some services are down, check logs!")
    }
}
