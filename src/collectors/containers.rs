use crate::tools::{HostTools, ToolError};
use std::io::{self, Write};
use tracing::warn;

/// Display form of a runtime binary name: `docker` -> `Docker`.
pub fn runtime_label(runtime: &str) -> String {
    let mut chars = runtime.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Relays the runtime's container table, indented. Tool failures are printed, never returned.
pub fn list(tools: &dyn HostTools, runtime: &str, out: &mut impl Write) -> io::Result<()> {
    let label = runtime_label(runtime);
    match tools.list_containers() {
        Ok(lines) => {
            for line in lines {
                writeln!(out, "   {line}")?;
            }
        }
        Err(ToolError::NotFound { program }) => {
            warn!(program = %program, "container runtime not found");
            writeln!(out, "❌ {label} command not found.")?;
        }
        Err(err @ ToolError::Failed { .. }) => {
            warn!(error = %err, "container listing failed");
            writeln!(out, "❌ Failed to list {label} containers (Permission denied?)")?;
        }
    }
    Ok(())
}
