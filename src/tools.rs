use crate::config::Config;
use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

pub const CONTAINER_FORMAT: &str = "table {{.Names}}\t{{.Status}}\t{{.Ports}}";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{program} not found")]
    NotFound { program: String },
    #[error("{program} failed: {reason}")]
    Failed { program: String, reason: String },
}

/// External commands the report depends on. Faked in tests.
pub trait HostTools {
    /// Lines of the container runtime's running-container table, header included.
    fn list_containers(&self) -> Result<Vec<String>, ToolError>;

    /// Human-readable CPU temperature, `None` when the host has no way to tell.
    fn read_temperature(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct SystemTools {
    container_runtime: String,
    temperature_command: Vec<String>,
}

impl SystemTools {
    pub fn new(container_runtime: impl Into<String>, temperature_command: Vec<String>) -> Self {
        Self {
            container_runtime: container_runtime.into(),
            temperature_command,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.container_runtime.clone(), cfg.temperature_command.clone())
    }
}

impl HostTools for SystemTools {
    fn list_containers(&self) -> Result<Vec<String>, ToolError> {
        let program = self.container_runtime.as_str();
        let output = Command::new(program)
            .args(["ps", "--format", CONTAINER_FORMAT])
            .output()
            .map_err(|err| classify_spawn_error(program, err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::Failed {
                program: program.to_string(),
                reason: match stderr.trim() {
                    "" => output.status.to_string(),
                    msg => msg.to_string(),
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn read_temperature(&self) -> Option<String> {
        let (program, args) = self.temperature_command.split_first()?;
        let output = match Command::new(program).args(args).output() {
            Ok(output) => output,
            Err(err) => {
                debug!(program = %program, error = %err, "temperature command unavailable");
                return None;
            }
        };
        if !output.status.success() {
            debug!(program = %program, status = %output.status, "temperature command failed");
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn classify_spawn_error(program: &str, err: io::Error) -> ToolError {
    if err.kind() == io::ErrorKind::NotFound {
        ToolError::NotFound {
            program: program.to_string(),
        }
    } else {
        ToolError::Failed {
            program: program.to_string(),
            reason: err.to_string(),
        }
    }
}
