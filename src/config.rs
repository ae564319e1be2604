use reqwest::Url;
use std::collections::HashSet;
use std::env::VarError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const SSH_PORT_ENV: &str = "SSH_PORT";
pub const DEFAULT_SSH_PORT: u16 = 22456;
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_CONTAINER_RUNTIME: &str = "docker";
pub const DEFAULT_TEMPERATURE_COMMAND: [&str; 2] = ["vcgencmd", "measure_temp"];

/// Everything a single run needs, built once in `main` and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub ssh_port: u16,
    pub tcp_timeout: Duration,
    pub http_timeout: Duration,
    pub status_policy: StatusPolicy,
    pub container_runtime: String,
    pub temperature_command: Vec<String>,
    pub services: Vec<ServiceSpec>,
}

/// Which HTTP statuses count as a live service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// 2xx only.
    Success,
    /// 2xx, or 401 for services that are up but sit behind a login.
    SuccessOrUnauthorized,
}

impl StatusPolicy {
    pub fn accepts(self, status: u16) -> bool {
        let success = (200..300).contains(&status);
        match self {
            StatusPolicy::Success => success,
            StatusPolicy::SuccessOrUnauthorized => success || status == 401,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Tcp,
    Http,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Tcp => f.write_str("tcp"),
            ServiceKind::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    Tcp { host: String, port: u16 },
    Http { url: Url },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub target: ProbeTarget,
}

impl ServiceSpec {
    pub fn tcp(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let host = host.into();
        if !is_bare_host(&host) {
            return Err(ConfigError::Validation(format!(
                "tcp service '{name}' host '{host}' must be a bare hostname"
            )));
        }
        if port == 0 {
            return Err(ConfigError::Validation(format!(
                "tcp service '{name}' port must be in 1..65535"
            )));
        }
        Ok(Self {
            name,
            target: ProbeTarget::Tcp { host, port },
        })
    }

    pub fn http(name: impl Into<String>, url: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let parsed = Url::parse(url).map_err(|err| {
            ConfigError::Validation(format!("http service '{name}' url '{url}' is invalid: {err}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::Validation(format!(
                "http service '{name}' url '{url}' must be an http(s) URL with a host"
            )));
        }
        Ok(Self {
            name,
            target: ProbeTarget::Http { url: parsed },
        })
    }

    pub fn kind(&self) -> ServiceKind {
        match self.target {
            ProbeTarget::Tcp { .. } => ServiceKind::Tcp,
            ProbeTarget::Http { .. } => ServiceKind::Http,
        }
    }

    /// What gets printed next to a DOWN line.
    pub fn target(&self) -> String {
        match &self.target {
            ProbeTarget::Tcp { host, .. } => host.clone(),
            ProbeTarget::Http { url } => url.as_str().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SSH_PORT environment variable must be a number")]
    InvalidSshPort { value: String },
    #[error("invalid service table: {0}")]
    Validation(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Builds the config from an environment-like lookup, so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let ssh_port = match lookup(SSH_PORT_ENV) {
            Ok(raw) => parse_port(&raw)?,
            Err(VarError::NotPresent) => DEFAULT_SSH_PORT,
            Err(VarError::NotUnicode(raw)) => {
                return Err(ConfigError::InvalidSshPort {
                    value: raw.to_string_lossy().into_owned(),
                })
            }
        };

        let cfg = Self {
            ssh_port,
            tcp_timeout: DEFAULT_TCP_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            status_policy: StatusPolicy::SuccessOrUnauthorized,
            container_runtime: DEFAULT_CONTAINER_RUNTIME.to_string(),
            temperature_command: DEFAULT_TEMPERATURE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            services: default_services(ssh_port)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tcp_timeout.is_zero() || self.http_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "probe timeouts must be > 0".to_string(),
            ));
        }
        if self.container_runtime.trim().is_empty() {
            return Err(ConfigError::Validation(
                "container runtime must not be empty".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "service name must not be empty".to_string(),
                ));
            }
            if !names.insert(service.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "service name '{}' must be unique",
                    service.name
                )));
            }
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidSshPort {
            value: raw.to_string(),
        }),
    }
}

fn is_bare_host(host: &str) -> bool {
    !host.trim().is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

pub fn default_services(ssh_port: u16) -> Result<Vec<ServiceSpec>, ConfigError> {
    Ok(vec![
        ServiceSpec::tcp("SSH Server", "localhost", ssh_port)?,
        ServiceSpec::http("AdGuard Home", "http://localhost:80")?,
        ServiceSpec::http("Grafana", "http://localhost:3010/login")?,
        ServiceSpec::http("Prometheus", "http://localhost:9090")?,
        ServiceSpec::http("Uptime Kuma", "http://localhost:3001")?,
        ServiceSpec::http("Dockge", "http://localhost:5001")?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned().ok_or(VarError::NotPresent)
    }

    fn ssh_port_of(cfg: &Config) -> Option<u16> {
        cfg.services.iter().find_map(|s| match &s.target {
            ProbeTarget::Tcp { port, .. } if s.name == "SSH Server" => Some(*port),
            _ => None,
        })
    }

    #[test]
    fn unset_ssh_port_uses_default() {
        let cfg = Config::from_lookup(lookup_from(&[])).expect("default config");
        assert_eq!(cfg.ssh_port, DEFAULT_SSH_PORT);
        assert_eq!(ssh_port_of(&cfg), Some(DEFAULT_SSH_PORT));
    }

    #[test]
    fn ssh_port_override_reaches_the_table() {
        let cfg = Config::from_lookup(lookup_from(&[("SSH_PORT", "2222")])).expect("config");
        assert_eq!(ssh_port_of(&cfg), Some(2222));
    }

    #[test]
    fn non_numeric_ssh_port_is_fatal() {
        for bad in ["abc", "", "22a", "70000", "0", "-1"] {
            let err = Config::from_lookup(lookup_from(&[("SSH_PORT", bad)]))
                .expect_err("bad port must be rejected");
            assert!(
                matches!(err, ConfigError::InvalidSshPort { ref value } if value == bad),
                "unexpected error for {bad:?}: {err}"
            );
        }
    }

    #[test]
    fn invalid_ssh_port_message_is_fixed() {
        let err = Config::from_lookup(lookup_from(&[("SSH_PORT", "abc")]))
            .expect_err("bad port must be rejected");
        assert_eq!(
            err.to_string(),
            "SSH_PORT environment variable must be a number"
        );
    }

    #[test]
    fn defaults_cover_both_variants_knobs() {
        let cfg = Config::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(cfg.tcp_timeout, Duration::from_secs(2));
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        assert_eq!(cfg.status_policy, StatusPolicy::SuccessOrUnauthorized);
        assert_eq!(cfg.services.len(), 6);
        assert_eq!(cfg.services[0].kind(), ServiceKind::Tcp);
        assert!(cfg.services[1..]
            .iter()
            .all(|s| s.kind() == ServiceKind::Http));
    }

    #[test]
    fn status_policy_boundaries() {
        for code in [200, 204, 299] {
            assert!(StatusPolicy::Success.accepts(code));
            assert!(StatusPolicy::SuccessOrUnauthorized.accepts(code));
        }
        for code in [199, 300, 302, 403, 404, 500, 503] {
            assert!(!StatusPolicy::Success.accepts(code));
            assert!(!StatusPolicy::SuccessOrUnauthorized.accepts(code));
        }
        assert!(!StatusPolicy::Success.accepts(401));
        assert!(StatusPolicy::SuccessOrUnauthorized.accepts(401));
    }

    #[test]
    fn tcp_spec_requires_bare_host() {
        assert!(ServiceSpec::tcp("ssh", "localhost", 22).is_ok());
        assert!(ServiceSpec::tcp("ssh", "10.0.0.5", 22).is_ok());
        assert!(ServiceSpec::tcp("ssh", "http://localhost", 22).is_err());
        assert!(ServiceSpec::tcp("ssh", "localhost:22", 22).is_err());
        assert!(ServiceSpec::tcp("ssh", " ", 22).is_err());
        assert!(ServiceSpec::tcp("ssh", "localhost", 0).is_err());
    }

    #[test]
    fn http_spec_requires_http_url() {
        let spec = ServiceSpec::http("grafana", "http://localhost:3010/login").expect("valid");
        assert_eq!(spec.target(), "http://localhost:3010/login");
        assert!(ServiceSpec::http("x", "localhost:3010").is_err());
        assert!(ServiceSpec::http("x", "ftp://localhost/").is_err());
        assert!(ServiceSpec::http("x", "not a url").is_err());
    }

    #[test]
    fn duplicate_service_names_are_rejected() {
        let mut cfg = Config::from_lookup(lookup_from(&[])).expect("config");
        let first = cfg.services[1].clone();
        cfg.services.push(first);
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }
}
