use crate::config::{Config, ProbeTarget, ServiceSpec, StatusPolicy};
use crate::state::CheckResult;
use reqwest::{Client, StatusCode};
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

// Services are probed directly; a proxy from the environment would mask their state.
pub fn build_client() -> Client {
    Client::builder()
        .user_agent(concat!("homelab-health/", env!("CARGO_PKG_VERSION")))
        .no_proxy()
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub async fn probe_tcp(host: &str, port: u16, timeout: Duration) -> Result<(), ProbeError> {
    match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(err)) => Err(ProbeError::Connect(err)),
        Err(_elapsed) => Err(ProbeError::Timeout(timeout)),
    }
}

/// GET with redirects followed by the client's default policy.
pub async fn probe_http(
    client: &Client,
    url: &str,
    timeout: Duration,
    policy: StatusPolicy,
) -> Result<(), ProbeError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                ProbeError::Timeout(timeout)
            } else {
                ProbeError::Request(err)
            }
        })?;

    let status = resp.status();
    if policy.accepts(status.as_u16()) {
        Ok(())
    } else {
        Err(ProbeError::Status(status))
    }
}

pub async fn run_check(client: &Client, cfg: &Config, spec: &ServiceSpec) -> CheckResult {
    let start = Instant::now();
    let outcome = match &spec.target {
        ProbeTarget::Tcp { host, port } => probe_tcp(host, *port, cfg.tcp_timeout).await,
        ProbeTarget::Http { url } => {
            probe_http(client, url.as_str(), cfg.http_timeout, cfg.status_policy).await
        }
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        Ok(()) => debug!(check = %spec.name, kind = %spec.kind(), latency_ms, "check passed"),
        Err(err) => warn!(
            check = %spec.name,
            kind = %spec.kind(),
            address = %spec.target(),
            latency_ms,
            error = %err,
            "check failed"
        ),
    }

    CheckResult {
        spec: spec.clone(),
        outcome,
        latency_ms,
    }
}
