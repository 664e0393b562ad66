//! Prometheus metrics.
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `songs_requests_total` | `operation`, `status` |
//! | `songs_request_duration_seconds` | `operation` |
//! | `outbound_attempts_total` | `operation`, `outcome` |

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

/// Default exporter port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Address to bind the metrics exporter.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings.
    #[must_use]
    pub fn from_settings(settings: &MetricsSettings) -> Self {
        let port = settings.port.unwrap_or(DEFAULT_METRICS_PORT);
        Self {
            enabled: settings.enabled,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }
}

/// Records one handled request.
pub fn record_request(operation: &'static str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "songs_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("songs_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Returns `Ok(false)` when metrics are disabled.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed or the
/// exporter cannot be built.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    let builder = PrometheusBuilder::new().with_http_listener(config.listen_addr);
    install_listener(builder)?;
    tracing::info!(addr = %config.listen_addr, "Prometheus exporter listening");
    Ok(true)
}

fn install_listener(builder: PrometheusBuilder) -> Result<()> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        return install_with_runtime(builder, &handle);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::operation("metrics_runtime_init", e))?;
    let handle = runtime.handle().clone();
    install_with_runtime(builder, &handle)?;
    thread::Builder::new()
        .name("metrics-exporter-prometheus-http".to_string())
        .spawn(move || runtime.block_on(std::future::pending::<()>()))
        .map_err(|e| Error::operation("metrics_runtime_thread", e))?;
    Ok(())
}

fn install_with_runtime(
    builder: PrometheusBuilder,
    runtime_handle: &tokio::runtime::Handle,
) -> Result<()> {
    let (recorder, exporter) = {
        let _guard = runtime_handle.enter();
        builder
            .build()
            .map_err(|e| Error::operation("metrics_exporter_build", e))?
    };
    set_global_recorder(recorder)?;
    runtime_handle.spawn(exporter);
    Ok(())
}

fn set_global_recorder(recorder: PrometheusRecorder) -> Result<()> {
    metrics::set_global_recorder(recorder).map_err(|e| Error::operation("metrics_recorder_install", e))
}
