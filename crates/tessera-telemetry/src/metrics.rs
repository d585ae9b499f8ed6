//! Prometheus metrics for the identity layer.
//!
//! # Identity Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tessera_client_ids_assigned_total` | Counter | - | Fresh client IDs generated |
//! | `tessera_user_tokens_reissued_total` | Counter | `reason` | User tokens replaced |
//! | `tessera_preview_tokens_total` | Counter | `state` | Preview tokens resolved (active, exit) |
//! | `tessera_requests_excluded_total` | Counter | - | Requests skipped by the exclusion filter |
//!
//! Recording functions are safe to call before [`init_metrics`]; the
//! `metrics` facade discards observations until a recorder is installed.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Fresh client IDs generated.
pub const CLIENT_IDS_ASSIGNED: &str = "tessera_client_ids_assigned_total";

/// User tokens replaced, by reason.
pub const USER_TOKENS_REISSUED: &str = "tessera_user_tokens_reissued_total";

/// Preview tokens resolved, by state.
pub const PREVIEW_TOKENS: &str = "tessera_preview_tokens_total";

/// Requests skipped by the exclusion filter.
pub const REQUESTS_EXCLUDED: &str = "tessera_requests_excluded_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Installs the Prometheus recorder.
///
/// The hosting server exposes [`render_metrics`] on its own endpoint.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(CLIENT_IDS_ASSIGNED, "Number of fresh client IDs generated");
    describe_counter!(
        USER_TOKENS_REISSUED,
        "Number of user tokens replaced by a freshly issued one"
    );
    describe_counter!(PREVIEW_TOKENS, "Number of preview tokens resolved by state");
    describe_counter!(
        REQUESTS_EXCLUDED,
        "Number of requests skipped by the static asset exclusion filter"
    );
}

/// Records a freshly generated client ID.
pub fn record_client_id_assigned() {
    counter!(CLIENT_IDS_ASSIGNED).increment(1);
}

/// Records a reissued user token.
///
/// * `reason` - Why the previous token was rejected (e.g., "expired")
pub fn record_user_token_reissued(reason: &'static str) {
    counter!(USER_TOKENS_REISSUED, "reason" => reason).increment(1);
}

/// Records a resolved preview token.
///
/// * `state` - Resolved state ("active" or "exit")
pub fn record_preview_token(state: &'static str) {
    counter!(PREVIEW_TOKENS, "state" => state).increment(1);
}

/// Records a request skipped by the exclusion filter.
pub fn record_request_excluded() {
    counter!(REQUESTS_EXCLUDED).increment(1);
}
