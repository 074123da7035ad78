//! HTTP host metrics server.
//!
//! Serves JSON snapshots of CPU, memory, storage, processes, and per-interface
//! network rates. Network rates come from a shared [`RateSampler`]: a
//! background collector feeds it on a fixed period, or, with the collector
//! disabled, each `/network` request samples on demand. The API index lives at
//! `/api`; every other unmatched path, `/` included, falls through to static
//! files so the dashboard's `index.html` is served at the root.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::services::ServeDir;

use hostpulse_core::{
    CounterSnapshot, Error, HostStatus, MetricsProvider, ProcessInfo, RateSample, RateSampler,
    UsageStat, collect_status,
};

pub use config::ServerConfig;

/// Shared server state.
pub struct AppState {
    provider: Arc<dyn MetricsProvider>,
    sampler: RateSampler,
    /// Rates from the last successful collector cycle.
    latest: Mutex<Vec<RateSample>>,
    collector_enabled: bool,
    allow_process_control: bool,
}

impl AppState {
    pub fn new(provider: Arc<dyn MetricsProvider>, config: &ServerConfig) -> Self {
        Self {
            provider,
            sampler: RateSampler::with_eviction(config.eviction()),
            latest: Mutex::new(Vec::new()),
            collector_enabled: config.collector_enabled(),
            allow_process_control: config.allow_process_control,
        }
    }

    /// Rates stored by the last successful collector cycle.
    pub async fn latest_rates(&self) -> Vec<RateSample> {
        self.latest.lock().await.clone()
    }

}

/// Current network rates: cached when the collector runs, sampled now otherwise.
async fn network_rates(state: &Arc<AppState>) -> Result<Vec<RateSample>, ApiError> {
    if state.collector_enabled {
        Ok(state.latest_rates().await)
    } else {
        blocking(state, |s| s.sampler.sample_network(s.provider.as_ref())).await
    }
}

/// Run a provider call on the blocking pool. Every provider method does
/// synchronous OS work.
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> hostpulse_core::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("provider task failed: {e}"),
        })?;
    Ok(result?)
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct ProcessActionResponse {
    success: bool,
    action: &'static str,
    pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_pid: Option<u32>,
}

/// Error converted into a JSON body with a matching status code.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match e {
            Error::Provider { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::ProcessNotFound(_) => StatusCode::NOT_FOUND,
            Error::ProcessControl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidWindow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn handle_status(State(state): State<Arc<AppState>>) -> ApiResult<HostStatus> {
    let network = network_rates(&state).await?;
    Ok(Json(
        blocking(&state, move |s| collect_status(s.provider.as_ref(), network)).await?,
    ))
}

async fn handle_cpu(State(state): State<Arc<AppState>>) -> ApiResult<f64> {
    Ok(Json(blocking(&state, |s| s.provider.cpu_usage()).await?))
}

async fn handle_memory(State(state): State<Arc<AppState>>) -> ApiResult<f64> {
    Ok(Json(blocking(&state, |s| s.provider.memory_usage()).await?))
}

async fn handle_network(State(state): State<Arc<AppState>>) -> ApiResult<Vec<RateSample>> {
    Ok(Json(network_rates(&state).await?))
}

async fn handle_network_raw(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CounterSnapshot>> {
    Ok(Json(blocking(&state, |s| s.provider.network_counters()).await?))
}

async fn handle_storage(State(state): State<Arc<AppState>>) -> ApiResult<Vec<UsageStat>> {
    Ok(Json(blocking(&state, |s| s.provider.storage_usage()).await?))
}

async fn handle_processes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ProcessInfo>> {
    Ok(Json(blocking(&state, |s| s.provider.processes()).await?))
}

fn require_process_control(state: &AppState) -> Result<(), ApiError> {
    if state.allow_process_control {
        Ok(())
    } else {
        Err(ApiError {
            status: StatusCode::FORBIDDEN,
            message: "process control is disabled (start with --allow-process-control)"
                .to_string(),
        })
    }
}

async fn handle_kill(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<u32>,
) -> ApiResult<ProcessActionResponse> {
    require_process_control(&state)?;
    blocking(&state, move |s| s.provider.kill_process(pid)).await?;
    Ok(Json(ProcessActionResponse {
        success: true,
        action: "kill",
        pid,
        new_pid: None,
    }))
}

async fn handle_restart(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<u32>,
) -> ApiResult<ProcessActionResponse> {
    require_process_control(&state)?;
    let new_pid = blocking(&state, move |s| s.provider.restart_process(pid)).await?;
    Ok(Json(ProcessActionResponse {
        success: true,
        action: "restart",
        pid,
        new_pid: Some(new_pid),
    }))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sampling = if state.collector_enabled {
        "collector"
    } else {
        "on_request"
    };
    Json(serde_json::json!({
        "name": "hostpulse",
        "version": hostpulse_core::VERSION,
        "provider": state.provider.name(),
        "platform": hostpulse_core::platform_info(),
        "network_sampling": sampling,
        "process_control": state.allow_process_control,
        "endpoints": {
            "/api": "This API index",
            "/status": "CPU, memory, process names, network rates, and storage in one document",
            "/cpu": "Global CPU usage percent",
            "/memory": "Used memory percent",
            "/network": "Per-interface rx/tx bytes per second",
            "/network/raw": "Per-interface cumulative rx/tx byte counters",
            "/storage": "Per-partition usage",
            "/processes": "Running processes",
            "/processes/{pid}/kill": "POST: terminate a process (requires --allow-process-control)",
            "/processes/{pid}/restart": "POST: restart a process (requires --allow-process-control)",
        },
    }))
}

/// Build the axum router around existing state.
pub fn router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/api", get(handle_index))
        .route("/status", get(handle_status))
        .route("/cpu", get(handle_cpu))
        .route("/memory", get(handle_memory))
        .route("/network", get(handle_network))
        .route("/network/raw", get(handle_network_raw))
        .route("/storage", get(handle_storage))
        .route("/processes", get(handle_processes))
        .route("/processes/{pid}/kill", post(handle_kill))
        .route("/processes/{pid}/restart", post(handle_restart))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Build the axum router with fresh state for `provider`.
pub fn build_router(provider: Arc<dyn MetricsProvider>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState::new(provider, config));
    router(state, &config.static_dir)
}

/// Feed the shared sampler every `interval` until the runtime shuts down.
///
/// Each cycle runs on the blocking pool like every other provider call. A
/// failed cycle is logged and leaves the previous rates in place.
pub fn spawn_collector(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let cycle_state = Arc::clone(&state);
            let result = tokio::task::spawn_blocking(move || {
                cycle_state
                    .sampler
                    .sample_network(cycle_state.provider.as_ref())
            })
            .await;
            match result {
                Ok(Ok(rates)) => {
                    log::debug!("collector cycle produced {} rates", rates.len());
                    *state.latest.lock().await = rates;
                }
                Ok(Err(e)) => log::error!("network sampling failed: {e}"),
                Err(e) => log::error!("network sampling task aborted: {e}"),
            }
        }
    })
}

/// Run the HTTP metrics server until the listener fails.
pub async fn run_server(
    provider: Arc<dyn MetricsProvider>,
    config: &ServerConfig,
) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(provider, config));
    if config.collector_enabled() {
        spawn_collector(Arc::clone(&state), config.sample_interval);
    }
    let app = router(state, &config.static_dir);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_maps_to_503() {
        let e: ApiError = Error::Provider {
            metric: "cpu usage",
            reason: "boom".to_string(),
        }
        .into();
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(e.message.contains("boom"));
    }

    #[test]
    fn missing_process_maps_to_404() {
        let e: ApiError = Error::ProcessNotFound(12).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn process_control_failure_maps_to_500() {
        let e: ApiError = Error::ProcessControl {
            pid: 1,
            reason: "denied".to_string(),
        }
        .into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
