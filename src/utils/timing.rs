use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::utils::logging::TIMING_TARGET;

/// Per-request timing record. Only the feeling's length is logged, never
/// its text.
#[derive(Debug)]
pub struct RequestTimer {
    route: String,
    intensity: Option<i64>,
    feeling_chars: Option<usize>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl RequestTimer {
    pub fn new(route: &str) -> Self {
        RequestTimer {
            route: route.to_string(),
            intensity: None,
            feeling_chars: None,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn with_feeling(mut self, feeling: &str, intensity: i64) -> Self {
        self.feeling_chars = Some(feeling.chars().count());
        self.intensity = Some(intensity);
        self
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=request_received route={} intensity={:?} feeling_chars={:?} received_at={}",
            self.route,
            self.intensity,
            self.feeling_chars,
            self.started_at.to_rfc3339()
        );
    }

    /// Ignored once the completion line has been logged.
    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        if self.completed {
            return;
        }
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=request_completed route={} intensity={:?} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.route,
            self.intensity,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.completed {
            self.mark_status("dropped", None);
            self.log_completed();
        }
    }
}

pub fn start_request_timer(route: &str) -> RequestTimer {
    let timer = RequestTimer::new(route);
    timer.log_received();
    timer
}

pub fn complete_request_timer(timer: &mut RequestTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_generation_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        "event=generation_request provider={} model={} operation={} started_at={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=generation_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}
