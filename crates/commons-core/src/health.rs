//! Liveness and readiness probes.

use std::fmt::Display;

use axum::http::StatusCode;

/// `GET /healthz`: the process is up and serving requests.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a dependency check to a readiness status. Failures are logged and
/// answer 503.
pub fn readiness<E: Display>(dependency: &str, check: Result<(), E>) -> StatusCode {
    match check {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(dependency, error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
