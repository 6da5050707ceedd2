use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use commons_domain::id::SyncJobId;

use crate::infra::luma::LumaError;

/// Community service error variants.
#[derive(Debug, thiserror::Error)]
pub enum CommunityError {
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email does not match the selected profile")]
    EmailMismatch,
    #[error("person not found")]
    PersonNotFound,
    #[error("event not found")]
    EventNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("sync job not found")]
    SyncJobNotFound,
    #[error("invalid or expired claim link")]
    InvalidClaimToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("profile already claimed")]
    ProfileAlreadyClaimed,
    #[error("a sync is already running")]
    SyncAlreadyRunning(SyncJobId),
    #[error("too many requests, try again later")]
    TooManyRequests,
    #[error("events platform unavailable")]
    Upstream(#[from] LumaError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CommunityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::EmailMismatch => "EMAIL_MISMATCH",
            Self::PersonNotFound => "PERSON_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::SyncJobNotFound => "SYNC_JOB_NOT_FOUND",
            Self::InvalidClaimToken => "INVALID_CLAIM_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::ProfileAlreadyClaimed => "PROFILE_ALREADY_CLAIMED",
            Self::SyncAlreadyRunning(_) => "SYNC_ALREADY_RUNNING",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { status, .. } => *status,
            Self::InvalidEmail | Self::EmailMismatch => StatusCode::BAD_REQUEST,
            Self::PersonNotFound
            | Self::EventNotFound
            | Self::UserNotFound
            | Self::SyncJobNotFound => StatusCode::NOT_FOUND,
            Self::InvalidClaimToken | Self::InvalidToken | Self::InvalidRefreshToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::ProfileAlreadyClaimed | Self::SyncAlreadyRunning(_) => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for CommunityError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for CommunityError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for CommunityError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only server faults are logged here.
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = "INTERNAL", "internal error"),
            Self::Upstream(e) => {
                tracing::error!(error = %e, kind = "UPSTREAM_UNAVAILABLE", "upstream error")
            }
            _ => {}
        }
        let mut body = serde_json::json!({
            "ok": false,
            "kind": self.kind(),
            "error": self.to_string(),
        });
        if let Self::SyncAlreadyRunning(job_id) = &self {
            body["jobId"] = serde_json::json!(job_id);
        }
        (status, axum::Json(body)).into_response()
    }
}
