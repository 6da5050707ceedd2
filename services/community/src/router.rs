use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use commons_core::health::healthz;
use commons_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    admin::{reset_database, start_sync, stats, sync_events, sync_snapshot},
    auth::{
        check_token, claim_profile, get_me, refresh_token, revoke_token, sign_in, verify_claim,
    },
    events::{next_event, send_invite},
    health::readyz,
    people::{check_email, list_people, search_emails},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Event streams stay open for the length of a sync; only plain requests time out.
    let api = Router::new()
        // Claim and sessions
        .route("/api/auth/claim-profile", post(claim_profile))
        .route("/api/auth/verify-claim", post(verify_claim))
        .route("/api/auth/sign-in", post(sign_in))
        .route(
            "/api/auth/token",
            get(check_token).patch(refresh_token).delete(revoke_token),
        )
        .route("/api/auth/me", get(get_me))
        // Directory
        .route("/api/people", get(list_people))
        .route("/api/people/search-emails", get(search_emails))
        .route("/api/people/check-email", get(check_email))
        // Events
        .route("/api/events/next", get(next_event))
        .route("/api/events/send-invite", post(send_invite))
        // Admin
        .route("/api/admin/sync", post(start_sync))
        .route("/api/admin/sync/{job_id}", get(sync_snapshot))
        .route("/api/admin/stats", get(stats))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ));

    let streams = Router::new()
        .route("/api/admin/sync/{job_id}/events", get(sync_events))
        .route("/api/admin/reset-database", get(reset_database));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(api)
        .merge(streams)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
