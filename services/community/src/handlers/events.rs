use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};

use commons_domain::id::EventId;

use crate::domain::types::NextEvent;
use crate::error::CommunityError;
use crate::handlers::AppJson;
use crate::state::AppState;
use crate::usecase::invite::{NextEventUseCase, SendInviteInput, SendInviteUseCase};

// ── POST /api/events/send-invite ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInviteRequest {
    pub email: String,
    pub event_id: EventId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInviteResponse {
    pub ok: bool,
    pub kind: &'static str,
    pub message: String,
    pub next_event: NextEvent,
}

pub async fn send_invite(
    State(state): State<AppState>,
    AppJson(body): AppJson<SendInviteRequest>,
) -> Result<Json<SendInviteResponse>, CommunityError> {
    let usecase = SendInviteUseCase {
        events: state.event_repo(),
        invites: state.invite_repo(),
        mailer: state.mailer.clone(),
    };
    let event = usecase
        .execute(SendInviteInput {
            email: body.email,
            event_id: body.event_id,
        })
        .await?;
    Ok(Json(SendInviteResponse {
        ok: true,
        kind: "invited",
        message: format!("Invite sent for {}. Check your inbox.", event.title),
        next_event: event,
    }))
}

// ── GET /api/events/next ─────────────────────────────────────────────────────

pub async fn next_event(
    State(state): State<AppState>,
) -> Result<Json<Option<NextEvent>>, CommunityError> {
    let usecase = NextEventUseCase {
        events: state.event_repo(),
    };
    Ok(Json(usecase.execute().await?))
}
