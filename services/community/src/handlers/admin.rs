use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use serde::Serialize;
use tokio::sync::watch;

use commons_auth_types::identity::AdminIdentity;
use commons_domain::id::SyncJobId;
use commons_domain::sync::{SyncMessage, SyncState};

use crate::domain::types::DirectoryStats;
use crate::error::CommunityError;
use crate::state::AppState;
use crate::usecase::stats::GetStatsUseCase;
use crate::usecase::sync::StartSyncUseCase;

fn start_sync_usecase(
    state: &AppState,
) -> StartSyncUseCase<crate::infra::db::DbDirectoryRepository, crate::infra::luma::LumaClient> {
    StartSyncUseCase {
        directory: state.directory_repo(),
        source: state.luma.clone(),
        jobs: state.jobs.clone(),
    }
}

/// Messages for a job: the current state first, then every change, ending
/// after the terminal message. Dropping the stream leaves the job running.
fn progress_messages(rx: watch::Receiver<SyncState>) -> impl Stream<Item = SyncMessage> {
    stream::unfold((rx, true, false), |(mut rx, first, finished)| async move {
        if finished {
            return None;
        }
        if !first {
            rx.changed().await.ok()?;
        }
        let message = rx.borrow_and_update().to_message();
        let finished = message.is_terminal();
        Some((message, (rx, false, finished)))
    })
}

fn progress_events(
    rx: watch::Receiver<SyncState>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    progress_messages(rx).map(|message| {
        let event = Event::default().json_data(&message).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode sync message");
            Event::default().data(r#"{"type":"error","message":"Sync failed"}"#)
        });
        Ok(event)
    })
}

fn stream_job(
    state: &AppState,
    job_id: SyncJobId,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, CommunityError> {
    let rx = state
        .jobs
        .subscribe(job_id)
        .ok_or(CommunityError::SyncJobNotFound)?;
    Ok(Sse::new(progress_events(rx)).keep_alive(KeepAlive::default()))
}

// ── POST /api/admin/sync ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSyncResponse {
    pub job_id: SyncJobId,
}

pub async fn start_sync(
    AdminIdentity(identity): AdminIdentity,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartSyncResponse>), CommunityError> {
    let job_id = start_sync_usecase(&state).execute()?;
    tracing::info!(job_id = %job_id, admin_id = %identity.user_id, "directory sync requested");
    Ok((StatusCode::ACCEPTED, Json(StartSyncResponse { job_id })))
}

// ── GET /api/admin/sync/{job_id} ─────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshotResponse {
    pub job_id: SyncJobId,
    #[serde(flatten)]
    pub message: SyncMessage,
}

pub async fn sync_snapshot(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<SyncJobId>,
) -> Result<Json<SyncSnapshotResponse>, CommunityError> {
    let snapshot = state
        .jobs
        .snapshot(job_id)
        .ok_or(CommunityError::SyncJobNotFound)?;
    Ok(Json(SyncSnapshotResponse {
        job_id,
        message: snapshot.to_message(),
    }))
}

// ── GET /api/admin/sync/{job_id}/events ──────────────────────────────────────

pub async fn sync_events(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<SyncJobId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, CommunityError> {
    stream_job(&state, job_id)
}

// ── GET /api/admin/reset-database ────────────────────────────────────────────

pub async fn reset_database(
    AdminIdentity(identity): AdminIdentity,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, CommunityError> {
    let job_id = start_sync_usecase(&state).start_or_attach();
    tracing::info!(job_id = %job_id, admin_id = %identity.user_id, "directory reset streaming");
    stream_job(&state, job_id)
}

// ── GET /api/admin/stats ─────────────────────────────────────────────────────

pub async fn stats(
    _admin: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<DirectoryStats>, CommunityError> {
    let usecase = GetStatsUseCase {
        directory: state.directory_repo(),
    };
    Ok(Json(usecase.execute().await?))
}
