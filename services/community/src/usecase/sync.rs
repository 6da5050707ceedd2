//! Directory reset and re-import from the events platform.
//!
//! There is no rollback: a failure after the wipe leaves the directory
//! partially populated until the next successful run.

use std::collections::HashSet;

use commons_domain::email::EmailAddress;
use commons_domain::id::SyncJobId;
use commons_domain::sync::SyncResult;

use crate::domain::repository::{DirectoryRepository, EventSource, ProgressReporter};
use crate::domain::types::{NewPerson, Upserted};
use crate::error::CommunityError;
use crate::infra::jobs::{JobHandle, JobRegistry};

const CLEARING_PROGRESS: u8 = 5;
const FETCHING_PROGRESS: u8 = 10;
const IMPORTING_EVENTS_PROGRESS: u8 = 20;
/// Guest import spans 20..95.
const GUESTS_PROGRESS_SPAN: u64 = 75;

fn guests_progress(index: usize, count: usize) -> u8 {
    let done = (index as u64 * GUESTS_PROGRESS_SPAN) / count.max(1) as u64;
    IMPORTING_EVENTS_PROGRESS + done as u8
}

pub struct SyncDirectoryUseCase<D: DirectoryRepository, S: EventSource> {
    pub directory: D,
    pub source: S,
}

impl<D: DirectoryRepository, S: EventSource> SyncDirectoryUseCase<D, S> {
    pub async fn execute<R: ProgressReporter>(
        &self,
        progress: &R,
    ) -> Result<SyncResult, CommunityError> {
        progress.advance(CLEARING_PROGRESS, "Clearing directory...");
        let cleared = self.directory.clear_directory().await?;
        tracing::info!(events = cleared.events, people = cleared.people, "directory cleared");

        progress.advance(FETCHING_PROGRESS, "Fetching events...");
        let events = self.source.list_events().await?;

        progress.advance(
            IMPORTING_EVENTS_PROGRESS,
            &format!("Importing {} events...", events.len()),
        );
        for event in &events {
            self.directory.upsert_event(event).await?;
        }

        let mut result = SyncResult::default();
        let mut seen: HashSet<String> = HashSet::new();
        for (index, event) in events.iter().enumerate() {
            progress.advance(
                guests_progress(index, events.len()),
                &format!(
                    "Importing guests for {} ({}/{})...",
                    event.title,
                    index + 1,
                    events.len()
                ),
            );
            for guest in self.source.list_guests(&event.api_id).await? {
                result.total += 1;
                let Some(email) = guest
                    .email
                    .as_deref()
                    .and_then(|raw| EmailAddress::parse(raw).ok())
                else {
                    result.skipped += 1;
                    continue;
                };
                if !seen.insert(email.as_str().to_owned()) {
                    result.skipped += 1;
                    continue;
                }
                let person = NewPerson {
                    api_id: guest.api_id,
                    email: email.into(),
                    user_name: guest.user_name,
                    full_name: guest.full_name,
                    avatar_url: guest.avatar_url,
                };
                match self.directory.upsert_person(&person).await? {
                    Upserted::Created => result.created += 1,
                    Upserted::Existing => result.skipped += 1,
                }
            }
        }

        Ok(result)
    }
}

/// Run a sync on a background task, reporting into `job`.
pub fn spawn_sync<D, S>(usecase: SyncDirectoryUseCase<D, S>, job: JobHandle)
where
    D: DirectoryRepository + 'static,
    S: EventSource + 'static,
{
    tokio::spawn(async move {
        match usecase.execute(&job).await {
            Ok(result) => job.succeed(
                &format!(
                    "Sync complete: {} people added, {} skipped",
                    result.created, result.skipped
                ),
                result,
            ),
            Err(e) => {
                tracing::error!(
                    job_id = %job.id(),
                    error = ?e,
                    "directory sync failed; directory may be partially populated"
                );
                job.fail(&format!("Sync failed: {e}"));
            }
        }
    });
}

// ── StartSync ─────────────────────────────────────────────────────────────────

pub struct StartSyncUseCase<D: DirectoryRepository, S: EventSource> {
    pub directory: D,
    pub source: S,
    pub jobs: JobRegistry,
}

impl<D, S> StartSyncUseCase<D, S>
where
    D: DirectoryRepository + 'static,
    S: EventSource + 'static,
{
    fn start(self) -> Result<SyncJobId, SyncJobId> {
        let job = self.jobs.start()?;
        let id = job.id();
        spawn_sync(
            SyncDirectoryUseCase {
                directory: self.directory,
                source: self.source,
            },
            job,
        );
        Ok(id)
    }

    /// Start a new job. Fails with `SyncAlreadyRunning` while another runs.
    pub fn execute(self) -> Result<SyncJobId, CommunityError> {
        self.start().map_err(CommunityError::SyncAlreadyRunning)
    }

    /// Start a new job, or return the running one.
    pub fn start_or_attach(self) -> SyncJobId {
        self.start().unwrap_or_else(|running| {
            tracing::info!(job_id = %running, "attaching to running sync");
            running
        })
    }
}
