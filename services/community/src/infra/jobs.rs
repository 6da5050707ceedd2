//! In-memory registry of directory sync jobs.
//!
//! Each job owns a `watch` channel holding its [`SyncState`]. Subscribers see
//! the latest state first and every later change; the terminal state is never
//! overwritten, so every subscriber observes it. At most one job runs at a
//! time. Finished jobs stay readable until [`MAX_FINISHED_JOBS`] newer ones
//! have finished. Nothing survives a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use commons_domain::id::SyncJobId;
use commons_domain::sync::{SyncResult, SyncState};

use crate::domain::repository::ProgressReporter;

pub const MAX_FINISHED_JOBS: usize = 16;

#[derive(Default)]
struct Registry {
    jobs: HashMap<SyncJobId, Arc<watch::Sender<SyncState>>>,
    running: Option<SyncJobId>,
    finished: VecDeque<SyncJobId>,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new running job. Fails with the running job's id if one exists.
    pub fn start(&self) -> Result<JobHandle, SyncJobId> {
        let mut registry = self.lock();
        if let Some(running) = registry.running {
            return Err(running);
        }
        let id = SyncJobId::new();
        let (tx, _rx) = watch::channel(SyncState::started());
        let tx = Arc::new(tx);
        registry.jobs.insert(id, Arc::clone(&tx));
        registry.running = Some(id);
        tracing::info!(job_id = %id, "sync job started");
        Ok(JobHandle {
            id,
            tx,
            registry: self.clone(),
        })
    }

    pub fn running(&self) -> Option<SyncJobId> {
        self.lock().running
    }

    pub fn snapshot(&self, id: SyncJobId) -> Option<SyncState> {
        self.lock().jobs.get(&id).map(|tx| tx.borrow().clone())
    }

    /// Receiver positioned at the current state.
    pub fn subscribe(&self, id: SyncJobId) -> Option<watch::Receiver<SyncState>> {
        self.lock().jobs.get(&id).map(|tx| tx.subscribe())
    }

    fn finish(&self, id: SyncJobId) {
        let mut registry = self.lock();
        if registry.running == Some(id) {
            registry.running = None;
        }
        registry.finished.push_back(id);
        while registry.finished.len() > MAX_FINISHED_JOBS {
            if let Some(evicted) = registry.finished.pop_front() {
                registry.jobs.remove(&evicted);
            }
        }
    }
}

/// Write side of a running job. Dropping it before a terminal state marks
/// the job failed.
pub struct JobHandle {
    id: SyncJobId,
    tx: Arc<watch::Sender<SyncState>>,
    registry: JobRegistry,
}

impl JobHandle {
    pub fn id(&self) -> SyncJobId {
        self.id
    }

    pub fn succeed(&self, message: &str, result: SyncResult) {
        if self.tx.send_if_modified(|state| state.succeed(message, result)) {
            tracing::info!(
                job_id = %self.id,
                total = result.total,
                created = result.created,
                skipped = result.skipped,
                "sync job succeeded"
            );
            self.registry.finish(self.id);
        }
    }

    pub fn fail(&self, message: &str) {
        if self.tx.send_if_modified(|state| state.fail(message)) {
            self.registry.finish(self.id);
        }
    }
}

impl ProgressReporter for JobHandle {
    fn advance(&self, progress: u8, message: &str) {
        if self.tx.send_if_modified(|state| state.advance(progress, message)) {
            tracing::debug!(job_id = %self.id, progress, message, "sync progress");
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if !self.tx.borrow().is_terminal() {
            tracing::error!(job_id = %self.id, "sync job ended without a result");
            self.fail("Sync stopped unexpectedly");
        }
    }
}
