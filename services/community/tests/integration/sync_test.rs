use std::time::Duration;

use commons_community::domain::types::NewPerson;
use commons_community::error::CommunityError;
use commons_community::infra::jobs::JobRegistry;
use commons_community::usecase::sync::{StartSyncUseCase, SyncDirectoryUseCase};
use commons_domain::sync::{SyncMessage, SyncResult, SyncState};

use crate::helpers::{MockDirectory, MockEventSource, RecordingProgress, guest, source_event};

fn two_event_source() -> MockEventSource {
    MockEventSource::new(vec![
        source_event("evt-1", "Builders Night"),
        source_event("evt-2", "Community Night"),
    ])
    .with_guests(
        "evt-1",
        vec![
            guest("gst-1", Some("Ada@Example.com")),
            guest("gst-2", None),
            guest("gst-3", Some("not-an-email")),
        ],
    )
    .with_guests(
        "evt-2",
        vec![
            guest("gst-4", Some("ada@example.com")),
            guest("gst-5", Some("grace@example.com")),
            guest("gst-6", Some("claimed@example.com")),
        ],
    )
}

fn claimed_survivor() -> NewPerson {
    NewPerson {
        api_id: "gst-old".into(),
        email: "claimed@example.com".into(),
        user_name: None,
        full_name: None,
        avatar_url: None,
    }
}

// ── SyncDirectoryUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_count_created_and_skipped_guests() {
    let directory = MockDirectory::with_people(vec![claimed_survivor()]);
    let people = directory.people.clone();
    let usecase = SyncDirectoryUseCase {
        directory,
        source: two_event_source(),
    };

    let result = usecase.execute(&RecordingProgress::default()).await.unwrap();

    assert_eq!(
        result,
        SyncResult {
            total: 6,
            created: 2,
            skipped: 4,
        }
    );
    let emails: Vec<_> = people.lock().unwrap().iter().map(|p| p.email.clone()).collect();
    assert_eq!(
        emails,
        ["claimed@example.com", "ada@example.com", "grace@example.com"]
    );
}

#[tokio::test]
async fn should_clear_then_import_events() {
    let directory = MockDirectory::new();
    directory
        .events
        .lock()
        .unwrap()
        .push(source_event("evt-stale", "Old"));
    let events = directory.events.clone();
    let cleared = directory.cleared.clone();
    let usecase = SyncDirectoryUseCase {
        directory,
        source: two_event_source(),
    };

    usecase.execute(&RecordingProgress::default()).await.unwrap();

    assert_eq!(*cleared.lock().unwrap(), 1);
    let api_ids: Vec<_> = events.lock().unwrap().iter().map(|e| e.api_id.clone()).collect();
    assert_eq!(api_ids, ["evt-1", "evt-2"]);
}

#[tokio::test]
async fn should_report_monotonic_progress_below_100() {
    let progress = RecordingProgress::default();
    let usecase = SyncDirectoryUseCase {
        directory: MockDirectory::new(),
        source: two_event_source(),
    };

    usecase.execute(&progress).await.unwrap();

    let updates = progress.updates.lock().unwrap();
    assert_eq!(updates.first().unwrap().1, "Clearing directory...");
    assert!(updates.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(updates.iter().all(|(p, _)| *p < 100));
    assert!(
        updates
            .iter()
            .any(|(_, m)| m == "Importing guests for Community Night (2/2)...")
    );
}

#[tokio::test]
async fn should_stop_on_upstream_failure() {
    let usecase = SyncDirectoryUseCase {
        directory: MockDirectory::new(),
        source: two_event_source().failing_on("evt-2"),
    };

    let err = usecase
        .execute(&RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CommunityError::Upstream(_)), "got {err:?}");
}

// ── StartSyncUseCase ─────────────────────────────────────────────────────────

async fn wait_for_terminal(jobs: &JobRegistry, id: commons_domain::id::SyncJobId) -> SyncState {
    let mut rx = jobs.subscribe(id).expect("job registered");
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(SyncState::is_terminal))
        .await
        .expect("job finished in time")
        .expect("job channel open")
        .clone()
}

#[tokio::test]
async fn should_run_job_to_success_in_background() {
    let jobs = JobRegistry::new();
    let id = StartSyncUseCase {
        directory: MockDirectory::new(),
        source: two_event_source(),
        jobs: jobs.clone(),
    }
    .execute()
    .unwrap();

    let state = wait_for_terminal(&jobs, id).await;

    let SyncMessage::Status {
        progress, data, ..
    } = state.to_message()
    else {
        panic!("expected status, got {state:?}");
    };
    assert_eq!(progress, 100);
    assert_eq!(
        data,
        Some(SyncResult {
            total: 6,
            created: 3,
            skipped: 3,
        })
    );
    assert_eq!(jobs.running(), None);
}

#[tokio::test]
async fn should_mark_job_failed_on_upstream_error() {
    let jobs = JobRegistry::new();
    let id = StartSyncUseCase {
        directory: MockDirectory::new(),
        source: two_event_source().failing_on("evt-1"),
        jobs: jobs.clone(),
    }
    .execute()
    .unwrap();

    let state = wait_for_terminal(&jobs, id).await;

    assert!(
        matches!(&state.to_message(), SyncMessage::Error { message } if message.starts_with("Sync failed")),
        "got {state:?}"
    );
    assert!(jobs.start().is_ok());
}

#[tokio::test]
async fn should_refuse_second_job_and_attach_instead() {
    let jobs = JobRegistry::new();
    let running = jobs.start().unwrap();

    let err = StartSyncUseCase {
        directory: MockDirectory::new(),
        source: two_event_source(),
        jobs: jobs.clone(),
    }
    .execute()
    .unwrap_err();
    assert!(
        matches!(err, CommunityError::SyncAlreadyRunning(id) if id == running.id()),
        "got {err:?}"
    );

    let attached = StartSyncUseCase {
        directory: MockDirectory::new(),
        source: two_event_source(),
        jobs: jobs.clone(),
    }
    .start_or_attach();
    assert_eq!(attached, running.id());
}
