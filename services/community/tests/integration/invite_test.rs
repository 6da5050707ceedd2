use chrono::Duration;

use commons_community::error::CommunityError;
use commons_community::usecase::invite::{NextEventUseCase, SendInviteInput, SendInviteUseCase};
use commons_domain::id::EventId;

use crate::helpers::{MockEventRepo, MockInviteRepo, MockMailer, test_event};

// ── SendInviteUseCase ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_invite_bound_to_event() {
    let event = test_event("Builders Night", Duration::days(5), false);
    let usecase = SendInviteUseCase {
        events: MockEventRepo::new(vec![event.clone()]),
        invites: MockInviteRepo::empty(),
        mailer: MockMailer::new(),
    };
    let sent = usecase.mailer.sent_handle();
    let invites = usecase.invites.invites_handle();

    let next = usecase
        .execute(SendInviteInput {
            email: "New@Example.com".into(),
            event_id: event.id,
        })
        .await
        .unwrap();

    assert_eq!(next.id, event.id);
    assert_eq!(next.url, event.url);
    let invites = invites.lock().unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].email, "new@example.com");
    assert_eq!(invites[0].event_id, Some(event.id));
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Builders Night"));
}

#[tokio::test]
async fn should_reject_unknown_event() {
    let usecase = SendInviteUseCase {
        events: MockEventRepo::empty(),
        invites: MockInviteRepo::empty(),
        mailer: MockMailer::new(),
    };
    let sent = usecase.mailer.sent_handle();

    let err = usecase
        .execute(SendInviteInput {
            email: "new@example.com".into(),
            event_id: EventId::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CommunityError::EventNotFound), "got {err:?}");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_validate_email_before_event_lookup() {
    let event = test_event("Builders Night", Duration::days(5), false);
    let usecase = SendInviteUseCase {
        events: MockEventRepo::new(vec![event.clone()]),
        invites: MockInviteRepo::empty(),
        mailer: MockMailer::new(),
    };

    let err = usecase
        .execute(SendInviteInput {
            email: "nobody".into(),
            event_id: event.id,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CommunityError::InvalidEmail), "got {err:?}");
}

// ── NextEventUseCase ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_prefer_featured_upcoming_event() {
    let soon = test_event("Coffee", Duration::days(1), false);
    let featured = test_event("Annual Summit", Duration::days(30), true);
    let usecase = NextEventUseCase {
        events: MockEventRepo::new(vec![soon, featured.clone()]),
    };

    let next = usecase.execute().await.unwrap().unwrap();

    assert_eq!(next.id, featured.id);
}

#[tokio::test]
async fn should_fall_back_to_earliest_upcoming_event() {
    let later = test_event("Later", Duration::days(9), false);
    let soon = test_event("Soon", Duration::days(2), false);
    let past_featured = test_event("Past", Duration::days(-2), true);
    let usecase = NextEventUseCase {
        events: MockEventRepo::new(vec![later, soon.clone(), past_featured]),
    };

    let next = usecase.execute().await.unwrap().unwrap();

    assert_eq!(next.id, soon.id);
}

#[tokio::test]
async fn should_return_none_without_upcoming_events() {
    let usecase = NextEventUseCase {
        events: MockEventRepo::empty(),
    };
    assert!(usecase.execute().await.unwrap().is_none());
}
