use chrono::{Duration, Utc};
use uuid::Uuid;

use commons_domain::email::EmailAddress;
use commons_domain::id::EventId;

use crate::domain::mail;
use crate::domain::repository::{EventRepository, InviteRepository, Mailer};
use crate::domain::types::{
    Event, INVITE_WINDOW_HOURS, Invite, MAX_INVITES_PER_WINDOW, NextEvent,
};
use crate::error::CommunityError;

/// Record an invite and mail it. Throttled per address.
pub(crate) async fn record_and_send_invite<I: InviteRepository, M: Mailer>(
    invites: &I,
    mailer: &M,
    email: &EmailAddress,
    event: Option<&Event>,
) -> Result<Option<NextEvent>, CommunityError> {
    let now = Utc::now();
    let recent = invites
        .count_since(email.as_str(), now - Duration::hours(INVITE_WINDOW_HOURS))
        .await?;
    if recent >= MAX_INVITES_PER_WINDOW {
        tracing::info!(email = %email, recent, "invite limit reached");
        return Err(CommunityError::TooManyRequests);
    }

    invites
        .create(&Invite {
            id: Uuid::new_v4(),
            email: email.to_string(),
            event_id: event.map(|e| e.id),
            created_at: now,
        })
        .await?;

    let next_event = event.map(NextEvent::from);
    mailer
        .send(&mail::invite(email.as_str(), next_event.as_ref()))
        .await?;
    tracing::info!(email = %email, event_id = ?next_event.as_ref().map(|e| e.id), "invite sent");
    Ok(next_event)
}

// ── SendInvite ────────────────────────────────────────────────────────────────

pub struct SendInviteInput {
    pub email: String,
    pub event_id: EventId,
}

pub struct SendInviteUseCase<E: EventRepository, I: InviteRepository, M: Mailer> {
    pub events: E,
    pub invites: I,
    pub mailer: M,
}

impl<E: EventRepository, I: InviteRepository, M: Mailer> SendInviteUseCase<E, I, M> {
    pub async fn execute(&self, input: SendInviteInput) -> Result<NextEvent, CommunityError> {
        let email = EmailAddress::parse(&input.email).map_err(|_| CommunityError::InvalidEmail)?;
        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(CommunityError::EventNotFound)?;
        record_and_send_invite(&self.invites, &self.mailer, &email, Some(&event)).await?;
        Ok(NextEvent::from(&event))
    }
}

// ── NextEvent ─────────────────────────────────────────────────────────────────

pub struct NextEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> NextEventUseCase<E> {
    pub async fn execute(&self) -> Result<Option<NextEvent>, CommunityError> {
        let event = self.events.next_upcoming(Utc::now()).await?;
        Ok(event.as_ref().map(NextEvent::from))
    }
}
