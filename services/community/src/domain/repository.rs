#![allow(async_fn_in_trait)]

use std::future::Future;

use chrono::{DateTime, Utc};

use commons_domain::id::{EventId, PersonId, UserId};
use commons_domain::pagination::{Page, PageRequest};

use crate::domain::mail::Mail;
use crate::domain::types::{
    ClaimToken, ClearedDirectory, DirectoryStats, Event, Invite, NewPerson, Person, SourceEvent,
    SourceGuest, Upserted, User,
};
use crate::error::CommunityError;

/// Read access to the people directory.
pub trait PersonRepository: Send + Sync {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, CommunityError>;

    /// Lookup by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, CommunityError>;

    /// Case-insensitive substring match on email, user name and full name.
    /// Returns at most `limit` candidates, best matches first.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Person>, CommunityError>;

    async fn list(&self, page: PageRequest) -> Result<Page<Person>, CommunityError>;
}

pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CommunityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CommunityError>;

    /// Insert a user. Fails with `ProfileAlreadyClaimed` when the email or
    /// person is already linked to another account.
    async fn create(&self, user: &User) -> Result<(), CommunityError>;
}

pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, CommunityError>;

    /// Featured upcoming event if any, otherwise the earliest one starting after `now`.
    async fn next_upcoming(&self, now: DateTime<Utc>) -> Result<Option<Event>, CommunityError>;
}

/// Repository for one-time link tokens.
pub trait ClaimTokenRepository: Send + Sync {
    /// Count active (unused and unexpired) tokens for an address.
    async fn count_active(&self, email: &str) -> Result<u64, CommunityError>;

    async fn create(&self, token: &ClaimToken) -> Result<(), CommunityError>;

    /// Find a valid (unused, unexpired) token by its value.
    async fn find_valid(&self, token: &str) -> Result<Option<ClaimToken>, CommunityError>;

    /// Mark a token as used. Returns `false` if it was already used.
    async fn mark_used(&self, id: uuid::Uuid) -> Result<bool, CommunityError>;
}

pub trait InviteRepository: Send + Sync {
    async fn count_since(&self, email: &str, since: DateTime<Utc>) -> Result<u64, CommunityError>;

    async fn create(&self, invite: &Invite) -> Result<(), CommunityError>;
}

/// Outgoing mail transport.
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), CommunityError>;
}

/// Bulk writes used by the directory sync. Futures are `Send` so a sync can
/// run on a spawned task.
pub trait DirectoryRepository: Send + Sync {
    /// Remove all events and every person no member account links to.
    fn clear_directory(
        &self,
    ) -> impl Future<Output = Result<ClearedDirectory, CommunityError>> + Send;

    /// Insert or update an event by its platform id.
    fn upsert_event(
        &self,
        event: &SourceEvent,
    ) -> impl Future<Output = Result<Upserted, CommunityError>> + Send;

    /// Insert a person unless one with the same platform id or email exists.
    fn upsert_person(
        &self,
        person: &NewPerson,
    ) -> impl Future<Output = Result<Upserted, CommunityError>> + Send;

    fn stats(&self) -> impl Future<Output = Result<DirectoryStats, CommunityError>> + Send;
}

/// The external events platform.
pub trait EventSource: Send + Sync {
    fn list_events(&self) -> impl Future<Output = Result<Vec<SourceEvent>, CommunityError>> + Send;

    fn list_guests(
        &self,
        event_api_id: &str,
    ) -> impl Future<Output = Result<Vec<SourceGuest>, CommunityError>> + Send;
}

/// Receives progress updates from a running sync.
pub trait ProgressReporter: Send + Sync {
    fn advance(&self, progress: u8, message: &str);
}
