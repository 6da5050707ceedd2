use chrono::{DateTime, Utc};
use serde::Serialize;

use commons_domain::id::{EventId, PersonId, UserId};
use commons_domain::user::UserRole;

/// Directory entry imported from the events platform.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: PersonId,
    pub api_id: String,
    pub email: String,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub job_title: Option<String>,
    pub avatar_url: Option<String>,
    /// A member account is linked to this person.
    pub is_claimed: bool,
    pub created_at: DateTime<Utc>,
}

impl Person {
    /// Best human-readable name for greetings and new accounts.
    pub fn display_name(&self) -> String {
        [self.full_name.as_deref(), self.user_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                self.email
                    .split_once('@')
                    .map_or(self.email.as_str(), |(local, _)| local)
                    .to_owned()
            })
    }
}

/// Member account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub person_id: Option<PersonId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub api_id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub is_featured: bool,
}

/// Event summary returned with invite outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEvent {
    pub id: EventId,
    pub title: String,
    #[serde(serialize_with = "commons_core::serde::to_rfc3339_ms")]
    pub start_time: DateTime<Utc>,
    pub url: Option<String>,
}

impl From<&Event> for NextEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            start_time: event.start_at,
            url: event.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Claim,
    SignIn,
}

impl TokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::SignIn => "sign_in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "claim" => Some(Self::Claim),
            "sign_in" => Some(Self::SignIn),
            _ => None,
        }
    }
}

/// One-time link token mailed to prove ownership of an address.
#[derive(Debug, Clone)]
pub struct ClaimToken {
    pub id: uuid::Uuid,
    pub email: String,
    pub person_id: Option<PersonId>,
    pub purpose: TokenPurpose,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClaimToken {
    pub fn is_valid(&self) -> bool {
        self.used_at.is_none() && self.expires_at > Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct Invite {
    pub id: uuid::Uuid,
    pub email: String,
    pub event_id: Option<EventId>,
    pub created_at: DateTime<Utc>,
}

/// Result of resolving a claim request. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    VerificationSent,
    Invited { next_event: Option<NextEvent> },
    AlreadyClaimed,
}

impl ClaimOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VerificationSent => "verification_sent",
            Self::Invited { .. } => "invited",
            Self::AlreadyClaimed => "already_claimed",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::VerificationSent => "Check your inbox for a link to verify and claim your profile.",
            Self::Invited { .. } => {
                "We couldn't find your profile yet. We've sent you an invite to our next event."
            }
            Self::AlreadyClaimed => {
                "This profile has already been claimed. Sign in instead, or request a sign-in link."
            }
        }
    }
}

/// Event as listed by the events platform.
#[derive(Debug, Clone)]
pub struct SourceEvent {
    pub api_id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Guest registration as listed by the events platform.
#[derive(Debug, Clone)]
pub struct SourceGuest {
    pub api_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Directory row built from a guest with a usable email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub api_id: String,
    /// Normalised (trimmed, lower-cased).
    pub email: String,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Whether an upsert inserted a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Existing,
}

/// Rows removed by a directory reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedDirectory {
    pub events: u64,
    pub people: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub events: u64,
    pub people: u64,
    pub users: u64,
    pub claimed_people: u64,
    pub pending_invites: u64,
}

/// Maximum number of active (unused, unexpired) link tokens per address.
pub const MAX_ACTIVE_CLAIM_TOKENS: u64 = 5;

/// Link token length in characters.
pub const CLAIM_TOKEN_LEN: usize = 48;

/// Link token time-to-live in hours.
pub const CLAIM_TOKEN_TTL_HOURS: i64 = 24;

/// Maximum invites per address within [`INVITE_WINDOW_HOURS`].
pub const MAX_INVITES_PER_WINDOW: u64 = 3;

pub const INVITE_WINDOW_HOURS: i64 = 24;

/// Shortest trimmed query that triggers a directory search.
pub const MIN_SUGGESTION_QUERY_LEN: usize = 2;

pub const MAX_SUGGESTIONS: usize = 10;
