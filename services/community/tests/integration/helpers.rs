#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use commons_community::domain::mail::Mail;
use commons_community::domain::repository::{
    ClaimTokenRepository, DirectoryRepository, EventRepository, EventSource, InviteRepository,
    Mailer, PersonRepository, ProgressReporter, UserRepository,
};
use commons_community::domain::types::{
    ClaimToken, ClearedDirectory, DirectoryStats, Event, Invite, NewPerson, Person, SourceEvent,
    SourceGuest, TokenPurpose, Upserted, User,
};
use commons_community::error::CommunityError;
use commons_community::infra::luma::LumaError;
use commons_domain::id::{EventId, PersonId, UserId};
use commons_domain::pagination::{Page, PageRequest};
use commons_domain::user::UserRole;

pub use commons_testing::auth::TEST_JWT_SECRET;

pub const PUBLIC_URL: &str = "https://community.example.com";

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_person(email: &str, full_name: Option<&str>) -> Person {
    Person {
        id: PersonId::new(),
        api_id: format!("gst-{email}"),
        email: email.to_owned(),
        user_name: None,
        full_name: full_name.map(Into::into),
        organization_name: None,
        job_title: None,
        avatar_url: None,
        is_claimed: false,
        created_at: Utc::now(),
    }
}

pub fn claimed(mut person: Person) -> Person {
    person.is_claimed = true;
    person
}

pub fn test_user(email: &str, person_id: Option<PersonId>) -> User {
    User {
        id: UserId::new(),
        email: email.to_owned(),
        display_name: "Test User".to_owned(),
        bio: None,
        role: UserRole::Member,
        is_verified: true,
        person_id,
        created_at: Utc::now(),
    }
}

pub fn test_event(title: &str, starts_in: Duration, is_featured: bool) -> Event {
    Event {
        id: EventId::new(),
        api_id: format!("evt-{title}"),
        title: title.to_owned(),
        start_at: Utc::now() + starts_in,
        end_at: None,
        url: Some(format!("https://lu.ma/{}", title.to_lowercase().replace(' ', "-"))),
        is_featured,
    }
}

pub fn test_token(email: &str, person_id: Option<PersonId>, purpose: TokenPurpose) -> ClaimToken {
    let now = Utc::now();
    ClaimToken {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        person_id,
        purpose,
        token: format!("tok-{}", Uuid::new_v4().simple()),
        expires_at: now + Duration::hours(24),
        used_at: None,
        created_at: now,
    }
}

pub fn source_event(api_id: &str, title: &str) -> SourceEvent {
    SourceEvent {
        api_id: api_id.to_owned(),
        title: title.to_owned(),
        start_at: Utc::now() + Duration::days(7),
        end_at: None,
        url: None,
    }
}

pub fn guest(api_id: &str, email: Option<&str>) -> SourceGuest {
    SourceGuest {
        api_id: api_id.to_owned(),
        email: email.map(Into::into),
        user_name: None,
        full_name: Some(format!("Guest {api_id}")),
        avatar_url: None,
    }
}

// ── MockPersonRepo ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockPersonRepo {
    pub people: Arc<Mutex<Vec<Person>>>,
    pub search_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPersonRepo {
    pub fn new(people: Vec<Person>) -> Self {
        Self {
            people: Arc::new(Mutex::new(people)),
            search_calls: Arc::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a shared handle to the recorded search queries.
    pub fn search_calls_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.search_calls)
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

impl PersonRepository for MockPersonRepo {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, CommunityError> {
        Ok(self.people.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, CommunityError> {
        Ok(self
            .people
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    /// Mirrors the database ordering: exact email, email prefix, name or
    /// word prefix, then email; the limit applies after ordering.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Person>, CommunityError> {
        self.search_calls.lock().unwrap().push(query.to_owned());
        let needle = query.to_lowercase();
        let word_prefix = format!(" {needle}");
        let name_prefix = |name: Option<&str>| {
            name.map(str::to_lowercase)
                .is_some_and(|n| n.starts_with(&needle) || n.contains(&word_prefix))
        };
        let mut matches: Vec<Person> = self
            .people
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                contains_ci(Some(&p.email), &needle)
                    || contains_ci(p.user_name.as_deref(), &needle)
                    || contains_ci(p.full_name.as_deref(), &needle)
            })
            .cloned()
            .collect();
        matches.sort_by_cached_key(|p| {
            let email = p.email.to_lowercase();
            (
                email != needle,
                !email.starts_with(&needle),
                !(name_prefix(p.full_name.as_deref()) || name_prefix(p.user_name.as_deref())),
                email,
            )
        });
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Person>, CommunityError> {
        let people = self.people.lock().unwrap();
        Ok(Page {
            items: people
                .iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .cloned()
                .collect(),
            total: people.len() as u64,
        })
    }
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CommunityError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CommunityError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), CommunityError> {
        let mut users = self.users.lock().unwrap();
        let taken = users.iter().any(|u| {
            u.email == user.email || (u.person_id.is_some() && u.person_id == user.person_id)
        });
        if taken {
            return Err(CommunityError::ProfileAlreadyClaimed);
        }
        users.push(user.clone());
        Ok(())
    }
}

// ── MockEventRepo ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockEventRepo {
    pub events: Vec<Event>,
}

impl MockEventRepo {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl EventRepository for MockEventRepo {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, CommunityError> {
        Ok(self.events.iter().find(|e| e.id == id).cloned())
    }

    async fn next_upcoming(&self, now: DateTime<Utc>) -> Result<Option<Event>, CommunityError> {
        let upcoming = || self.events.iter().filter(|e| e.start_at > now);
        Ok(upcoming()
            .filter(|e| e.is_featured)
            .min_by_key(|e| e.start_at)
            .or_else(|| upcoming().min_by_key(|e| e.start_at))
            .cloned())
    }
}

// ── MockClaimTokenRepo ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockClaimTokenRepo {
    pub tokens: Arc<Mutex<Vec<ClaimToken>>>,
}

impl MockClaimTokenRepo {
    pub fn new(tokens: Vec<ClaimToken>) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tokens_handle(&self) -> Arc<Mutex<Vec<ClaimToken>>> {
        Arc::clone(&self.tokens)
    }
}

impl ClaimTokenRepository for MockClaimTokenRepo {
    async fn count_active(&self, email: &str) -> Result<u64, CommunityError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.email == email && t.is_valid())
            .count() as u64)
    }

    async fn create(&self, token: &ClaimToken) -> Result<(), CommunityError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn find_valid(&self, token: &str) -> Result<Option<ClaimToken>, CommunityError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token && t.is_valid())
            .cloned())
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, CommunityError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == id && t.used_at.is_none()) {
            Some(token) => {
                token.used_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MockInviteRepo ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockInviteRepo {
    pub invites: Arc<Mutex<Vec<Invite>>>,
}

impl MockInviteRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn invites_handle(&self) -> Arc<Mutex<Vec<Invite>>> {
        Arc::clone(&self.invites)
    }
}

impl InviteRepository for MockInviteRepo {
    async fn count_since(&self, email: &str, since: DateTime<Utc>) -> Result<u64, CommunityError> {
        Ok(self
            .invites
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.email == email && i.created_at >= since)
            .count() as u64)
    }

    async fn create(&self, invite: &Invite) -> Result<(), CommunityError> {
        self.invites.lock().unwrap().push(invite.clone());
        Ok(())
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<Mail>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Mail>>> {
        Arc::clone(&self.sent)
    }
}

impl Mailer for MockMailer {
    async fn send(&self, mail: &Mail) -> Result<(), CommunityError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Extract the link token from a verification or sign-in mail.
pub fn token_from_mail(mail: &Mail) -> String {
    let start = mail.body.find("token=").expect("mail carries a token link") + "token=".len();
    mail.body[start..]
        .split_whitespace()
        .next()
        .expect("token value")
        .to_owned()
}

// ── MockDirectory ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockDirectory {
    pub events: Arc<Mutex<Vec<SourceEvent>>>,
    pub people: Arc<Mutex<Vec<NewPerson>>>,
    pub cleared: Arc<Mutex<u32>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// People that survive a reset (claimed profiles).
    pub fn with_people(people: Vec<NewPerson>) -> Self {
        Self {
            people: Arc::new(Mutex::new(people)),
            ..Self::default()
        }
    }
}

impl DirectoryRepository for MockDirectory {
    async fn clear_directory(&self) -> Result<ClearedDirectory, CommunityError> {
        *self.cleared.lock().unwrap() += 1;
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        Ok(ClearedDirectory {
            events: events.len() as u64,
            people: 0,
        })
    }

    async fn upsert_event(&self, event: &SourceEvent) -> Result<Upserted, CommunityError> {
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.api_id == event.api_id) {
            return Ok(Upserted::Existing);
        }
        events.push(event.clone());
        Ok(Upserted::Created)
    }

    async fn upsert_person(&self, person: &NewPerson) -> Result<Upserted, CommunityError> {
        let mut people = self.people.lock().unwrap();
        if people
            .iter()
            .any(|p| p.api_id == person.api_id || p.email == person.email)
        {
            return Ok(Upserted::Existing);
        }
        people.push(person.clone());
        Ok(Upserted::Created)
    }

    async fn stats(&self) -> Result<DirectoryStats, CommunityError> {
        Ok(DirectoryStats {
            events: self.events.lock().unwrap().len() as u64,
            people: self.people.lock().unwrap().len() as u64,
            ..DirectoryStats::default()
        })
    }
}

// ── MockEventSource ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockEventSource {
    pub events: Vec<SourceEvent>,
    pub guests: HashMap<String, Vec<SourceGuest>>,
    /// Event whose guest listing fails with an upstream error.
    pub failing_event: Option<String>,
}

impl MockEventSource {
    pub fn new(events: Vec<SourceEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn with_guests(mut self, event_api_id: &str, guests: Vec<SourceGuest>) -> Self {
        self.guests.insert(event_api_id.to_owned(), guests);
        self
    }

    pub fn failing_on(mut self, event_api_id: &str) -> Self {
        self.failing_event = Some(event_api_id.to_owned());
        self
    }
}

impl EventSource for MockEventSource {
    async fn list_events(&self) -> Result<Vec<SourceEvent>, CommunityError> {
        Ok(self.events.clone())
    }

    async fn list_guests(&self, event_api_id: &str) -> Result<Vec<SourceGuest>, CommunityError> {
        if self.failing_event.as_deref() == Some(event_api_id) {
            return Err(LumaError::HttpError {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".into(),
            }
            .into());
        }
        Ok(self.guests.get(event_api_id).cloned().unwrap_or_default())
    }
}

// ── RecordingProgress ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<(u8, String)>>,
}

impl ProgressReporter for RecordingProgress {
    fn advance(&self, progress: u8, message: &str) {
        self.updates
            .lock()
            .unwrap()
            .push((progress, message.to_owned()));
    }
}
