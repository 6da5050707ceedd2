use chrono::{Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use commons_domain::email::EmailAddress;
use commons_domain::id::PersonId;

use crate::domain::mail;
use crate::domain::repository::{
    ClaimTokenRepository, EventRepository, InviteRepository, Mailer, PersonRepository,
    UserRepository,
};
use crate::domain::types::{
    CLAIM_TOKEN_LEN, CLAIM_TOKEN_TTL_HOURS, ClaimOutcome, ClaimToken, MAX_ACTIVE_CLAIM_TOKENS,
    TokenPurpose,
};
use crate::error::CommunityError;
use crate::usecase::invite::record_and_send_invite;

/// URL-safe charset for link tokens.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..CLAIM_TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Store a fresh link token for `email` and return its value.
///
/// Fails with `TooManyRequests` once the address holds the maximum number of
/// active tokens.
pub(crate) async fn issue_link_token<T: ClaimTokenRepository>(
    tokens: &T,
    email: &EmailAddress,
    person_id: Option<PersonId>,
    purpose: TokenPurpose,
) -> Result<String, CommunityError> {
    let active = tokens.count_active(email.as_str()).await?;
    if active >= MAX_ACTIVE_CLAIM_TOKENS {
        tracing::info!(email = %email, active, "link token limit reached");
        return Err(CommunityError::TooManyRequests);
    }

    let now = Utc::now();
    let token = ClaimToken {
        id: Uuid::new_v4(),
        email: email.to_string(),
        person_id,
        purpose,
        token: generate_token(),
        expires_at: now + Duration::hours(CLAIM_TOKEN_TTL_HOURS),
        used_at: None,
        created_at: now,
    };
    tokens.create(&token).await?;
    Ok(token.token)
}

pub struct ClaimProfileInput {
    pub email: String,
    pub person_id: Option<PersonId>,
}

/// Resolves a claim request to exactly one [`ClaimOutcome`].
pub struct ClaimProfileUseCase<P, U, T, E, I, M>
where
    P: PersonRepository,
    U: UserRepository,
    T: ClaimTokenRepository,
    E: EventRepository,
    I: InviteRepository,
    M: Mailer,
{
    pub people: P,
    pub users: U,
    pub tokens: T,
    pub events: E,
    pub invites: I,
    pub mailer: M,
    pub public_url: String,
}

impl<P, U, T, E, I, M> ClaimProfileUseCase<P, U, T, E, I, M>
where
    P: PersonRepository,
    U: UserRepository,
    T: ClaimTokenRepository,
    E: EventRepository,
    I: InviteRepository,
    M: Mailer,
{
    pub async fn execute(&self, input: ClaimProfileInput) -> Result<ClaimOutcome, CommunityError> {
        let email = EmailAddress::parse(&input.email).map_err(|_| CommunityError::InvalidEmail)?;

        // 1. Resolve the person: explicit selection wins, but must belong to the address.
        let person = match input.person_id {
            Some(id) => {
                let person = self
                    .people
                    .find_by_id(id)
                    .await?
                    .ok_or(CommunityError::PersonNotFound)?;
                if !email.matches(&person.email) {
                    return Err(CommunityError::EmailMismatch);
                }
                Some(person)
            }
            None => self.people.find_by_email(email.as_str()).await?,
        };

        // 2. Claimed profiles and existing accounts go to sign-in; nothing is sent.
        let claimed = person.as_ref().is_some_and(|p| p.is_claimed);
        if claimed || self.users.find_by_email(email.as_str()).await?.is_some() {
            tracing::info!(email = %email, "claim requested for already claimed profile");
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        // 3. Unclaimed match: one verification mail.
        if let Some(person) = person {
            let token =
                issue_link_token(&self.tokens, &email, Some(person.id), TokenPurpose::Claim)
                    .await?;
            let link = mail::verify_link(&self.public_url, &token);
            self.mailer
                .send(&mail::claim_verification(&person, &link))
                .await?;
            tracing::info!(person_id = %person.id, "claim verification sent");
            return Ok(ClaimOutcome::VerificationSent);
        }

        // 4. No match: invite to the next event.
        let event = self.events.next_upcoming(Utc::now()).await?;
        let next_event =
            record_and_send_invite(&self.invites, &self.mailer, &email, event.as_ref()).await?;
        Ok(ClaimOutcome::Invited { next_event })
    }
}
