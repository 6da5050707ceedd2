use chrono::Utc;

use commons_auth_types::token::{TokenKind, issue_token, validate_token};
use commons_domain::email::EmailAddress;
use commons_domain::id::UserId;
use commons_domain::user::UserRole;

use crate::domain::mail;
use crate::domain::repository::{ClaimTokenRepository, Mailer, PersonRepository, UserRepository};
use crate::domain::types::{TokenPurpose, User};
use crate::error::CommunityError;
use crate::usecase::claim::issue_link_token;

/// Signed access and refresh tokens for a user.
#[derive(Debug)]
pub struct SessionTokens {
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

pub fn issue_session(user: &User, secret: &str) -> Result<SessionTokens, CommunityError> {
    let access = issue_token(user.id.0, user.role, TokenKind::Access, secret)
        .map_err(|e| CommunityError::Internal(e.into()))?;
    let refresh = issue_token(user.id.0, user.role, TokenKind::Refresh, secret)
        .map_err(|e| CommunityError::Internal(e.into()))?;
    Ok(SessionTokens {
        access_token: access.token,
        access_token_exp: access.exp,
        refresh_token: refresh.token,
    })
}

// ── VerifyClaim ───────────────────────────────────────────────────────────────

enum Redemption {
    Existing(User),
    Create(User),
}

#[derive(Debug)]
pub struct VerifyClaimOutput {
    pub user: User,
    pub session: SessionTokens,
}

/// Redeems a mailed link token: creates the account for claim tokens,
/// signs in for sign-in tokens.
pub struct VerifyClaimUseCase<T, P, U>
where
    T: ClaimTokenRepository,
    P: PersonRepository,
    U: UserRepository,
{
    pub tokens: T,
    pub people: P,
    pub users: U,
    pub jwt_secret: String,
}

impl<T, P, U> VerifyClaimUseCase<T, P, U>
where
    T: ClaimTokenRepository,
    P: PersonRepository,
    U: UserRepository,
{
    pub async fn execute(&self, token: &str) -> Result<VerifyClaimOutput, CommunityError> {
        let token = self
            .tokens
            .find_valid(token)
            .await?
            .ok_or(CommunityError::InvalidClaimToken)?;

        // Resolve everything that can fail before burning the token.
        let pending = match token.purpose {
            TokenPurpose::Claim => {
                let person_id = token.person_id.ok_or(CommunityError::InvalidClaimToken)?;
                // The person may have been removed by a directory reset.
                let person = self
                    .people
                    .find_by_id(person_id)
                    .await?
                    .ok_or(CommunityError::InvalidClaimToken)?;
                if person.is_claimed {
                    return Err(CommunityError::ProfileAlreadyClaimed);
                }
                let now = Utc::now();
                Redemption::Create(User {
                    id: UserId::new(),
                    email: token.email.clone(),
                    display_name: person.display_name(),
                    bio: None,
                    role: UserRole::Member,
                    is_verified: true,
                    person_id: Some(person.id),
                    created_at: now,
                })
            }
            TokenPurpose::SignIn => Redemption::Existing(
                self.users
                    .find_by_email(&token.email)
                    .await?
                    .ok_or(CommunityError::InvalidClaimToken)?,
            ),
        };

        if !self.tokens.mark_used(token.id).await? {
            return Err(CommunityError::InvalidClaimToken);
        }

        let user = match pending {
            Redemption::Existing(user) => user,
            Redemption::Create(new_user) => {
                self.users.create(&new_user).await?;
                tracing::info!(user_id = %new_user.id, person_id = ?new_user.person_id, "profile claimed");
                new_user
            }
        };

        let session = issue_session(&user, &self.jwt_secret)?;
        Ok(VerifyClaimOutput { user, session })
    }
}

// ── RequestSignIn ─────────────────────────────────────────────────────────────

pub struct RequestSignInUseCase<U, T, M>
where
    U: UserRepository,
    T: ClaimTokenRepository,
    M: Mailer,
{
    pub users: U,
    pub tokens: T,
    pub mailer: M,
    pub public_url: String,
}

impl<U, T, M> RequestSignInUseCase<U, T, M>
where
    U: UserRepository,
    T: ClaimTokenRepository,
    M: Mailer,
{
    pub async fn execute(&self, email: &str) -> Result<(), CommunityError> {
        let email = EmailAddress::parse(email).map_err(|_| CommunityError::InvalidEmail)?;
        let user = self
            .users
            .find_by_email(email.as_str())
            .await?
            .ok_or(CommunityError::UserNotFound)?;

        let token = issue_link_token(&self.tokens, &email, None, TokenPurpose::SignIn).await?;
        let link = mail::verify_link(&self.public_url, &token);
        self.mailer.send(&mail::sign_in(&user.email, &link)).await?;
        tracing::info!(user_id = %user.id, "sign-in link sent");
        Ok(())
    }
}

// ── RefreshToken ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RefreshTokenOutput {
    pub user: User,
    pub session: SessionTokens,
}

pub struct RefreshTokenUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> RefreshTokenUseCase<U> {
    pub async fn execute(
        &self,
        refresh_token_value: &str,
    ) -> Result<RefreshTokenOutput, CommunityError> {
        // Validate refresh token (sig + exp + kind); the access token is irrelevant here.
        let info = validate_token(refresh_token_value, &self.jwt_secret, TokenKind::Refresh)
            .map_err(|_| CommunityError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(UserId(info.user_id))
            .await?
            .ok_or(CommunityError::InvalidRefreshToken)?;

        let session = issue_session(&user, &self.jwt_secret)?;
        Ok(RefreshTokenOutput { user, session })
    }
}

// ── GetMe ─────────────────────────────────────────────────────────────────────

pub struct GetMeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetMeUseCase<U> {
    pub async fn execute(&self, user_id: UserId) -> Result<User, CommunityError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(CommunityError::UserNotFound)
    }
}
