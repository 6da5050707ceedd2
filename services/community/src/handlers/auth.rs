use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use commons_auth_types::{
    cookie::{
        ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, clear_cookies, set_access_token_cookie,
        set_refresh_token_cookie,
    },
    identity::Identity,
    token::validate_access_token,
};
use commons_domain::id::{PersonId, UserId};
use commons_domain::user::UserRole;

use crate::domain::types::{ClaimOutcome, NextEvent};
use crate::error::CommunityError;
use crate::handlers::{AppJson, UserResponse};
use crate::state::AppState;
use crate::usecase::claim::{ClaimProfileInput, ClaimProfileUseCase};
use crate::usecase::session::{
    GetMeUseCase, RefreshTokenUseCase, RequestSignInUseCase, SessionTokens, VerifyClaimUseCase,
};

const X_ACCESS_TOKEN_EXPIRES: &str = "x-commons-access-token-expires";

fn token_expires_header(exp: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_ACCESS_TOKEN_EXPIRES),
        HeaderValue::from(exp),
    );
    headers
}

fn with_session(jar: CookieJar, session: SessionTokens, domain: &str) -> (CookieJar, HeaderMap) {
    let jar = set_access_token_cookie(jar, session.access_token, domain.to_owned());
    let jar = set_refresh_token_cookie(jar, session.refresh_token, domain.to_owned());
    (jar, token_expires_header(session.access_token_exp))
}

// ── POST /api/auth/claim-profile ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProfileRequest {
    pub email: String,
    pub person_id: Option<PersonId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProfileResponse {
    pub ok: bool,
    pub kind: &'static str,
    pub message: &'static str,
    /// Present only for `invited`; `null` when no event is scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_event: Option<Option<NextEvent>>,
}

impl From<ClaimOutcome> for ClaimProfileResponse {
    fn from(outcome: ClaimOutcome) -> Self {
        let kind = outcome.kind();
        let message = outcome.message();
        let next_event = match outcome {
            ClaimOutcome::Invited { next_event } => Some(next_event),
            ClaimOutcome::VerificationSent | ClaimOutcome::AlreadyClaimed => None,
        };
        Self {
            ok: true,
            kind,
            message,
            next_event,
        }
    }
}

pub async fn claim_profile(
    State(state): State<AppState>,
    AppJson(body): AppJson<ClaimProfileRequest>,
) -> Result<Json<ClaimProfileResponse>, CommunityError> {
    let usecase = ClaimProfileUseCase {
        people: state.person_repo(),
        users: state.user_repo(),
        tokens: state.claim_token_repo(),
        events: state.event_repo(),
        invites: state.invite_repo(),
        mailer: state.mailer.clone(),
        public_url: state.public_url.clone(),
    };
    let outcome = usecase
        .execute(ClaimProfileInput {
            email: body.email,
            person_id: body.person_id,
        })
        .await?;
    Ok(Json(outcome.into()))
}

// ── POST /api/auth/verify-claim ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyClaimRequest {
    pub token: String,
}

pub async fn verify_claim(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<VerifyClaimRequest>,
) -> Result<impl IntoResponse, CommunityError> {
    let usecase = VerifyClaimUseCase {
        tokens: state.claim_token_repo(),
        people: state.person_repo(),
        users: state.user_repo(),
        jwt_secret: state.secret().to_owned(),
    };
    let out = usecase.execute(body.token.trim()).await?;
    let (jar, headers) = with_session(jar, out.session, &state.cookie_domain);
    Ok((StatusCode::OK, jar, headers, Json(UserResponse::from(out.user))))
}

// ── POST /api/auth/sign-in ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub ok: bool,
    pub message: &'static str,
}

pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignInRequest>,
) -> Result<Json<SignInResponse>, CommunityError> {
    let usecase = RequestSignInUseCase {
        users: state.user_repo(),
        tokens: state.claim_token_repo(),
        mailer: state.mailer.clone(),
        public_url: state.public_url.clone(),
    };
    usecase.execute(&body.email).await?;
    Ok(Json(SignInResponse {
        ok: true,
        message: "Check your inbox for a sign-in link.",
    }))
}

// ── GET /api/auth/token ──────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTokenResponse {
    pub user_id: UserId,
    pub role: UserRole,
    pub access_token_exp: u64,
}

pub async fn check_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, CommunityError> {
    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .ok_or(CommunityError::InvalidToken)?;
    let info = validate_access_token(token.value(), state.secret())
        .map_err(|_| CommunityError::InvalidToken)?;

    let body = CheckTokenResponse {
        user_id: UserId(info.user_id),
        role: info.role,
        access_token_exp: info.exp,
    };
    Ok((StatusCode::OK, token_expires_header(info.exp), Json(body)))
}

// ── PATCH /api/auth/token ────────────────────────────────────────────────────

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, CommunityError> {
    let refresh_value = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or(CommunityError::InvalidRefreshToken)?;

    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        jwt_secret: state.secret().to_owned(),
    };
    let out = usecase.execute(&refresh_value).await?;

    let (jar, headers) = with_session(jar, out.session, &state.cookie_domain);
    Ok((StatusCode::CREATED, jar, headers, Json(UserResponse::from(out.user))))
}

// ── DELETE /api/auth/token ───────────────────────────────────────────────────

pub async fn revoke_token(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = clear_cookies(jar, state.cookie_domain.clone());
    (StatusCode::NO_CONTENT, jar)
}

// ── GET /api/auth/me ─────────────────────────────────────────────────────────

pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, CommunityError> {
    let usecase = GetMeUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(UserId(identity.user_id)).await?;
    Ok(Json(user.into()))
}
