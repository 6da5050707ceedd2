//! Session identity extractors.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::extract::cookie::CookieJar;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use commons_domain::user::UserRole;

use crate::cookie::ACCESS_TOKEN_COOKIE;
use crate::token::validate_access_token;

/// HMAC secret used to validate session tokens. Provide it from the router
/// state with a `FromRef` impl.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Signed-in member, taken from the access-token cookie.
///
/// Returns 401 if the cookie is absent, expired, or not a valid access token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

fn identity_from_parts(parts: &Parts, secret: &JwtSecret) -> Result<Identity, StatusCode> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let info = validate_access_token(token.value(), &secret.0).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        StatusCode::UNAUTHORIZED
    })?;
    Ok(Identity {
        user_id: info.user_id,
        role: info.role,
    })
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = StatusCode;

    // Validate synchronously and return a 'static future; axum-core 0.5 declares
    // this method as `fn -> impl Future + Send`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = identity_from_parts(parts, &JwtSecret::from_ref(state));
        async move { result }
    }
}

/// Signed-in admin. 401 without a valid session, 403 for non-admin members.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = identity_from_parts(parts, &JwtSecret::from_ref(state)).and_then(|identity| {
            if identity.role.is_admin() {
                Ok(AdminIdentity(identity))
            } else {
                Err(StatusCode::FORBIDDEN)
            }
        });
        async move { result }
    }
}
