//! JWT session tokens.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use commons_domain::user::UserRole;

/// Access-token JWT lifetime in seconds (4 hours).
pub const ACCESS_TOKEN_EXP: u64 = 14400;

/// Refresh-token JWT lifetime and cookie Max-Age in seconds (30 days).
pub const REFRESH_TOKEN_EXP: u64 = 2_592_000;

/// Which of the two session tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// User identity extracted from a validated token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub role: UserRole,
    pub exp: u64,
}

/// Errors returned by token validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token kind")]
    WrongKind,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id (UUID string) |
/// | `role` | custom | [`UserRole`] wire value |
/// | `typ` | custom | access or refresh |
/// | `exp` | `exp` | expiry, seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: u8,
    pub typ: TokenKind,
    pub exp: u64,
}

/// HS256 with exp checked and `exp` + `sub` required. Default leeway is 60s.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

/// Validate a token of the expected kind and return the identity it carries.
pub fn validate_token(token: &str, secret: &str, kind: TokenKind) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    if claims.typ != kind {
        return Err(AuthError::WrongKind);
    }
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    let role = UserRole::from_u8(claims.role).ok_or(AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        role,
        exp: claims.exp,
    })
}

/// Validate an access-token cookie value.
pub fn validate_access_token(cookie_value: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    validate_token(cookie_value, secret, TokenKind::Access)
}

#[cfg(any(feature = "issuer", test))]
pub use issue::{IssuedToken, issue_token};

#[cfg(any(feature = "issuer", test))]
mod issue {
    use std::time::{SystemTime, UNIX_EPOCH};

    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use commons_domain::user::UserRole;

    use super::{ACCESS_TOKEN_EXP, JwtClaims, REFRESH_TOKEN_EXP, TokenKind};

    #[derive(Debug, Clone)]
    pub struct IssuedToken {
        pub token: String,
        pub exp: u64,
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Sign a new session token for a user.
    pub fn issue_token(
        user_id: Uuid,
        role: UserRole,
        kind: TokenKind,
        secret: &str,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let lifetime = match kind {
            TokenKind::Access => ACCESS_TOKEN_EXP,
            TokenKind::Refresh => REFRESH_TOKEN_EXP,
        };
        let exp = now_secs() + lifetime;
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: role.as_u8(),
            typ: kind,
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(IssuedToken { token, exp })
    }
}
