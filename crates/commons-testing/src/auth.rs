//! Mock session helpers for integration tests.
//!
//! Services read the session from the access-token cookie. `MockAuth` signs a
//! real access token with the test secret so requests pass the `Identity`
//! extractors without going through the claim flow.

use http::{HeaderName, HeaderValue, header::COOKIE};
use uuid::Uuid;

use commons_auth_types::cookie::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use commons_auth_types::token::{TokenKind, issue_token};
use commons_domain::user::UserRole;

/// Secret shared by test states and `MockAuth`.
pub const TEST_JWT_SECRET: &str = "commons-test-secret";

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: UserRole,
    pub secret: String,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    pub fn member() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Member)
    }

    pub fn admin() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Admin)
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_owned();
        self
    }

    fn token(&self, kind: TokenKind) -> String {
        issue_token(self.user_id, self.role, kind, &self.secret)
            .expect("sign test token")
            .token
    }

    /// `Cookie` header value carrying a signed access token.
    pub fn cookie_value(&self) -> String {
        format!("{ACCESS_TOKEN_COOKIE}={}", self.token(TokenKind::Access))
    }

    /// `Cookie` header value carrying a signed refresh token.
    pub fn refresh_cookie_value(&self) -> String {
        format!("{REFRESH_TOKEN_COOKIE}={}", self.token(TokenKind::Refresh))
    }

    /// Header pair for `TestServer::add_header` and friends.
    pub fn cookie_header(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&self.cookie_value()).expect("cookie header value");
        (COOKIE, value)
    }
}
