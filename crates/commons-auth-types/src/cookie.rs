//! Cookie builders for the session tokens.
//!
//! The browser client sends requests with `credentials: 'include'`, so the
//! session lives entirely in these two HttpOnly cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::token::REFRESH_TOKEN_EXP;

/// Cookie name for the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "commons_access_token";

/// Cookie name for the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "commons_refresh_token";

/// The refresh token is only sent to the token endpoint.
pub const REFRESH_TOKEN_PATH: &str = "/api/auth/token";

fn session_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    domain: String,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .domain(domain)
        .max_age(max_age)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Set the access-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use commons_auth_types::cookie::{set_access_token_cookie, ACCESS_TOKEN_COOKIE};
///
/// let jar = set_access_token_cookie(CookieJar::new(), "token".to_string(), "example.com".to_string());
/// let cookie = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert!(cookie.http_only().unwrap_or(false));
/// ```
pub fn set_access_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        value,
        "/",
        domain,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
    ))
}

/// Set the refresh-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use commons_auth_types::cookie::{set_refresh_token_cookie, REFRESH_TOKEN_COOKIE};
///
/// let jar = set_refresh_token_cookie(CookieJar::new(), "refresh".to_string(), "example.com".to_string());
/// let cookie = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.path(), Some("/api/auth/token"));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_refresh_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        value,
        REFRESH_TOKEN_PATH,
        domain,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
    ))
}

/// Clear both token cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use commons_auth_types::cookie::{clear_cookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
///
/// let jar = clear_cookies(CookieJar::new(), "example.com".to_string());
/// assert_eq!(jar.get(ACCESS_TOKEN_COOKIE).unwrap().max_age(), Some(time::Duration::ZERO));
/// assert_eq!(jar.get(REFRESH_TOKEN_COOKIE).unwrap().max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_cookies(jar: CookieJar, domain: String) -> CookieJar {
    let access = session_cookie(
        ACCESS_TOKEN_COOKIE,
        String::new(),
        "/",
        domain.clone(),
        Duration::ZERO,
    );
    let refresh = session_cookie(
        REFRESH_TOKEN_COOKIE,
        String::new(),
        REFRESH_TOKEN_PATH,
        domain,
        Duration::ZERO,
    );
    jar.add(access).add(refresh)
}
