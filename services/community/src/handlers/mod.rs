pub mod admin;
pub mod auth;
pub mod events;
pub mod health;
pub mod people;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;

use commons_domain::id::{PersonId, UserId};
use commons_domain::user::UserRole;

use crate::domain::types::User;
use crate::error::CommunityError;

// ── Extractors ───────────────────────────────────────────────────────────────

/// JSON body whose rejections use the service error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(CommunityError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejections use the service error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(CommunityError))]
pub struct AppQuery<T>(pub T);

// ── Shared response types ────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub person_id: Option<PersonId>,
    #[serde(serialize_with = "commons_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            role: user.role,
            is_verified: user.is_verified,
            person_id: user.person_id,
            created_at: user.created_at,
        }
    }
}
