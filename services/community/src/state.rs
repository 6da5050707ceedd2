use std::time::Duration;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use commons_auth_types::identity::JwtSecret;

use crate::infra::db::{
    DbClaimTokenRepository, DbDirectoryRepository, DbEventRepository, DbInviteRepository,
    DbPersonRepository, DbUserRepository,
};
use crate::infra::jobs::JobRegistry;
use crate::infra::luma::LumaClient;
use crate::infra::mailer::AppMailer;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: JwtSecret,
    pub cookie_domain: String,
    pub public_url: String,
    pub request_timeout: Duration,
    pub mailer: AppMailer,
    pub luma: LumaClient,
    pub jobs: JobRegistry,
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl AppState {
    pub fn person_repo(&self) -> DbPersonRepository {
        DbPersonRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn event_repo(&self) -> DbEventRepository {
        DbEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn claim_token_repo(&self) -> DbClaimTokenRepository {
        DbClaimTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn invite_repo(&self) -> DbInviteRepository {
        DbInviteRepository {
            db: self.db.clone(),
        }
    }

    pub fn directory_repo(&self) -> DbDirectoryRepository {
        DbDirectoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.jwt_secret.0
    }
}
