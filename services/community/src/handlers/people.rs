use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};

use commons_domain::id::PersonId;
use commons_domain::pagination::PageRequest;

use crate::domain::types::Person;
use crate::error::CommunityError;
use crate::handlers::AppQuery;
use crate::state::AppState;
use crate::usecase::people::{CheckEmailUseCase, ListPeopleUseCase};
use crate::usecase::suggestion::SearchEmailsUseCase;

// ── GET /api/people/search-emails ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchEmailsQuery {
    #[serde(default)]
    pub query: String,
    /// Echoed back so clients can drop responses to superseded queries.
    pub seq: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub id: PersonId,
    #[serde(rename = "api_id")]
    pub api_id: String,
    pub email: String,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_claimed: bool,
}

impl From<Person> for SuggestionResponse {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            api_id: person.api_id,
            email: person.email,
            user_name: person.user_name,
            full_name: person.full_name,
            avatar_url: person.avatar_url,
            is_claimed: person.is_claimed,
        }
    }
}

#[derive(Serialize)]
pub struct SearchEmailsResponse {
    pub results: Vec<SuggestionResponse>,
    pub seq: Option<u64>,
}

pub async fn search_emails(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchEmailsQuery>,
) -> Result<Json<SearchEmailsResponse>, CommunityError> {
    let usecase = SearchEmailsUseCase {
        people: state.person_repo(),
    };
    let people = usecase.execute(&query.query).await?;
    Ok(Json(SearchEmailsResponse {
        results: people.into_iter().map(Into::into).collect(),
        seq: query.seq,
    }))
}

// ── GET /api/people/check-email ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckEmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmailResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_claimed: Option<bool>,
}

pub async fn check_email(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CheckEmailQuery>,
) -> Result<Json<CheckEmailResponse>, CommunityError> {
    let usecase = CheckEmailUseCase {
        people: state.person_repo(),
    };
    let out = usecase.execute(&query.email).await?;
    Ok(Json(CheckEmailResponse {
        exists: out.exists,
        person_id: out.person_id,
        is_claimed: out.is_claimed,
    }))
}

// ── GET /api/people ──────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResponse {
    pub id: PersonId,
    pub display_name: String,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub job_title: Option<String>,
    pub avatar_url: Option<String>,
    pub is_claimed: bool,
    #[serde(serialize_with = "commons_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            display_name: person.display_name(),
            user_name: person.user_name,
            full_name: person.full_name,
            organization_name: person.organization_name,
            job_title: person.job_title,
            avatar_url: person.avatar_url,
            is_claimed: person.is_claimed,
            created_at: person.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct PeoplePageResponse {
    pub items: Vec<PersonResponse>,
    pub total: u64,
}

pub async fn list_people(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageRequest>,
) -> Result<Json<PeoplePageResponse>, CommunityError> {
    let usecase = ListPeopleUseCase {
        people: state.person_repo(),
    };
    let page = usecase.execute(page).await?;
    Ok(Json(PeoplePageResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
    }))
}
