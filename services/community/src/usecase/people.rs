use commons_domain::email::EmailAddress;
use commons_domain::id::PersonId;
use commons_domain::pagination::{Page, PageRequest};

use crate::domain::repository::PersonRepository;
use crate::domain::types::Person;
use crate::error::CommunityError;

// ── CheckEmail ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEmailOutput {
    pub exists: bool,
    pub person_id: Option<PersonId>,
    pub is_claimed: Option<bool>,
}

pub struct CheckEmailUseCase<P: PersonRepository> {
    pub people: P,
}

impl<P: PersonRepository> CheckEmailUseCase<P> {
    pub async fn execute(&self, email: &str) -> Result<CheckEmailOutput, CommunityError> {
        let email = EmailAddress::parse(email).map_err(|_| CommunityError::InvalidEmail)?;
        let person = self.people.find_by_email(email.as_str()).await?;
        Ok(CheckEmailOutput {
            exists: person.is_some(),
            person_id: person.as_ref().map(|p| p.id),
            is_claimed: person.as_ref().map(|p| p.is_claimed),
        })
    }
}

// ── ListPeople ────────────────────────────────────────────────────────────────

pub struct ListPeopleUseCase<P: PersonRepository> {
    pub people: P,
}

impl<P: PersonRepository> ListPeopleUseCase<P> {
    pub async fn execute(&self, page: PageRequest) -> Result<Page<Person>, CommunityError> {
        self.people.list(page.clamped()).await
    }
}
