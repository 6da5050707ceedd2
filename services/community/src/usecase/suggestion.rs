use crate::domain::repository::PersonRepository;
use crate::domain::types::{MAX_SUGGESTIONS, MIN_SUGGESTION_QUERY_LEN, Person};
use crate::error::CommunityError;

/// Candidates fetched from the database before final ranking.
const SEARCH_CANDIDATES: u64 = 50;

/// Match quality, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    ExactEmail,
    EmailPrefix,
    NamePrefix,
    Substring,
}

fn name_has_prefix(name: Option<&str>, needle: &str) -> bool {
    let Some(name) = name else {
        return false;
    };
    let name = name.to_lowercase();
    name.starts_with(needle) || name.split_whitespace().any(|word| word.starts_with(needle))
}

fn rank(person: &Person, needle: &str) -> MatchRank {
    let email = person.email.to_lowercase();
    if email == needle {
        MatchRank::ExactEmail
    } else if email.starts_with(needle) {
        MatchRank::EmailPrefix
    } else if name_has_prefix(person.full_name.as_deref(), needle)
        || name_has_prefix(person.user_name.as_deref(), needle)
    {
        MatchRank::NamePrefix
    } else {
        MatchRank::Substring
    }
}

/// Order candidates by match quality, then email, and keep the top results.
pub fn rank_suggestions(query: &str, mut people: Vec<Person>) -> Vec<Person> {
    let needle = query.trim().to_lowercase();
    people.sort_by_cached_key(|p| (rank(p, &needle), p.email.clone()));
    people.truncate(MAX_SUGGESTIONS);
    people
}

/// Email autocomplete for the claim form.
///
/// Claimed people are returned too; callers flag them instead of hiding them.
pub struct SearchEmailsUseCase<P: PersonRepository> {
    pub people: P,
}

impl<P: PersonRepository> SearchEmailsUseCase<P> {
    pub async fn execute(&self, query: &str) -> Result<Vec<Person>, CommunityError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_SUGGESTION_QUERY_LEN {
            return Ok(vec![]);
        }
        let candidates = self.people.search(trimmed, SEARCH_CANDIDATES).await?;
        Ok(rank_suggestions(trimmed, candidates))
    }
}
