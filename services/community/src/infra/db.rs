use std::collections::HashSet;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, SqlErr,
    TransactionTrait,
    sea_query::{Expr, Func, Query},
};
use uuid::Uuid;

use commons_community_schema::{claim_tokens, events, invites, people, users};
use commons_domain::id::{EventId, PersonId, UserId};
use commons_domain::pagination::{Page, PageRequest};
use commons_domain::user::UserRole;

use crate::domain::repository::{
    ClaimTokenRepository, DirectoryRepository, EventRepository, InviteRepository,
    PersonRepository, UserRepository,
};
use crate::domain::types::{
    ClaimToken, ClearedDirectory, DirectoryStats, Event, Invite, NewPerson, Person, SourceEvent,
    TokenPurpose, Upserted, User,
};
use crate::error::CommunityError;

/// Escape LIKE metacharacters; Postgres uses `\` as the default escape.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ── Person repository ────────────────────────────────────────────────────────

/// Candidate query for email suggestions, pre-ordered by match tier so a
/// `LIMIT` keeps the best candidates: exact email, email prefix, name or
/// word prefix, then substring.
fn search_query(query: &str) -> Select<people::Entity> {
    let needle = query.trim().to_lowercase();
    let escaped = escape_like(&needle);
    let contains = format!("%{escaped}%");
    let prefix = format!("{escaped}%");
    let word_prefix = format!("% {escaped}%");
    let lower = |col: people::Column| Expr::expr(Func::lower(Expr::col(col)));
    let name_prefix = lower(people::Column::FullName)
        .like(prefix.clone())
        .or(lower(people::Column::FullName).like(word_prefix.clone()))
        .or(lower(people::Column::UserName).like(prefix.clone()))
        .or(lower(people::Column::UserName).like(word_prefix));

    people::Entity::find()
        .filter(
            Condition::any()
                .add(Expr::col(people::Column::Email).like(contains.clone()))
                .add(lower(people::Column::UserName).like(contains.clone()))
                .add(lower(people::Column::FullName).like(contains)),
        )
        .order_by_desc(Expr::col(people::Column::Email).eq(needle))
        .order_by_desc(Expr::col(people::Column::Email).like(prefix))
        .order_by_desc(name_prefix)
        .order_by_asc(people::Column::Email)
}


#[derive(Clone)]
pub struct DbPersonRepository {
    pub db: DatabaseConnection,
}

impl DbPersonRepository {
    /// Attach `is_claimed` from the users table in one extra query.
    async fn with_claims(&self, models: Vec<people::Model>) -> Result<Vec<Person>, CommunityError> {
        if models.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let claimed: HashSet<Uuid> = users::Entity::find()
            .filter(users::Column::PersonId.is_in(ids))
            .all(&self.db)
            .await
            .context("load claims for people")?
            .into_iter()
            .filter_map(|u| u.person_id)
            .collect();
        Ok(models
            .into_iter()
            .map(|m| {
                let is_claimed = claimed.contains(&m.id);
                person_from_model(m, is_claimed)
            })
            .collect())
    }

    async fn one_with_claim(
        &self,
        model: Option<people::Model>,
    ) -> Result<Option<Person>, CommunityError> {
        let Some(model) = model else {
            return Ok(None);
        };
        Ok(self.with_claims(vec![model]).await?.pop())
    }
}

impl PersonRepository for DbPersonRepository {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, CommunityError> {
        let model = people::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find person by id")?;
        self.one_with_claim(model).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, CommunityError> {
        let model = people::Entity::find()
            .filter(people::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find person by email")?;
        self.one_with_claim(model).await
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Person>, CommunityError> {
        let models = search_query(query)
            .limit(limit)
            .all(&self.db)
            .await
            .context("search people")?;
        self.with_claims(models).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Person>, CommunityError> {
        let query = people::Entity::find().order_by_asc(people::Column::Email);
        let total = query.clone().count(&self.db).await.context("count people")?;
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list people")?;
        Ok(Page {
            items: self.with_claims(models).await?,
            total,
        })
    }
}

fn person_from_model(model: people::Model, is_claimed: bool) -> Person {
    Person {
        id: PersonId(model.id),
        api_id: model.api_id,
        email: model.email,
        user_name: model.user_name,
        full_name: model.full_name,
        organization_name: model.organization_name,
        job_title: model.job_title,
        avatar_url: model.avatar_url,
        is_claimed,
        created_at: model.created_at,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CommunityError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CommunityError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &User) -> Result<(), CommunityError> {
        let result = users::ActiveModel {
            id: Set(user.id.0),
            email: Set(user.email.clone()),
            display_name: Set(user.display_name.clone()),
            bio: Set(user.bio.clone()),
            role: Set(i16::from(user.role.as_u8())),
            is_verified: Set(user.is_verified),
            person_id: Set(user.person_id.map(|id| id.0)),
            created_at: Set(user.created_at),
            updated_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(CommunityError::ProfileAlreadyClaimed)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .unwrap_or_else(|| {
            tracing::warn!(user_id = %model.id, role = model.role, "unknown role, treating as member");
            UserRole::Member
        });
    User {
        id: UserId(model.id),
        email: model.email,
        display_name: model.display_name,
        bio: model.bio,
        role,
        is_verified: model.is_verified,
        person_id: model.person_id.map(PersonId),
        created_at: model.created_at,
    }
}

// ── Event repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEventRepository {
    pub db: DatabaseConnection,
}

impl EventRepository for DbEventRepository {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, CommunityError> {
        let model = events::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find event by id")?;
        Ok(model.map(event_from_model))
    }

    async fn next_upcoming(&self, now: DateTime<Utc>) -> Result<Option<Event>, CommunityError> {
        let upcoming = || {
            events::Entity::find()
                .filter(events::Column::StartAt.gt(now))
                .order_by_asc(events::Column::StartAt)
        };
        let featured = upcoming()
            .filter(events::Column::IsFeatured.eq(true))
            .one(&self.db)
            .await
            .context("find featured event")?;
        let model = match featured {
            Some(model) => Some(model),
            None => upcoming()
                .one(&self.db)
                .await
                .context("find next event")?,
        };
        Ok(model.map(event_from_model))
    }
}

fn event_from_model(model: events::Model) -> Event {
    Event {
        id: EventId(model.id),
        api_id: model.api_id,
        title: model.title,
        start_at: model.start_at,
        end_at: model.end_at,
        url: model.url,
        is_featured: model.is_featured,
    }
}

// ── Claim token repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbClaimTokenRepository {
    pub db: DatabaseConnection,
}

impl ClaimTokenRepository for DbClaimTokenRepository {
    async fn count_active(&self, email: &str) -> Result<u64, CommunityError> {
        let count = claim_tokens::Entity::find()
            .filter(claim_tokens::Column::Email.eq(email))
            .filter(claim_tokens::Column::UsedAt.is_null())
            .filter(claim_tokens::Column::ExpiresAt.gt(Utc::now()))
            .count(&self.db)
            .await
            .context("count active claim tokens")?;
        Ok(count)
    }

    async fn create(&self, token: &ClaimToken) -> Result<(), CommunityError> {
        claim_tokens::ActiveModel {
            id: Set(token.id),
            email: Set(token.email.clone()),
            person_id: Set(token.person_id.map(|id| id.0)),
            purpose: Set(token.purpose.as_str().to_owned()),
            token: Set(token.token.clone()),
            expires_at: Set(token.expires_at),
            used_at: Set(None),
            created_at: Set(token.created_at),
        }
        .insert(&self.db)
        .await
        .context("create claim token")?;
        Ok(())
    }

    async fn find_valid(&self, token: &str) -> Result<Option<ClaimToken>, CommunityError> {
        let model = claim_tokens::Entity::find()
            .filter(claim_tokens::Column::Token.eq(token))
            .filter(claim_tokens::Column::UsedAt.is_null())
            .filter(claim_tokens::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .context("find valid claim token")?;
        Ok(model.and_then(claim_token_from_model))
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, CommunityError> {
        let result = claim_tokens::Entity::update_many()
            .col_expr(claim_tokens::Column::UsedAt, Expr::value(Utc::now()))
            .filter(claim_tokens::Column::Id.eq(id))
            .filter(claim_tokens::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("mark claim token used")?;
        Ok(result.rows_affected > 0)
    }
}

fn claim_token_from_model(model: claim_tokens::Model) -> Option<ClaimToken> {
    let Some(purpose) = TokenPurpose::parse(&model.purpose) else {
        tracing::warn!(token_id = %model.id, purpose = %model.purpose, "unknown claim token purpose");
        return None;
    };
    Some(ClaimToken {
        id: model.id,
        email: model.email,
        person_id: model.person_id.map(PersonId),
        purpose,
        token: model.token,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    })
}

// ── Invite repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbInviteRepository {
    pub db: DatabaseConnection,
}

impl InviteRepository for DbInviteRepository {
    async fn count_since(&self, email: &str, since: DateTime<Utc>) -> Result<u64, CommunityError> {
        let count = invites::Entity::find()
            .filter(invites::Column::Email.eq(email))
            .filter(invites::Column::CreatedAt.gt(since))
            .count(&self.db)
            .await
            .context("count recent invites")?;
        Ok(count)
    }

    async fn create(&self, invite: &Invite) -> Result<(), CommunityError> {
        invites::ActiveModel {
            id: Set(invite.id),
            email: Set(invite.email.clone()),
            event_id: Set(invite.event_id.map(|id| id.0)),
            created_at: Set(invite.created_at),
        }
        .insert(&self.db)
        .await
        .context("create invite")?;
        Ok(())
    }
}

// ── Directory repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbDirectoryRepository {
    pub db: DatabaseConnection,
}

fn linked_person_ids() -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(users::Column::PersonId)
        .from(users::Entity)
        .and_where(Expr::col(users::Column::PersonId).is_not_null())
        .to_owned()
}

impl DirectoryRepository for DbDirectoryRepository {
    async fn clear_directory(&self) -> Result<ClearedDirectory, CommunityError> {
        let cleared = self
            .db
            .transaction::<_, ClearedDirectory, DbErr>(|txn| {
                Box::pin(async move {
                    let events = events::Entity::delete_many().exec(txn).await?;
                    let people = people::Entity::delete_many()
                        .filter(people::Column::Id.not_in_subquery(linked_person_ids()))
                        .exec(txn)
                        .await?;
                    Ok(ClearedDirectory {
                        events: events.rows_affected,
                        people: people.rows_affected,
                    })
                })
            })
            .await
            .context("clear directory")?;
        Ok(cleared)
    }

    async fn upsert_event(&self, event: &SourceEvent) -> Result<Upserted, CommunityError> {
        let now = Utc::now();
        let existing = events::Entity::find()
            .filter(events::Column::ApiId.eq(event.api_id.as_str()))
            .one(&self.db)
            .await
            .context("find event by api id")?;

        if let Some(model) = existing {
            events::ActiveModel {
                id: Set(model.id),
                title: Set(event.title.clone()),
                start_at: Set(event.start_at),
                end_at: Set(event.end_at),
                url: Set(event.url.clone()),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .context("update event")?;
            return Ok(Upserted::Existing);
        }

        events::ActiveModel {
            id: Set(EventId::new().0),
            api_id: Set(event.api_id.clone()),
            title: Set(event.title.clone()),
            start_at: Set(event.start_at),
            end_at: Set(event.end_at),
            url: Set(event.url.clone()),
            is_featured: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .context("insert event")?;
        Ok(Upserted::Created)
    }

    async fn upsert_person(&self, person: &NewPerson) -> Result<Upserted, CommunityError> {
        let now = Utc::now();
        let existing = people::Entity::find()
            .filter(
                Condition::any()
                    .add(people::Column::ApiId.eq(person.api_id.as_str()))
                    .add(people::Column::Email.eq(person.email.as_str())),
            )
            .one(&self.db)
            .await
            .context("find person for upsert")?;

        if let Some(model) = existing {
            people::ActiveModel {
                id: Set(model.id),
                user_name: Set(person.user_name.clone().or(model.user_name)),
                full_name: Set(person.full_name.clone().or(model.full_name)),
                avatar_url: Set(person.avatar_url.clone().or(model.avatar_url)),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .context("update person")?;
            return Ok(Upserted::Existing);
        }

        people::ActiveModel {
            id: Set(PersonId::new().0),
            api_id: Set(person.api_id.clone()),
            email: Set(person.email.clone()),
            user_name: Set(person.user_name.clone()),
            full_name: Set(person.full_name.clone()),
            organization_name: Set(None),
            job_title: Set(None),
            avatar_url: Set(person.avatar_url.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .context("insert person")?;
        Ok(Upserted::Created)
    }

    async fn stats(&self) -> Result<DirectoryStats, CommunityError> {
        let events = events::Entity::find()
            .count(&self.db)
            .await
            .context("count events")?;
        let people = people::Entity::find()
            .count(&self.db)
            .await
            .context("count people")?;
        let users = users::Entity::find()
            .count(&self.db)
            .await
            .context("count users")?;
        let claimed_people = people::Entity::find()
            .filter(people::Column::Id.in_subquery(linked_person_ids()))
            .count(&self.db)
            .await
            .context("count claimed people")?;
        let pending_invites = invites::Entity::find()
            .filter(
                invites::Column::Email.not_in_subquery(
                    Query::select()
                        .column(users::Column::Email)
                        .from(users::Entity)
                        .to_owned(),
                ),
            )
            .count(&self.db)
            .await
            .context("count pending invites")?;
        Ok(DirectoryStats {
            events,
            people,
            users,
            claimed_people,
            pending_invites,
        })
    }
}
