//! Client for the events platform (Luma public API).

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::repository::EventSource;
use crate::domain::types::{SourceEvent, SourceGuest};
use crate::error::CommunityError;

const API_KEY_HEADER: &str = "x-luma-api-key";
const EVENT_PAGE_BASE: &str = "https://lu.ma/";

#[derive(Debug, Clone)]
pub struct LumaConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// First retry delay; doubles on each attempt.
    pub backoff_base_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LumaError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PageResponse<T> {
    entries: Vec<T>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventEntry {
    event: LumaEvent,
}

#[derive(Debug, Deserialize)]
struct LumaEvent {
    api_id: String,
    name: String,
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuestEntry {
    guest: LumaGuest,
}

#[derive(Debug, Deserialize)]
struct LumaGuest {
    api_id: String,
    user_email: Option<String>,
    user_name: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    avatar_url: Option<String>,
}

impl From<LumaEvent> for SourceEvent {
    fn from(event: LumaEvent) -> Self {
        let url = event.url.filter(|u| !u.is_empty()).map(|u| {
            if u.starts_with("http://") || u.starts_with("https://") {
                u
            } else {
                format!("{EVENT_PAGE_BASE}{u}")
            }
        });
        Self {
            api_id: event.api_id,
            title: event.name,
            start_at: event.start_at,
            end_at: event.end_at,
            url,
        }
    }
}

impl From<LumaGuest> for SourceGuest {
    fn from(guest: LumaGuest) -> Self {
        let parts: Vec<&str> = [guest.user_first_name.as_deref(), guest.user_last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let full_name = if parts.is_empty() {
            guest.user_name.clone()
        } else {
            Some(parts.join(" "))
        };
        Self {
            api_id: guest.api_id,
            email: guest.user_email,
            user_name: guest.user_name,
            full_name,
            avatar_url: guest.avatar_url,
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LumaClient {
    client: Client,
    config: LumaConfig,
}

impl LumaClient {
    pub fn new(config: LumaConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// All calendar events, following pagination cursors.
    pub async fn fetch_events(&self) -> Result<Vec<SourceEvent>, LumaError> {
        let entries: Vec<EventEntry> = self
            .fetch_all("/public/v1/calendar/list-events", &[])
            .await?;
        Ok(entries.into_iter().map(|e| e.event.into()).collect())
    }

    /// All guests registered for one event.
    pub async fn fetch_guests(&self, event_api_id: &str) -> Result<Vec<SourceGuest>, LumaError> {
        let entries: Vec<GuestEntry> = self
            .fetch_all("/public/v1/event/get-guests", &[("event_api_id", event_api_id)])
            .await?;
        Ok(entries.into_iter().map(|e| e.guest.into()).collect())
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, LumaError> {
        let mut cursor: Option<String> = None;
        let mut all = Vec::new();

        loop {
            let mut url = Url::parse(&format!(
                "{}{path}",
                self.config.base_url.trim_end_matches('/')
            ))?;
            {
                let mut query = url.query_pairs_mut();
                for (key, value) in params {
                    query.append_pair(key, value);
                }
                if let Some(cursor) = &cursor {
                    query.append_pair("pagination_cursor", cursor);
                }
            }
            if url.query() == Some("") {
                url.set_query(None);
            }

            let page: PageResponse<T> = self.request_with_retry(url).await?;
            all.extend(page.entries);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(all)
    }

    async fn request_with_retry<T: DeserializeOwned>(&self, url: Url) -> Result<T, LumaError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_ms = (self.config.backoff_base_ms << (attempt - 1).min(16)).min(30_000);
                tracing::warn!(attempt, backoff_ms, url = %url, "retrying events platform request");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }

            let response = match self
                .client
                .get(url.clone())
                .header(API_KEY_HEADER, &self.config.api_key)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(LumaError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response.json::<T>().await.map_err(LumaError::RequestError);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = retry_after.min(60);
                    tracing::warn!(wait, "rate-limited by events platform, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_owned();
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(LumaError::HttpError { status, body });
        }

        Err(LumaError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

impl EventSource for LumaClient {
    async fn list_events(&self) -> Result<Vec<SourceEvent>, CommunityError> {
        Ok(self.fetch_events().await?)
    }

    async fn list_guests(&self, event_api_id: &str) -> Result<Vec<SourceGuest>, CommunityError> {
        Ok(self.fetch_guests(event_api_id).await?)
    }
}
