use std::time::Duration;

use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use commons_auth_types::identity::JwtSecret;
use commons_community::config::CommunityConfig;
use commons_community::infra::jobs::JobRegistry;
use commons_community::infra::luma::LumaClient;
use commons_community::infra::mailer::AppMailer;
use commons_community::router::build_router;
use commons_community::state::AppState;
use commons_core::config::Config;
use commons_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = CommunityConfig::from_env().context("failed to load configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let luma = LumaClient::new(config.luma_config()).context("failed to build Luma client")?;
    let mailer = AppMailer::from_config(config.smtp_config())?;

    let state = AppState {
        db,
        jwt_secret: JwtSecret::new(config.jwt_secret.as_str()),
        cookie_domain: config.cookie_domain.clone(),
        public_url: config.public_url.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        mailer,
        luma,
        jobs: JobRegistry::new(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.community_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("community service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
