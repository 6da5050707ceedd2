//! Mail transports.

use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::mail::Mail;
use crate::domain::repository::Mailer;
use crate::error::CommunityError;

/// Development transport: writes messages to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> Result<(), CommunityError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "SMTP not configured, mail logged only");
        tracing::debug!(to = %mail.to, body = %mail.body, "mail body");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `Name <address>` or bare address.
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .context("create SMTP transport")?
            .port(config.port);
        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        let from = config.from.parse::<Mailbox>().context("parse SMTP_FROM")?;

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, mail: &Mail) -> Result<(), CommunityError> {
        let to = mail.to.parse::<Mailbox>().context("parse mail recipient")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .context("build mail")?;

        self.transport.send(message).await.context("send mail")?;
        tracing::info!(to = %mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

/// Transport selected at startup.
#[derive(Clone)]
pub enum AppMailer {
    Log(LogMailer),
    Smtp(SmtpMailer),
}

impl AppMailer {
    /// SMTP when a host is configured, otherwise log only.
    pub fn from_config(smtp: Option<SmtpConfig>) -> anyhow::Result<Self> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Log(LogMailer)),
        }
    }
}

impl Mailer for AppMailer {
    async fn send(&self, mail: &Mail) -> Result<(), CommunityError> {
        match self {
            Self::Log(mailer) => mailer.send(mail).await,
            Self::Smtp(mailer) => mailer.send(mail).await,
        }
    }
}
