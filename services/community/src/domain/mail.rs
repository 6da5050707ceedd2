//! Outgoing mail composition.

use chrono::SecondsFormat;

use crate::domain::types::{NextEvent, Person};

/// Plain-text message ready for a [`Mailer`](crate::domain::repository::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Link that redeems a claim or sign-in token.
pub fn verify_link(public_url: &str, token: &str) -> String {
    format!("{}/claim/verify?token={token}", public_url.trim_end_matches('/'))
}

pub fn claim_verification(person: &Person, link: &str) -> Mail {
    Mail {
        to: person.email.clone(),
        subject: "Verify your email to claim your profile".to_owned(),
        body: format!(
            "Hi {},\n\n\
             Someone (hopefully you) asked to claim this community profile.\n\
             Open the link below to verify your email and finish claiming it:\n\n\
             {link}\n\n\
             The link expires in 24 hours. If you didn't request this, you can ignore this email.",
            person.display_name()
        ),
    }
}

pub fn sign_in(email: &str, link: &str) -> Mail {
    Mail {
        to: email.to_owned(),
        subject: "Your sign-in link".to_owned(),
        body: format!(
            "Open the link below to sign in to your community account:\n\n\
             {link}\n\n\
             The link expires in 24 hours. If you didn't request this, you can ignore this email."
        ),
    }
}

pub fn invite(email: &str, event: Option<&NextEvent>) -> Mail {
    let details = match event {
        Some(event) => {
            let when = event.start_time.to_rfc3339_opts(SecondsFormat::Secs, true);
            let link = event.url.as_deref().unwrap_or("(link to follow)");
            format!(
                "Our next event is {} on {when}.\nRegister here: {link}\n\n\
                 Once you've attended, your profile will show up in the directory.",
                event.title
            )
        }
        None => "We'll let you know as soon as the next event is announced.".to_owned(),
    };
    Mail {
        to: email.to_owned(),
        subject: "You're invited to our next community event".to_owned(),
        body: format!("Hi,\n\nWe couldn't find a community profile for {email} yet.\n{details}"),
    }
}
