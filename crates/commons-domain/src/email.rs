//! Email address validation and normalisation.
//!
//! Directory lookups are case-insensitive, so every address entering the
//! system goes through [`EmailAddress::parse`], which trims and lower-cases it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Maximum length of an address (RFC 5321 path limit minus brackets).
pub const MAX_EMAIL_LEN: usize = 254;

/// Error returned when input does not have the basic `local@domain.tld` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid email address: {0:?}")]
pub struct InvalidEmail(pub String);

/// A syntactically valid, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise raw user input.
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let normalized = raw.trim().to_lowercase();
        if is_valid_shape(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(InvalidEmail(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a stored address.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

fn is_valid_shape(s: &str) -> bool {
    if s.len() > MAX_EMAIL_LEN || !s.validate_email() {
        return false;
    }
    // Directory addresses are public mailboxes: require a dotted domain.
    s.rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = InvalidEmail;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}
