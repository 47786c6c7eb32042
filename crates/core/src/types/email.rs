//! Customer email addresses.
//!
//! Shopify sends emails as free-form strings that may be missing, blank or
//! junk. Linking events and orders to customers by email only happens through
//! an [`Email`], so a blank or malformed field never matches a stored
//! customer whose email is also blank.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is blank")]
    Blank,
    #[error("email is longer than {max} characters")]
    TooLong { max: usize },
    #[error("email {0:?} is not of the form local@domain")]
    Malformed(String),
}

/// A trimmed address with a non-empty local part and domain.
///
/// Matching is exact: no case folding beyond what the shop stored.
///
/// ```
/// use storepulse_core::Email;
///
/// assert_eq!(Email::parse(" ada@example.com ").unwrap().as_str(), "ada@example.com");
/// assert!(Email::parse("ada@").is_err());
/// assert!(Email::from_payload(Some("")).is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns [`EmailError`] for blank, overlong or `@`-less input.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(EmailError::Blank);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed(s.to_owned())),
        }
    }

    /// Read an optional webhook or API field, dropping anything unusable.
    #[must_use]
    pub fn from_payload(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| Self::parse(s).ok())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_keeps_case() {
        let email = Email::parse("  Ada@Example.com\n").unwrap();
        assert_eq!(email.as_str(), "Ada@Example.com");
    }

    #[test]
    fn test_parse_rejects_unusable_input() {
        assert_eq!(Email::parse("   "), Err(EmailError::Blank));
        assert!(matches!(Email::parse("guest"), Err(EmailError::Malformed(_))));
        assert!(matches!(Email::parse("@shop.com"), Err(EmailError::Malformed(_))));
        assert!(matches!(Email::parse("guest@"), Err(EmailError::Malformed(_))));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_from_payload() {
        assert!(Email::from_payload(None).is_none());
        assert!(Email::from_payload(Some("")).is_none());
        assert!(Email::from_payload(Some("not-an-email")).is_none());
        assert_eq!(
            Email::from_payload(Some("bob@example.com")).unwrap().to_string(),
            "bob@example.com"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str(r#""bob@example.com""#).unwrap();
        assert_eq!(email.into_string(), "bob@example.com");
        assert!(serde_json::from_str::<Email>(r#""bob""#).is_err());
    }
}
