//! User identity as seen by this service.
//!
//! Users live in the external identity provider. Locally we only hold their
//! id, email, and the display name stored in provider metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Maximum accepted email length (RFC 5321 path limit).
pub const EMAIL_MAX: usize = 254;

/// Validation errors for [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailValidationError {
    /// Email was blank.
    #[error("email must not be empty")]
    Empty,
    /// Email exceeded [`EMAIL_MAX`] characters.
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    /// Email did not have a `local@domain` shape.
    #[error("email must be a valid address")]
    Malformed,
}

/// Email address with surrounding whitespace removed.
///
/// Comparison is exact: invite acceptance requires the caller's provider email
/// to match the invited address byte for byte.
///
/// # Examples
/// ```
/// use orgdesk::domain::Email;
///
/// let email = Email::new("  ada@example.com ").unwrap();
/// assert_eq!(email.as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmailValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(EmailValidationError::TooLong { max: EMAIL_MAX });
        }
        if !looks_like_email(trimmed) {
            return Err(EmailValidationError::Malformed);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

/// Loose `local@domain.tld` shape check shared with campaign EMAIL fields.
pub(crate) fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Profile data returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Provider user id.
    pub id: UserId,
    /// Current email on record.
    pub email: Email,
    /// Display name from provider metadata, if set.
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Name shown next to authored content; falls back to the email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.email.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", EmailValidationError::Empty)]
    #[case("   ", EmailValidationError::Empty)]
    #[case("no-at-sign", EmailValidationError::Malformed)]
    #[case("@example.com", EmailValidationError::Malformed)]
    #[case("ada@", EmailValidationError::Malformed)]
    #[case("ada@localhost", EmailValidationError::Malformed)]
    #[case("a da@example.com", EmailValidationError::Malformed)]
    fn rejects_invalid_emails(#[case] raw: &str, #[case] expected: EmailValidationError) {
        assert_eq!(Email::new(raw), Err(expected));
    }

    #[rstest]
    fn preserves_case() {
        let email = Email::new("Ada@Example.com").expect("valid email");
        assert_eq!(email.as_ref(), "Ada@Example.com");
    }

    #[rstest]
    #[case(Some("Ada"), "Ada")]
    #[case(Some("  "), "ada@example.com")]
    #[case(None, "ada@example.com")]
    fn label_falls_back_to_email(#[case] name: Option<&str>, #[case] expected: &str) {
        let profile = UserProfile {
            id: UserId::random(),
            email: Email::new("ada@example.com").expect("valid email"),
            display_name: name.map(str::to_owned),
        };
        assert_eq!(profile.label(), expected);
    }
}
