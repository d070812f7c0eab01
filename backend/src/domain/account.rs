//! Account settings payloads: profile edits and password changes.

use zeroize::Zeroizing;

use super::auth::{check_new_password, normalize_name};
use super::{AuthValidationError, Email};

/// Validated profile edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    name: String,
    email: Email,
}

impl ProfileUpdate {
    /// Validate a new display name and email.
    pub fn try_from_parts(name: &str, email: &str) -> Result<Self, AuthValidationError> {
        let name = normalize_name(name)?;
        let email = Email::new(email)?;
        Ok(Self { name, email })
    }

    /// Trimmed display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested email address.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// Validation failures for a password change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordChangeError {
    /// The current password was blank.
    #[error("current password is required")]
    MissingCurrent,
    /// The replacement password failed the sign-up rules.
    #[error(transparent)]
    Replacement(AuthValidationError),
}

impl PasswordChangeError {
    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingCurrent => "currentPassword",
            Self::Replacement(_) => "newPassword",
        }
    }
}

/// Validated password change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current: Zeroizing<String>,
    replacement: Zeroizing<String>,
}

impl PasswordChange {
    /// Validate the current and replacement passwords.
    pub fn try_from_parts(current: &str, replacement: &str) -> Result<Self, PasswordChangeError> {
        if current.is_empty() {
            return Err(PasswordChangeError::MissingCurrent);
        }
        check_new_password(replacement).map_err(PasswordChangeError::Replacement)?;
        Ok(Self {
            current: Zeroizing::new(current.to_owned()),
            replacement: Zeroizing::new(replacement.to_owned()),
        })
    }

    /// Password the caller claims to have now.
    #[must_use]
    pub fn current(&self) -> &str {
        self.current.as_str()
    }

    /// Password to set.
    #[must_use]
    pub fn replacement(&self) -> &str {
        self.replacement.as_str()
    }
}

/// Changes sent to the identity provider. `None` leaves a value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// Display name stored in provider metadata.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<Email>,
    /// Replacement password.
    pub password: Option<Zeroizing<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PASSWORD_MIN;
    use rstest::rstest;

    #[rstest]
    #[case("A", "ada@example.com", "name")]
    #[case("  ", "ada@example.com", "name")]
    #[case("Ada", "not-an-email", "email")]
    fn profile_update_rejects_bad_parts(#[case] name: &str, #[case] email: &str, #[case] field: &str) {
        let err = ProfileUpdate::try_from_parts(name, email).expect_err("invalid profile");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn profile_update_trims_name() {
        let update = ProfileUpdate::try_from_parts("  Ada  ", "ada@example.com").expect("valid");
        assert_eq!(update.name(), "Ada");
        assert_eq!(update.email().as_ref(), "ada@example.com");
    }

    #[rstest]
    #[case("", "long enough", PasswordChangeError::MissingCurrent)]
    #[case(
        "old",
        "short",
        PasswordChangeError::Replacement(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN })
    )]
    fn password_change_checks_both_fields(
        #[case] current: &str,
        #[case] replacement: &str,
        #[case] expected: PasswordChangeError,
    ) {
        let err = PasswordChange::try_from_parts(current, replacement).expect_err("invalid change");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn short_current_password_is_accepted() {
        let change = PasswordChange::try_from_parts("old", "brand-new-pass").expect("valid");
        assert_eq!(change.current(), "old");
        assert_eq!(change.replacement(), "brand-new-pass");
    }
}
