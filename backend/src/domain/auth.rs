//! Authentication payloads forwarded to the identity provider.
//!
//! Passwords are held in [`Zeroizing`] buffers so they are wiped once the
//! provider call completes.

use zeroize::Zeroizing;

use super::{Email, EmailValidationError};

/// Minimum length for a new password.
pub const PASSWORD_MIN: usize = 8;
/// Minimum display name length after trimming.
pub const NAME_MIN: usize = 2;
/// Maximum display name length.
pub const NAME_MAX: usize = 100;

/// Validation failures for login and sign-up payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    /// Email failed validation.
    #[error(transparent)]
    Email(#[from] EmailValidationError),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password was shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Display name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Display name was shorter than [`NAME_MIN`].
    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },
    /// Display name exceeded [`NAME_MAX`].
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
}

impl AuthValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
            Self::EmptyName | Self::NameTooShort { .. } | Self::NameTooLong { .. } => "name",
        }
    }
}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use orgdesk::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada@example.com", "pw").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs. Password whitespace is kept.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the provider lookup.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Password supplied by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reject passwords shorter than [`PASSWORD_MIN`].
pub(crate) fn check_new_password(password: &str) -> Result<(), AuthValidationError> {
    if password.is_empty() {
        return Err(AuthValidationError::EmptyPassword);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

/// Trim a display name and check its length bounds.
pub(crate) fn normalize_name(name: &str) -> Result<String, AuthValidationError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length == 0 {
        return Err(AuthValidationError::EmptyName);
    }
    if length < NAME_MIN {
        return Err(AuthValidationError::NameTooShort { min: NAME_MIN });
    }
    if length > NAME_MAX {
        return Err(AuthValidationError::NameTooLong { max: NAME_MAX });
    }
    Ok(trimmed.to_owned())
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpDetails {
    credentials: LoginCredentials,
    name: String,
}

impl SignUpDetails {
    /// Validate sign-up inputs.
    pub fn try_from_parts(email: &str, password: &str, name: &str) -> Result<Self, AuthValidationError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        check_new_password(password)?;
        let name = normalize_name(name)?;
        Ok(Self { credentials, name })
    }

    /// Credentials portion of the request.
    #[must_use]
    pub const fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Display name to store in provider metadata.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", "email")]
    #[case("ada@example.com", "", "password")]
    fn login_rejects_blank_parts(#[case] email: &str, #[case] password: &str, #[case] field: &str) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid input");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn login_keeps_password_whitespace() {
        let creds = LoginCredentials::try_from_parts("ada@example.com", " pw ").expect("valid");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    #[case("short", "Ada", AuthValidationError::PasswordTooShort { min: PASSWORD_MIN })]
    #[case("abcdefg", "Ada", AuthValidationError::PasswordTooShort { min: PASSWORD_MIN })]
    #[case("long enough", "  ", AuthValidationError::EmptyName)]
    #[case("long enough", " A ", AuthValidationError::NameTooShort { min: NAME_MIN })]
    #[case("long enough", &"x".repeat(NAME_MAX + 1), AuthValidationError::NameTooLong { max: NAME_MAX })]
    fn sign_up_validates_password_and_name(
        #[case] password: &str,
        #[case] name: &str,
        #[case] expected: AuthValidationError,
    ) {
        let err = SignUpDetails::try_from_parts("ada@example.com", password, name)
            .expect_err("invalid sign-up");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn sign_up_trims_name() {
        let details =
            SignUpDetails::try_from_parts("ada@example.com", "abcdefgh", "  Al  ").expect("valid");
        assert_eq!(details.name(), "Al");
    }
}
