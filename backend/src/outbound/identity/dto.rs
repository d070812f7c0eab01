//! Wire types for the GoTrue-compatible auth API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Email, UserId, UserProfile, UserUpdate};

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: SignUpMetadataDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpMetadataDto<'a> {
    pub(super) name: &'a str,
}

/// Body of the admin user update. Absent fields are left unchanged.
#[derive(Debug, Serialize)]
pub(super) struct AdminUserUpdateDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) user_metadata: Option<SignUpMetadataDto<'a>>,
}

impl<'a> From<&'a UserUpdate> for AdminUserUpdateDto<'a> {
    fn from(update: &'a UserUpdate) -> Self {
        Self {
            email: update.email.as_ref().map(AsRef::as_ref),
            password: update.password.as_ref().map(|password| password.as_str()),
            user_metadata: update
                .name
                .as_deref()
                .map(|name| SignUpMetadataDto { name }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UserMetadataDto {
    pub(super) name: Option<String>,
    pub(super) full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: Uuid,
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: UserMetadataDto,
}

/// Sign-in always wraps the user in a session; sign-up does so only when
/// email confirmation is disabled.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum UserEnvelopeDto {
    Session { user: UserDto },
    Bare(UserDto),
}

impl UserEnvelopeDto {
    pub(super) fn into_user(self) -> UserDto {
        match self {
            Self::Session { user } | Self::Bare(user) => user,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserListDto {
    #[serde(default)]
    pub(super) users: Vec<UserDto>,
}

/// Error bodies differ between endpoints and releases.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    pub(super) msg: Option<String>,
    pub(super) message: Option<String>,
    pub(super) error_description: Option<String>,
    pub(super) error_code: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
    }
}

impl UserDto {
    pub(super) fn into_profile(self) -> Result<UserProfile, String> {
        let raw_email = self
            .email
            .ok_or_else(|| format!("user {} has no email", self.id))?;
        let email = Email::new(&raw_email).map_err(|err| format!("user {}: {err}", self.id))?;
        Ok(UserProfile {
            id: UserId::from_uuid(self.id),
            email,
            display_name: self.user_metadata.name.or(self.user_metadata.full_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"access_token":"t","user":{"id":"4f1c2c8e-8d4e-4c4e-9a3a-0d7a3f6f1a11","email":"ada@example.com","user_metadata":{"name":"Ada"}}}"#)]
    #[case(r#"{"id":"4f1c2c8e-8d4e-4c4e-9a3a-0d7a3f6f1a11","email":"ada@example.com","user_metadata":{"name":"Ada"}}"#)]
    fn both_envelopes_yield_the_user(#[case] body: &str) {
        let envelope: UserEnvelopeDto = serde_json::from_str(body).expect("decodes");

        let profile = envelope.into_user().into_profile().expect("valid profile");

        assert_eq!(profile.email.as_ref(), "ada@example.com");
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
    }

    #[rstest]
    fn missing_metadata_leaves_name_empty() {
        let user: UserDto = serde_json::from_str(
            r#"{"id":"4f1c2c8e-8d4e-4c4e-9a3a-0d7a3f6f1a11","email":"bob@example.com"}"#,
        )
        .expect("decodes");

        let profile = user.into_profile().expect("valid profile");

        assert_eq!(profile.display_name, None);
    }

    #[rstest]
    fn phone_only_users_are_rejected() {
        let user: UserDto =
            serde_json::from_str(r#"{"id":"4f1c2c8e-8d4e-4c4e-9a3a-0d7a3f6f1a11"}"#)
                .expect("decodes");

        assert!(user.into_profile().is_err());
    }

    #[rstest]
    fn admin_update_sends_only_changed_fields() {
        let update = UserUpdate {
            name: Some("Ada".to_owned()),
            ..UserUpdate::default()
        };

        let body = serde_json::to_value(AdminUserUpdateDto::from(&update)).expect("encodes");

        assert_eq!(body, serde_json::json!({ "user_metadata": { "name": "Ada" } }));
    }
}
