//! Driving port for account settings.

use async_trait::async_trait;

use crate::domain::{Error, PasswordChange, ProfileUpdate, UserId, UserProfile};

/// Self-service changes to the signed-in account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Store a new display name, and the email when it differs.
    ///
    /// # Errors
    /// `conflict` when the email belongs to another account.
    async fn update_profile(&self, caller: &UserId, update: &ProfileUpdate) -> Result<UserProfile, Error>;

    /// Replace the password after re-checking the current one.
    ///
    /// # Errors
    /// `invalid_request` when the current password is wrong.
    async fn change_password(&self, caller: &UserId, change: &PasswordChange) -> Result<(), Error>;

    /// Leave every organization and delete the account.
    ///
    /// # Errors
    /// `conflict` while the caller still owns an organization.
    async fn delete_account(&self, caller: &UserId) -> Result<(), Error>;
}
