//! Driven port for the external identity provider.
//!
//! Authentication, sign-up, and profile storage are delegated. This service
//! asks who a user is and forwards account settings changes.

use async_trait::async_trait;

use crate::domain::{Email, LoginCredentials, SignUpDetails, UserId, UserProfile, UserUpdate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider could not be reached.
        Connection { message: String } =>
            "identity provider unreachable: {message}",
        /// Email and password did not match.
        InvalidCredentials =>
            "invalid credentials",
        /// Sign-up used an email that is already registered.
        EmailTaken =>
            "email already registered",
        /// The provider refused the request.
        Rejected { message: String } =>
            "identity provider rejected request: {message}",
        /// No account exists for the user id.
        UnknownUser =>
            "user not found",
        /// The provider answered with something we could not interpret.
        Protocol { message: String } =>
            "identity provider protocol error: {message}",
    }
}

/// Identity lookups and credential checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<UserProfile, IdentityProviderError>;

    /// Register a user with a display name.
    async fn sign_up(&self, details: &SignUpDetails) -> Result<UserProfile, IdentityProviderError>;

    /// Profile for `id`, if the user exists.
    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, IdentityProviderError>;

    /// Profile registered under `email`, if any.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserProfile>, IdentityProviderError>;

    /// Profiles for `ids`; unknown ids are skipped.
    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, IdentityProviderError>;

    /// Apply `update` to the account and return the new profile.
    ///
    /// # Errors
    /// [`IdentityProviderError::EmailTaken`] when the new email belongs to
    /// another account; [`IdentityProviderError::UnknownUser`] when `id` is
    /// not registered.
    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<UserProfile, IdentityProviderError>;

    /// Remove the account.
    ///
    /// # Errors
    /// [`IdentityProviderError::UnknownUser`] when `id` is not registered.
    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityProviderError>;
}
