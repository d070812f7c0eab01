//! Driving port for session authentication.
//!
//! Handlers call this port to trade credentials for a user id without
//! knowing which identity provider sits behind it.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, SignUpDetails, UserId, UserProfile};

/// Authentication use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the user's profile.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserProfile, Error>;

    /// Register a new account.
    async fn sign_up(&self, details: &SignUpDetails) -> Result<UserProfile, Error>;

    /// Profile of the signed-in user.
    ///
    /// # Errors
    /// `unauthorized` when the provider no longer knows the user.
    async fn current_user(&self, user_id: &UserId) -> Result<UserProfile, Error>;
}
