//! Account settings service.
//!
//! Profile and password changes go straight to the identity provider.
//! Deleting an account also drops the caller's memberships, and is refused
//! while the caller still owns an organization.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use zeroize::Zeroizing;

use super::authorization::map_organization_error;
use super::directory::map_identity_error;
use super::ports::{AccountCommand, IdentityProvider, IdentityProviderError, OrganizationRepository};
use super::{
    Error, LoginCredentials, OrgRole, PasswordChange, ProfileUpdate, UserId, UserProfile, UserUpdate,
};

/// Domain service for [`AccountCommand`].
pub struct AccountService<O, I> {
    organizations: Arc<O>,
    identity: Arc<I>,
}

impl<O, I> AccountService<O, I>
where
    O: OrganizationRepository,
    I: IdentityProvider,
{
    /// Create the service.
    pub fn new(organizations: Arc<O>, identity: Arc<I>) -> Self {
        Self {
            organizations,
            identity,
        }
    }

    async fn profile(&self, caller: &UserId) -> Result<UserProfile, Error> {
        self.identity
            .find_user(caller)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[async_trait]
impl<O, I> AccountCommand for AccountService<O, I>
where
    O: OrganizationRepository,
    I: IdentityProvider,
{
    async fn update_profile(&self, caller: &UserId, update: &ProfileUpdate) -> Result<UserProfile, Error> {
        let current = self.profile(caller).await?;
        let email = (current.email != *update.email()).then(|| update.email().clone());
        let changes = UserUpdate {
            name: Some(update.name().to_owned()),
            email,
            password: None,
        };
        let profile = self
            .identity
            .update_user(caller, &changes)
            .await
            .map_err(|error| match error {
                IdentityProviderError::EmailTaken => Error::conflict("email already registered")
                    .with_details(json!({ "field": "email", "code": "email_taken" })),
                other => map_identity_error(other),
            })?;
        info!(user_id = %caller, email_changed = changes.email.is_some(), "profile updated");
        Ok(profile)
    }

    async fn change_password(&self, caller: &UserId, change: &PasswordChange) -> Result<(), Error> {
        let current = self.profile(caller).await?;
        let credentials = LoginCredentials::try_from_parts(current.email.as_ref(), change.current())
            .map_err(|_| incorrect_password())?;
        self.identity
            .sign_in(&credentials)
            .await
            .map_err(|error| match error {
                IdentityProviderError::InvalidCredentials => incorrect_password(),
                other => map_identity_error(other),
            })?;

        let changes = UserUpdate {
            password: Some(Zeroizing::new(change.replacement().to_owned())),
            ..UserUpdate::default()
        };
        self.identity
            .update_user(caller, &changes)
            .await
            .map_err(map_identity_error)?;
        info!(user_id = %caller, "password changed");
        Ok(())
    }

    async fn delete_account(&self, caller: &UserId) -> Result<(), Error> {
        let memberships = self
            .organizations
            .list_memberships_for_user(caller)
            .await
            .map_err(map_organization_error)?;
        let owned: Vec<_> = memberships
            .iter()
            .filter(|entry| entry.membership.role == OrgRole::Owner)
            .map(|entry| entry.organization.id.to_string())
            .collect();
        if !owned.is_empty() {
            return Err(Error::conflict(
                "transfer or delete your organizations before deleting your account",
            )
            .with_details(json!({ "code": "owns_organizations", "organizationIds": owned })));
        }

        let removed = self
            .organizations
            .remove_all_memberships(caller)
            .await
            .map_err(map_organization_error)?;
        self.identity
            .delete_user(caller)
            .await
            .map_err(map_identity_error)?;
        info!(user_id = %caller, memberships = removed, "account deleted");
        Ok(())
    }
}

fn incorrect_password() -> Error {
    Error::invalid_request("current password is incorrect")
        .with_details(json!({ "field": "currentPassword", "code": "incorrect_password" }))
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
