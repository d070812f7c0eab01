//! Invite workflow service.
//!
//! Stored invites are always pending: acceptance, cancellation, and the
//! expiry check at accept time all delete the row.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use super::authorization::map_organization_error;
use super::directory::{label_for, map_identity_error};
use super::ports::{
    IdentityProvider, InviteEmail, InviteMailer, InviteRepository, InviteRepositoryError,
    InvitesCommand, InvitesQuery, OrganizationRepository,
};
use super::{
    Authorizer, Email, Error, Invite, InviteId, InviteRole, InviteToken, InviteView, Membership,
    OrganizationId, Permission, UserDirectory, UserId,
};

fn map_invite_error(error: InviteRepositoryError) -> Error {
    match error {
        InviteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("invite repository unavailable: {message}"))
        }
        InviteRepositoryError::Query { message } => {
            Error::internal(format!("invite repository error: {message}"))
        }
        InviteRepositoryError::DuplicateInvite => invite_pending(),
        InviteRepositoryError::DuplicateMembership => already_member(),
        InviteRepositoryError::Consumed => invite_gone(),
    }
}

fn invite_pending() -> Error {
    Error::conflict("an invite is already pending for this email")
        .with_details(json!({ "field": "email", "code": "invite_pending" }))
}

fn already_member() -> Error {
    Error::conflict("this user is already a member of the organization")
        .with_details(json!({ "field": "email", "code": "already_member" }))
}

fn invite_gone() -> Error {
    Error::not_found("invite not found or no longer valid")
}

/// Settings for building accept links.
#[derive(Debug, Clone)]
pub struct InviteServiceConfig {
    app_base_url: Url,
}

impl InviteServiceConfig {
    /// Links are rendered as `{app_base_url}/invite/{token}`.
    pub fn new(app_base_url: Url) -> Self {
        Self { app_base_url }
    }

    fn accept_link(&self, token: &InviteToken) -> String {
        format!(
            "{}/invite/{}",
            self.app_base_url.as_str().trim_end_matches('/'),
            token.as_str()
        )
    }
}

/// Domain service for invites.
pub struct InviteService<V, O, I, M> {
    invites: Arc<V>,
    organizations: Arc<O>,
    authorizer: Authorizer<O>,
    directory: UserDirectory<I>,
    mailer: Arc<M>,
    clock: Arc<dyn Clock>,
    config: InviteServiceConfig,
}

impl<V, O, I, M> InviteService<V, O, I, M>
where
    V: InviteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
    M: InviteMailer,
{
    /// Create the service.
    pub fn new(
        invites: Arc<V>,
        organizations: Arc<O>,
        identity: Arc<I>,
        mailer: Arc<M>,
        clock: Arc<dyn Clock>,
        config: InviteServiceConfig,
    ) -> Self {
        Self {
            invites,
            authorizer: Authorizer::new(Arc::clone(&organizations)),
            organizations,
            directory: UserDirectory::new(identity),
            mailer,
            clock,
            config,
        }
    }

    async fn ensure_not_member(&self, org_id: &OrganizationId, email: &Email) -> Result<(), Error> {
        let Some(profile) = self
            .directory
            .provider()
            .find_user_by_email(email)
            .await
            .map_err(map_identity_error)?
        else {
            return Ok(());
        };
        let existing = self
            .organizations
            .find_membership(org_id, &profile.id)
            .await
            .map_err(map_organization_error)?;
        match existing {
            Some(_) => Err(already_member()),
            None => Ok(()),
        }
    }

    /// Clear the way for a new invite: an expired one is replaced, a live
    /// one is a conflict.
    async fn ensure_no_pending(&self, org_id: &OrganizationId, email: &Email) -> Result<(), Error> {
        let Some(existing) = self
            .invites
            .find_for_email(org_id, email)
            .await
            .map_err(map_invite_error)?
        else {
            return Ok(());
        };
        if !existing.is_expired(self.clock.utc()) {
            return Err(invite_pending());
        }
        self.invites
            .delete(&existing.id)
            .await
            .map_err(map_invite_error)?;
        Ok(())
    }
}

#[async_trait]
impl<V, O, I, M> InvitesCommand for InviteService<V, O, I, M>
where
    V: InviteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
    M: InviteMailer,
{
    async fn create_invite(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        email: &Email,
        role: InviteRole,
    ) -> Result<Invite, Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::InviteMembers)
            .await?;
        let organization = self
            .organizations
            .find_by_id(org_id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found("organization not found"))?;
        self.ensure_not_member(org_id, email).await?;
        self.ensure_no_pending(org_id, email).await?;

        let token = InviteToken::generate(&mut OsRng);
        let invite = Invite::issue(*org_id, *caller, email.clone(), role, token, self.clock.utc());
        self.invites.insert(&invite).await.map_err(map_invite_error)?;
        info!(%org_id, invite_id = %invite.id, %role, "invite created");

        let message = InviteEmail {
            to: invite.email.clone(),
            organization_name: organization.name,
            accept_link: self.config.accept_link(&invite.token),
        };
        if let Err(error) = self.mailer.send_invite_email(&message).await {
            warn!(%error, invite_id = %invite.id, "invite email not delivered");
        }
        Ok(invite)
    }

    async fn cancel_invite(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        invite_id: &InviteId,
    ) -> Result<(), Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::InviteMembers)
            .await?;
        let removed = self
            .invites
            .delete_in_org(org_id, invite_id)
            .await
            .map_err(map_invite_error)?;
        if removed {
            info!(%org_id, %invite_id, "invite cancelled");
        }
        Ok(())
    }

    async fn accept_invite(&self, caller: &UserId, token: &InviteToken) -> Result<Membership, Error> {
        let invite = self
            .invites
            .find_by_token(token)
            .await
            .map_err(map_invite_error)?
            .ok_or_else(invite_gone)?;

        let now = self.clock.utc();
        if invite.is_expired(now) {
            self.invites.delete(&invite.id).await.map_err(map_invite_error)?;
            return Err(Error::invalid_request("this invite has expired")
                .with_details(json!({ "code": "invite_expired" })));
        }

        let profile = self
            .directory
            .provider()
            .find_user(caller)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        if profile.email != invite.email {
            return Err(Error::forbidden("this invite was sent to a different email address")
                .with_details(json!({ "code": "email_mismatch" })));
        }

        let membership = Membership {
            user_id: *caller,
            org_id: invite.org_id,
            role: invite.role.into(),
            joined_at: now,
        };
        match self.invites.accept(&invite, &membership).await {
            Ok(()) => {
                info!(org_id = %invite.org_id, user_id = %caller, role = %membership.role, "invite accepted");
                Ok(membership)
            }
            Err(InviteRepositoryError::DuplicateMembership) => {
                self.invites.delete(&invite.id).await.map_err(map_invite_error)?;
                Err(already_member())
            }
            Err(other) => Err(map_invite_error(other)),
        }
    }
}

#[async_trait]
impl<V, O, I, M> InvitesQuery for InviteService<V, O, I, M>
where
    V: InviteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
    M: InviteMailer,
{
    async fn list_invites(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<InviteView>, Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::InviteMembers)
            .await?;
        let invites = self
            .invites
            .list_for_org(org_id)
            .await
            .map_err(map_invite_error)?;
        let inviters: Vec<UserId> = invites.iter().map(|invite| invite.inviter_id).collect();
        let profiles = self.directory.profiles(&inviters).await;
        Ok(invites
            .into_iter()
            .map(|invite| InviteView {
                inviter_name: label_for(&profiles, &invite.inviter_id),
                invite,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "invite_service_tests.rs"]
mod tests;
