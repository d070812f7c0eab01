//! Driving ports for the invite workflow.

use async_trait::async_trait;

use crate::domain::{
    Email, Error, Invite, InviteId, InviteRole, InviteToken, InviteView, Membership,
    OrganizationId, UserId,
};

/// Invite lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvitesCommand: Send + Sync {
    /// Invite `email` to `org_id` at `role` and mail the accept link.
    ///
    /// # Errors
    /// `conflict` when the email already belongs to a member or has a
    /// pending invite.
    async fn create_invite(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        email: &Email,
        role: InviteRole,
    ) -> Result<Invite, Error>;

    /// Cancel a pending invite. Cancelling a missing invite succeeds.
    async fn cancel_invite(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        invite_id: &InviteId,
    ) -> Result<(), Error>;

    /// Accept an invite as `caller`.
    ///
    /// # Errors
    /// - `not_found` for unknown (or already used) tokens.
    /// - `invalid_request` when the invite has expired.
    /// - `forbidden` when the caller's email differs from the invite's.
    /// - `conflict` when the caller is already a member.
    async fn accept_invite(&self, caller: &UserId, token: &InviteToken) -> Result<Membership, Error>;
}

/// Invite listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvitesQuery: Send + Sync {
    /// Pending invites of an organization, newest first.
    async fn list_invites(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<InviteView>, Error>;
}
