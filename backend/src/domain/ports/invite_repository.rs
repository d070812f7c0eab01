//! Port for pending invite persistence.

use async_trait::async_trait;

use crate::domain::{Email, Invite, InviteId, InviteToken, Membership, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by invite repository adapters.
    pub enum InviteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "invite repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "invite repository query failed: {message}",
        /// An invite for this email and organization already exists.
        DuplicateInvite =>
            "invite already exists for this email",
        /// Accepting would create a second membership for the user.
        DuplicateMembership =>
            "membership already exists",
        /// The invite was accepted, cancelled, or expired in the meantime.
        Consumed =>
            "invite already consumed",
    }
}

/// Storage for pending invites.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Insert a new invite.
    ///
    /// # Errors
    /// [`InviteRepositoryError::DuplicateInvite`] when `(email, org)` is taken.
    async fn insert(&self, invite: &Invite) -> Result<(), InviteRepositoryError>;

    /// Look up an invite by its token.
    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Invite>, InviteRepositoryError>;

    /// Look up the invite for `email` in `org_id`.
    async fn find_for_email(
        &self,
        org_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invite>, InviteRepositoryError>;

    /// Invites of an organization, newest first.
    async fn list_for_org(&self, org_id: &OrganizationId) -> Result<Vec<Invite>, InviteRepositoryError>;

    /// Delete an invite. Returns `false` if it did not exist.
    async fn delete(&self, id: &InviteId) -> Result<bool, InviteRepositoryError>;

    /// Delete an invite only if it belongs to `org_id`.
    async fn delete_in_org(
        &self,
        org_id: &OrganizationId,
        id: &InviteId,
    ) -> Result<bool, InviteRepositoryError>;

    /// Create `membership` and delete `invite` in one transaction.
    ///
    /// # Errors
    /// [`InviteRepositoryError::DuplicateMembership`] when the user already
    /// belongs to the organization; the invite is left in place.
    /// [`InviteRepositoryError::Consumed`] when the invite row is already
    /// gone, e.g. a concurrent accept won.
    async fn accept(&self, invite: &Invite, membership: &Membership) -> Result<(), InviteRepositoryError>;
}
